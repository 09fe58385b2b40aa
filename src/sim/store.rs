//! Entity store for treats and particles
//!
//! Owns the authoritative collections. Treats are kept in spawn order, which
//! is also ascending id order since ids are never reused.

use glam::Vec2;
use rand::Rng;

use super::state::{Color, Particle, Payload, Point, Treat, TreatKind};
use crate::consts::*;

/// Treats and particles for one session
#[derive(Debug, Clone)]
pub struct EntityStore {
    treats: Vec<Treat>,
    particles: Vec<Particle>,
    next_id: u32,
    max_particles: usize,
}

impl EntityStore {
    pub fn new(max_particles: usize) -> Self {
        Self {
            treats: Vec::new(),
            particles: Vec::new(),
            next_id: 1,
            max_particles,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert a new active treat and return it
    pub fn spawn_treat(&mut self, kind: TreatKind, payload: Payload, pos: Point, velocity: f32) -> &Treat {
        let id = self.next_entity_id();
        self.treats.push(Treat {
            id,
            pos,
            kind,
            payload,
            active: true,
            velocity,
        });
        &self.treats[self.treats.len() - 1]
    }

    /// Move every active treat down by its velocity (scaled), then evict the
    /// ones below `miss_line`. Returns the evicted treats.
    pub fn advance_and_prune(&mut self, scale: f32, miss_line: f32) -> Vec<Treat> {
        for treat in self.treats.iter_mut().filter(|t| t.active) {
            treat.pos.y += treat.velocity * scale;
            if treat.pos.y > miss_line {
                treat.active = false;
            }
        }

        let mut missed = Vec::new();
        self.treats.retain(|t| {
            if t.active {
                true
            } else {
                missed.push(t.clone());
                false
            }
        });
        missed
    }

    /// Deactivate and remove a treat. A second call for the same id is a no-op.
    pub fn consume(&mut self, id: u32) -> Option<Treat> {
        let idx = self.treats.iter().position(|t| t.id == id && t.active)?;
        let mut treat = self.treats.remove(idx);
        treat.active = false;
        Some(treat)
    }

    /// Remove every treat in flight, returning how many were dropped
    pub fn clear_treats(&mut self) -> usize {
        let count = self.treats.len();
        self.treats.clear();
        count
    }

    /// Spawn `count` particles flying out from `at`
    pub fn spawn_burst(&mut self, at: Point, color: Color, count: usize, rng: &mut impl Rng) {
        if self.max_particles == 0 {
            return;
        }
        for _ in 0..count {
            if self.particles.len() >= self.max_particles {
                // Remove oldest particles to make room
                self.particles.remove(0);
            }
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng.random_range(PARTICLE_SPEED_MIN..PARTICLE_SPEED_MAX);
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                color,
                size: rng.random_range(PARTICLE_SIZE_MIN..PARTICLE_SIZE_MAX),
            });
        }
    }

    /// Integrate particles and drop the ones whose life ran out
    pub fn advance_particles(&mut self, scale: f32, decay: f32) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * scale;
            particle.vel.y += PARTICLE_GRAVITY * scale;
            particle.life -= decay * scale;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn treats(&self) -> &[Treat] {
        &self.treats
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn get(&self, id: u32) -> Option<&Treat> {
        self.treats.iter().find(|t| t.id == id)
    }

    /// Number of treats currently in flight
    pub fn active_treats(&self) -> usize {
        self.treats.iter().filter(|t| t.active).count()
    }

    /// Next id that will be handed out
    pub fn peek_next_id(&self) -> u32 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    fn cupcake(store: &mut EntityStore, x: f32, y: f32, v: f32) -> u32 {
        store
            .spawn_treat(TreatKind::Cupcake, Payload::Points(10), Vec2::new(x, y), v)
            .id
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = EntityStore::new(64);
        let ids: HashSet<u32> = (0..100).map(|i| cupcake(&mut store, i as f32, 0.0, 1.0)).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_advance_moves_by_velocity() {
        let mut store = EntityStore::new(64);
        let id = cupcake(&mut store, 100.0, -50.0, 3.0);
        store.advance_and_prune(1.0, 800.0);
        assert_eq!(store.get(id).unwrap().pos.y, -47.0);
        store.advance_and_prune(2.0, 800.0);
        assert_eq!(store.get(id).unwrap().pos.y, -41.0);
    }

    #[test]
    fn test_prune_past_miss_line() {
        let mut store = EntityStore::new(64);
        let gone = cupcake(&mut store, 0.0, 769.0, 2.0);
        let stays = cupcake(&mut store, 0.0, 768.0, 2.0);

        // 771 > 770 is evicted; 770 is not past the line
        let missed = store.advance_and_prune(1.0, 770.0);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, gone);
        assert!(!missed[0].active);
        assert!(store.get(stays).is_some());
    }

    #[test]
    fn test_consume_is_idempotent() {
        let mut store = EntityStore::new(64);
        let id = cupcake(&mut store, 0.0, 0.0, 1.0);
        let eaten = store.consume(id).expect("first consume succeeds");
        assert!(!eaten.active);
        assert!(store.consume(id).is_none());
        assert!(store.treats().is_empty());
    }

    #[test]
    fn test_consume_after_prune_is_noop() {
        let mut store = EntityStore::new(64);
        let id = cupcake(&mut store, 0.0, 1000.0, 1.0);
        store.advance_and_prune(1.0, 770.0);
        assert!(store.consume(id).is_none());
    }

    #[test]
    fn test_burst_respects_cap_and_decays() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut store = EntityStore::new(10);
        store.spawn_burst(Vec2::new(10.0, 10.0), Color::WHITE, 25, &mut rng);
        assert_eq!(store.particles().len(), 10);

        // 0.02 decay per frame: gone after 50 frames
        for _ in 0..49 {
            store.advance_particles(1.0, 0.02);
        }
        assert!(!store.particles().is_empty());
        store.advance_particles(1.0, 0.02);
        store.advance_particles(1.0, 0.02);
        assert!(store.particles().is_empty());
    }

    #[test]
    fn test_burst_over_cap_drops_oldest() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut store = EntityStore::new(10);
        let red = Color::rgb(1.0, 0.0, 0.0);
        store.spawn_burst(Vec2::new(10.0, 10.0), Color::WHITE, 6, &mut rng);
        store.advance_particles(1.0, 0.1);
        store.spawn_burst(Vec2::new(50.0, 50.0), red, 8, &mut rng);

        let colors: Vec<Color> = store.particles().iter().map(|p| p.color).collect();
        assert_eq!(colors.len(), 10);
        assert!(colors[..2].iter().all(|c| *c == Color::WHITE));
        assert!(colors[2..].iter().all(|c| *c == red));
        // The first burst has aged one frame
        assert!(store.particles()[..2].iter().all(|p| p.life < 1.0));
        assert!(store.particles()[2..].iter().all(|p| p.life == 1.0));
    }

    #[test]
    fn test_burst_disabled_when_cap_zero() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut store = EntityStore::new(0);
        store.spawn_burst(Vec2::ZERO, Color::WHITE, 15, &mut rng);
        assert!(store.particles().is_empty());
    }

    #[test]
    fn test_clear_treats() {
        let mut store = EntityStore::new(0);
        for i in 0..5 {
            cupcake(&mut store, i as f32, 0.0, 1.0);
        }
        assert_eq!(store.clear_treats(), 5);
        assert_eq!(store.active_treats(), 0);
    }
}
