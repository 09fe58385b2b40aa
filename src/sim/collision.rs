//! Mouth-treat collision detection
//!
//! A catch needs an open mouth and a treat strictly inside the capture radius.
//! Entity counts stay in the low tens, so a full scan per frame is enough.

use super::state::{MouthState, Point, Treat};

/// Is `treat` strictly closer than `radius` to `mouth`
#[inline]
pub fn within_capture(mouth: Point, treat: Point, radius: f32) -> bool {
    mouth.distance_squared(treat) < radius * radius
}

/// Open-gated capture test
#[inline]
pub fn mouth_catches(mouth: &MouthState, treat_pos: Point, radius: f32) -> bool {
    mouth.open && within_capture(mouth.pos, treat_pos, radius)
}

/// Ids of every active treat the mouth catches this frame, in store order
pub fn find_catches(mouth: &MouthState, treats: &[Treat], radius: f32) -> Vec<u32> {
    if !mouth.open {
        return Vec::new();
    }
    treats
        .iter()
        .filter(|t| t.active && within_capture(mouth.pos, t.pos, radius))
        .map(|t| t.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Payload, TreatKind};
    use glam::Vec2;

    fn treat_at(id: u32, x: f32, y: f32) -> Treat {
        Treat {
            id,
            pos: Vec2::new(x, y),
            kind: TreatKind::Donut,
            payload: Payload::Points(25),
            active: true,
            velocity: 2.0,
        }
    }

    #[test]
    fn test_closed_mouth_never_catches() {
        let mouth = MouthState::closed_at(Vec2::new(300.0, 300.0));
        assert!(!mouth_catches(&mouth, Vec2::new(310.0, 300.0), 70.0));
        assert!(find_catches(&mouth, &[treat_at(1, 310.0, 300.0)], 70.0).is_empty());
    }

    #[test]
    fn test_capture_boundary_is_exclusive() {
        let mouth = MouthState::open_at(Vec2::new(300.0, 300.0));
        assert!(mouth_catches(&mouth, Vec2::new(369.0, 300.0), 70.0));
        assert!(!mouth_catches(&mouth, Vec2::new(370.0, 300.0), 70.0));
        assert!(!mouth_catches(&mouth, Vec2::new(371.0, 300.0), 70.0));
    }

    #[test]
    fn test_diagonal_distance() {
        let mouth = MouthState::open_at(Vec2::ZERO);
        // 3-4-5 triangle scaled to 50
        assert!(mouth_catches(&mouth, Vec2::new(30.0, 40.0), 60.0));
        assert!(!mouth_catches(&mouth, Vec2::new(30.0, 40.0), 50.0));
    }

    #[test]
    fn test_find_catches_skips_inactive() {
        let mouth = MouthState::open_at(Vec2::new(100.0, 100.0));
        let mut gone = treat_at(2, 100.0, 100.0);
        gone.active = false;
        let treats = [treat_at(1, 120.0, 100.0), gone, treat_at(3, 500.0, 100.0)];
        assert_eq!(find_catches(&mouth, &treats, 60.0), vec![1]);
    }
}
