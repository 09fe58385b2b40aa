//! Gesture tracker adapter
//!
//! Receives face landmarks (MediaPipe Face Mesh layout, coordinates normalized
//! to the video frame) and derives the mouth position and open/closed state.
//!
//! The lip gap can be normalized two ways, which are not interchangeable:
//! - `FaceHeight`: gap divided by the face bounding-box height (default 0.06)
//! - `FrameHeight`: gap in raw normalized frame units (default 0.045)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{MouthState, Viewport};

// ============================================================================
// LANDMARK INDICES (MediaPipe Face Mesh)
// ============================================================================

pub const UPPER_LIP: usize = 13;
pub const LOWER_LIP: usize = 14;
pub const MOUTH_LEFT: usize = 61;
pub const MOUTH_RIGHT: usize = 291;

/// Fewest landmarks that cover every index above
pub const MIN_LANDMARKS: usize = MOUTH_RIGHT + 1;

/// A single landmark (normalized coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    pub z: f32, // Relative depth
}

impl Landmark {
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// One detected face
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Landmark>) -> Option<Self> {
        if points.len() < MIN_LANDMARKS {
            return None;
        }
        Some(Self { points })
    }

    /// Parse a flat `[x, y, z, x, y, z, ...]` buffer
    pub fn from_flat(data: &[f32]) -> Option<Self> {
        if data.len() % 3 != 0 {
            return None;
        }
        let points = data
            .chunks_exact(3)
            .map(|c| Landmark { x: c[0], y: c[1], z: c[2] })
            .collect();
        Self::new(points)
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Height of the bounding box around every landmark
    pub fn face_height(&self) -> f32 {
        let (min, max) = self
            .points
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        (max - min).max(0.0)
    }

    /// Mouth center: midpoint of the lips, averaged with the corners
    pub fn mouth_center(&self) -> Vec2 {
        let lips = (self.get(UPPER_LIP).xy() + self.get(LOWER_LIP).xy()) * 0.5;
        let corners = (self.get(MOUTH_LEFT).xy() + self.get(MOUTH_RIGHT).xy()) * 0.5;
        (lips + corners) * 0.5
    }

    /// Vertical distance between the inner lips, in normalized frame units
    pub fn raw_lip_gap(&self) -> f32 {
        self.get(LOWER_LIP).xy().distance(self.get(UPPER_LIP).xy())
    }
}

/// How the lip gap is normalized before the threshold comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationBasis {
    /// Relative to face bounding-box height (distance-to-camera invariant)
    #[default]
    FaceHeight,
    /// Relative to the frame (more sensitive when close to the camera)
    FrameHeight,
}

/// Normalized lip gap under a basis; `None` for a degenerate face box
pub fn lip_openness(face: &FaceLandmarks, basis: NormalizationBasis) -> Option<f32> {
    let gap = face.raw_lip_gap();
    match basis {
        NormalizationBasis::FrameHeight => Some(gap),
        NormalizationBasis::FaceHeight => {
            let height = face.face_height();
            if height <= f32::EPSILON {
                None
            } else {
                Some(gap / height)
            }
        }
    }
}

/// Tracker settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub open_threshold: f32,
    pub basis: NormalizationBasis,
    /// Flip x so the screen behaves like a mirror
    pub mirror: bool,
}

/// Holds the latest mouth state; written only by the detector tick
#[derive(Debug, Clone)]
pub struct MouthTracker {
    config: TrackerConfig,
    latest: MouthState,
}

impl MouthTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            latest: MouthState::default(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Latest mouth state (may be older than the current render frame)
    pub fn latest(&self) -> MouthState {
        self.latest
    }

    /// Fold one detection result into the mouth state. With no face the mouth
    /// counts as closed and keeps its last position.
    pub fn update(&mut self, face: Option<&FaceLandmarks>, viewport: Viewport) -> MouthState {
        let Some(face) = face else {
            self.latest.open = false;
            self.latest.openness = 0.0;
            self.latest.detected = false;
            return self.latest;
        };

        let center = face.mouth_center();
        let x = if self.config.mirror { 1.0 - center.x } else { center.x };
        let pos = Vec2::new(x * viewport.width, center.y * viewport.height);

        let openness = lip_openness(face, self.config.basis).unwrap_or(0.0);
        self.latest = MouthState {
            pos,
            open: openness > self.config.open_threshold,
            openness,
            detected: true,
        };
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Synthetic face: box from y=0.2 to y=0.8, mouth around (0.4, 0.6)
    fn face(lip_gap: f32) -> FaceLandmarks {
        let mut points = vec![Landmark { x: 0.4, y: 0.5, z: 0.0 }; 468];
        points[0].y = 0.2;
        points[1].y = 0.8;
        points[UPPER_LIP] = Landmark { x: 0.4, y: 0.6 - lip_gap / 2.0, z: 0.0 };
        points[LOWER_LIP] = Landmark { x: 0.4, y: 0.6 + lip_gap / 2.0, z: 0.0 };
        points[MOUTH_LEFT] = Landmark { x: 0.35, y: 0.6, z: 0.0 };
        points[MOUTH_RIGHT] = Landmark { x: 0.45, y: 0.6, z: 0.0 };
        FaceLandmarks::new(points).unwrap()
    }

    fn config(basis: NormalizationBasis, threshold: f32, mirror: bool) -> TrackerConfig {
        TrackerConfig {
            open_threshold: threshold,
            basis,
            mirror,
        }
    }

    const VIEW: Viewport = Viewport {
        width: 1000.0,
        height: 500.0,
    };

    #[test]
    fn test_from_flat_requires_enough_points() {
        assert!(FaceLandmarks::from_flat(&[0.0; 3 * 100]).is_none());
        assert!(FaceLandmarks::from_flat(&[0.0; 3 * 468 + 1]).is_none());
        assert_eq!(FaceLandmarks::from_flat(&[0.5; 3 * 478]).unwrap().len(), 478);
    }

    #[test]
    fn test_bases_differ() {
        // Gap 0.04 in a face 0.6 tall: 0.0667 face-relative, 0.04 frame-relative
        let f = face(0.04);
        let by_face = lip_openness(&f, NormalizationBasis::FaceHeight).unwrap();
        let by_frame = lip_openness(&f, NormalizationBasis::FrameHeight).unwrap();
        assert!((by_face - 0.04 / 0.6).abs() < 1e-5);
        assert!((by_frame - 0.04).abs() < 1e-5);

        let mut t = MouthTracker::new(config(NormalizationBasis::FaceHeight, 0.06, false));
        assert!(t.update(Some(&f), VIEW).open);
        let mut t = MouthTracker::new(config(NormalizationBasis::FrameHeight, 0.045, false));
        assert!(!t.update(Some(&f), VIEW).open);
    }

    #[test]
    fn test_position_and_mirror() {
        let f = face(0.0);
        let mut t = MouthTracker::new(config(NormalizationBasis::FaceHeight, 0.06, false));
        let m = t.update(Some(&f), VIEW);
        assert!((m.pos.x - 400.0).abs() < 1e-3);
        assert!((m.pos.y - 300.0).abs() < 1e-3);
        assert!(!m.open);

        let mut t = MouthTracker::new(config(NormalizationBasis::FaceHeight, 0.06, true));
        let m = t.update(Some(&f), VIEW);
        assert!((m.pos.x - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_no_face_closes_and_keeps_position() {
        let mut t = MouthTracker::new(config(NormalizationBasis::FrameHeight, 0.045, false));
        let open = t.update(Some(&face(0.1)), VIEW);
        assert!(open.open);

        let lost = t.update(None, VIEW);
        assert!(!lost.open);
        assert!(!lost.detected);
        assert_eq!(lost.pos, open.pos);
    }
}
