use serde::Deserialize;

/// Gameplay tuning for snapping a cap onto a filled cup.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct AttachmentTuning {
    /// Progress rate for the rise and damping rate for the approach.
    pub attach_speed: f32,

    /// How far the cap lifts before approaching the cup.
    pub rise_height: f32,

    /// Distance under which the cap snaps onto the anchor.
    pub snap_epsilon: f32,

    /// Radius of the proximity check around the cap.
    pub overlap_radius: f32,

    /// Rotation of a seated cap, as Euler degrees (pitch, yaw, roll).
    pub seated_rotation: [f32; 3],
}

impl Default for AttachmentTuning {
    fn default() -> Self {
        Self {
            attach_speed: 5.0,
            rise_height: 0.1,
            snap_epsilon: 0.01,
            overlap_radius: 0.05,
            seated_rotation: [-90.0, 0.0, 0.0],
        }
    }
}
