use glam::Vec3;

/// Lerp factor for the chase anchor each tick.
const FOLLOW_RATE: f32 = 0.4;
/// Height above the player's feet the anchor aims for.
const ANCHOR_HEIGHT: f32 = 2.0;
/// Fixed downward tilt of the camera boom, in radians.
pub const CAMERA_TILT: f32 = 0.593_411_95;
/// Fixed vertical field of view, in radians.
pub const CAMERA_FOV: f32 = 0.473_500_46;

/// Chase camera that trails the player with a positional lerp. Tilt and
/// field of view are set once at activation and never change; yaw is the
/// reference frame the movement integrator projects input onto.
#[derive(Debug, Clone, Copy)]
pub struct FollowCamera {
    anchor: Vec3,
    yaw: f32,
    tilt: f32,
    fov: f32,
}

impl FollowCamera {
    pub fn new(anchor: Vec3) -> Self {
        Self {
            anchor,
            yaw: 0.0,
            tilt: CAMERA_TILT,
            fov: CAMERA_FOV,
        }
    }

    /// Moves the anchor a fixed fraction of the way toward the player.
    /// Never snaps, so sudden player movement produces trailing motion.
    pub fn follow(&mut self, player_position: Vec3) {
        let target = Vec3::new(
            player_position.x,
            player_position.y + ANCHOR_HEIGHT,
            player_position.z,
        );
        self.anchor = self.anchor.lerp(target, FOLLOW_RATE);
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }
}
