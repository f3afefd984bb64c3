use glam::Vec3;

/// Height above the feet the probe rays start from.
const RAY_RISE: f32 = 0.5;
/// Length of the main grounded ray.
const GROUND_RAY_LENGTH: f32 = 0.6;
/// Length of the four stair-check rays.
const STAIR_RAY_LENGTH: f32 = 1.5;
/// Horizontal offset of the stair-check rays from the player's center.
const STAIR_RAY_OFFSET: f32 = 0.25;

/// Finite ray used for downward floor probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
}

impl Ray {
    pub fn downward(origin: Vec3, length: f32) -> Self {
        Self {
            origin,
            direction: Vec3::NEG_Y,
            length,
        }
    }
}

/// Result of a successful ray intersection. A miss is an expected outcome
/// (the player is airborne), never an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Set at scene-authoring time on surfaces the player may climb
    /// without gravity taking hold.
    pub stair: bool,
}

/// Ray intersection against all collidable-and-enabled geometry, provided
/// by the host engine (or the headless world in tests).
pub trait RayCaster {
    fn cast_ray(&self, ray: &Ray) -> Option<RayHit>;
}

/// Casts the main grounded ray from half a unit above the feet.
pub fn floor_hit(world: &impl RayCaster, position: Vec3) -> Option<RayHit> {
    let origin = position + Vec3::Y * RAY_RISE;
    world.cast_ray(&Ray::downward(origin, GROUND_RAY_LENGTH))
}

/// True when the floor is within [`GROUND_RAY_LENGTH`] of the feet.
pub fn is_grounded(world: &impl RayCaster, position: Vec3) -> bool {
    floor_hit(world, position).is_some()
}

/// Four-ray stair check, offset on each horizontal axis in the fixed order
/// +z, -z, +x, -x. The first ray that hits a non-upward-facing normal
/// decides the outcome: contact counts only if that surface carries the
/// stair tag.
pub fn stair_contact(world: &impl RayCaster, position: Vec3) -> bool {
    let offsets = [
        Vec3::new(0.0, 0.0, STAIR_RAY_OFFSET),
        Vec3::new(0.0, 0.0, -STAIR_RAY_OFFSET),
        Vec3::new(STAIR_RAY_OFFSET, 0.0, 0.0),
        Vec3::new(-STAIR_RAY_OFFSET, 0.0, 0.0),
    ];
    for offset in offsets {
        let origin = position + offset + Vec3::Y * RAY_RISE;
        let ray = Ray::downward(origin, STAIR_RAY_LENGTH);
        if let Some(hit) = world.cast_ray(&ray) {
            if hit.normal != Vec3::Y {
                return hit.stair;
            }
        }
    }
    false
}
