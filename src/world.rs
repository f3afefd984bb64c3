use glam::Vec3;

use crate::player::CollisionWorld;
use crate::probe::{Ray, RayCaster, RayHit};
use crate::stage::{Stage, Surface};

/// Headless stand-in for the host engine's collision queries, built from
/// the stage manifest's axis-aligned slabs. Probe rays only ever point
/// straight down, so the implementation resolves vertical intersections
/// against slab tops; it is not a general collision solver and does not
/// try to be.
#[derive(Debug, Default)]
pub struct StaticWorld {
    surfaces: Vec<Surface>,
}

impl StaticWorld {
    pub fn from_stage(stage: &Stage) -> Self {
        Self {
            surfaces: stage.surfaces.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        Self { surfaces }
    }

    fn covers(surface: &Surface, x: f32, z: f32) -> bool {
        x >= surface.min.x && x <= surface.max.x && z >= surface.min.z && z <= surface.max.z
    }

    /// Highest slab top at (x, z) that lies at or below `height`, filtered
    /// by the given eligibility rule.
    fn top_below<F>(&self, x: f32, z: f32, height: f32, eligible: F) -> Option<(&Surface, f32)>
    where
        F: Fn(&Surface) -> bool,
    {
        self.surfaces
            .iter()
            .filter(|surface| eligible(surface) && Self::covers(surface, x, z))
            .map(|surface| (surface, surface.max.y))
            .filter(|(_, top)| *top <= height)
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl RayCaster for StaticWorld {
    fn cast_ray(&self, ray: &Ray) -> Option<RayHit> {
        // Downward probes only; anything else misses.
        if ray.direction.y >= 0.0 {
            return None;
        }
        let (surface, top) = self.top_below(ray.origin.x, ray.origin.z, ray.origin.y, |s| {
            s.kind.pickable()
        })?;
        if ray.origin.y - top > ray.length {
            return None;
        }
        Some(RayHit {
            point: Vec3::new(ray.origin.x, top, ray.origin.z),
            normal: surface.normal,
            stair: surface.stair,
        })
    }
}

impl CollisionWorld for StaticWorld {
    fn move_with_collisions(&self, position: Vec3, displacement: Vec3) -> Vec3 {
        let mut next = position + displacement;
        if displacement.y < 0.0 {
            // Landing: stop at the first collidable top crossed on the way
            // down.
            if let Some((_, top)) =
                self.top_below(next.x, next.z, position.y, |s| s.kind.collidable())
            {
                if next.y < top {
                    next.y = top;
                }
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::SurfaceKind;

    fn slab(name: &str, min: Vec3, max: Vec3, kind: SurfaceKind) -> Surface {
        Surface {
            name: name.to_string(),
            kind,
            min,
            max,
            normal: Vec3::Y,
            stair: false,
        }
    }

    fn ground_world() -> StaticWorld {
        StaticWorld::from_surfaces(vec![slab(
            "floor",
            Vec3::new(-10.0, -1.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            SurfaceKind::Collision,
        )])
    }

    #[test]
    fn downward_ray_hits_the_slab_top() {
        let world = ground_world();
        let hit = world
            .cast_ray(&Ray::downward(Vec3::new(1.0, 0.5, 1.0), 0.6))
            .unwrap();
        assert_eq!(hit.point, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn ray_misses_beyond_its_length() {
        let world = ground_world();
        assert!(world
            .cast_ray(&Ray::downward(Vec3::new(0.0, 2.0, 0.0), 0.6))
            .is_none());
    }

    #[test]
    fn ray_misses_outside_the_footprint() {
        let world = ground_world();
        assert!(world
            .cast_ray(&Ray::downward(Vec3::new(50.0, 0.5, 0.0), 0.6))
            .is_none());
    }

    #[test]
    fn unpickable_kinds_are_invisible_to_rays() {
        let world = StaticWorld::from_surfaces(vec![slab(
            "soft ground",
            Vec3::new(-10.0, -1.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            SurfaceKind::Ground,
        )]);
        assert!(world
            .cast_ray(&Ray::downward(Vec3::new(0.0, 0.5, 0.0), 0.6))
            .is_none());
    }

    #[test]
    fn highest_covering_slab_wins() {
        let world = StaticWorld::from_surfaces(vec![
            slab(
                "floor",
                Vec3::new(-10.0, -1.0, -10.0),
                Vec3::new(10.0, 0.0, 10.0),
                SurfaceKind::Collision,
            ),
            slab(
                "platform",
                Vec3::new(-1.0, 1.0, -1.0),
                Vec3::new(1.0, 2.0, 1.0),
                SurfaceKind::Collision,
            ),
        ]);
        let hit = world
            .cast_ray(&Ray::downward(Vec3::new(0.0, 2.4, 0.0), 0.6))
            .unwrap();
        assert_eq!(hit.point.y, 2.0);
    }

    #[test]
    fn falling_displacement_lands_on_the_top() {
        let world = ground_world();
        let next = world.move_with_collisions(Vec3::new(0.0, 0.4, 0.0), Vec3::new(0.1, -0.8, 0.0));
        assert_eq!(next, Vec3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn rising_displacement_is_unobstructed() {
        let world = ground_world();
        let next = world.move_with_collisions(Vec3::ZERO, Vec3::new(0.0, 0.8, 0.0));
        assert_eq!(next.y, 0.8);
    }

    #[test]
    fn trigger_volumes_do_not_block_movement() {
        let world = StaticWorld::from_surfaces(vec![slab(
            "gate trigger",
            Vec3::new(-10.0, -1.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            SurfaceKind::Trigger,
        )]);
        let next = world.move_with_collisions(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(next.y, -1.5);
    }
}
