use glam::{Quat, Vec3};
use log::trace;

use crate::input::SampledInput;
use crate::probe::{self, RayCaster};

/// Horizontal movement applied per tick at full input.
pub const PLAYER_SPEED: f32 = 0.45;
/// Vertical velocity granted by a jump, and the terminal fall speed.
pub const JUMP_FORCE: f32 = 0.80;
/// Gravity acceleration, scaled by delta time each airborne tick.
pub const GRAVITY: f32 = -2.8;
/// Dash duration in ticks.
pub const DASH_TIME: u32 = 10;
/// Movement multiplier while a dash is active.
pub const DASH_FACTOR: f32 = 2.5;
/// Orientation slerp rate, scaled by delta time.
const ROTATION_RATE: f32 = 10.0;

/// Collision-aware displacement, resolved by the host engine. The headless
/// [`StaticWorld`](crate::world::StaticWorld) implements just enough of it
/// to land the player on slab tops.
pub trait CollisionWorld: RayCaster {
    /// Applies a displacement and returns the post-collision position.
    fn move_with_collisions(&self, position: Vec3, displacement: Vec3) -> Vec3;
}

/// How jump input is consumed.
///
/// The default consumes one charge per key press. `WhileHeld` retriggers a
/// jump on every tick the key is held while a charge remains, the legacy
/// feel some players prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpRule {
    #[default]
    PerPress,
    WhileHeld,
}

/// Mutable movement state, written only by [`Player::update`] once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity_y: f32,
    pub grounded: bool,
    pub jump_charges: u8,
    pub dash_ready: bool,
    pub dash_active: bool,
    pub dash_elapsed: u32,
    pub last_grounded_position: Vec3,
}

impl MotionState {
    fn at(spawn: Vec3) -> Self {
        Self {
            position: spawn,
            orientation: Quat::IDENTITY,
            velocity_y: 0.0,
            grounded: false,
            jump_charges: 1,
            dash_ready: true,
            dash_active: false,
            dash_elapsed: 0,
            last_grounded_position: spawn,
        }
    }
}

/// The player entity: a transform value plus motion state, composed rather
/// than inherited from any scene-graph node type.
#[derive(Debug)]
pub struct Player {
    pub motion: MotionState,
    jump_rule: JumpRule,
}

impl Player {
    pub fn new(spawn: Vec3) -> Self {
        Self {
            motion: MotionState::at(spawn),
            jump_rule: JumpRule::default(),
        }
    }

    pub fn with_jump_rule(spawn: Vec3, jump_rule: JumpRule) -> Self {
        Self {
            motion: MotionState::at(spawn),
            jump_rule,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.motion.position
    }

    /// Integrates one tick of movement. `camera_yaw` orients the input axes
    /// onto the horizontal plane; the world resolves ray probes and the
    /// final collision-aware displacement.
    pub fn update(
        &mut self,
        delta_time: f32,
        input: &SampledInput,
        camera_yaw: f32,
        world: &impl CollisionWorld,
    ) {
        let dash_factor = self.advance_dash(input);
        let move_direction = self.move_direction(input, camera_yaw, dash_factor);
        self.rotate_toward_input(delta_time, input, camera_yaw);
        self.resolve_gravity_and_move(delta_time, input, move_direction, world);
    }

    /// Starts or advances the dash and returns this tick's speed factor.
    /// A dash begins only while airborne, ends after [`DASH_TIME`] ticks,
    /// and is not restored until the next confirmed ground contact.
    fn advance_dash(&mut self, input: &SampledInput) -> f32 {
        let motion = &mut self.motion;
        if input.dash_requested && !motion.dash_active && motion.dash_ready && !motion.grounded {
            motion.dash_ready = false;
            motion.dash_active = true;
            motion.dash_elapsed = 0;
        }

        if !motion.dash_active {
            return 1.0;
        }
        if motion.dash_elapsed >= DASH_TIME {
            motion.dash_active = false;
            motion.dash_elapsed = 0;
            return 1.0;
        }
        motion.dash_elapsed += 1;
        DASH_FACTOR
    }

    fn move_direction(&self, input: &SampledInput, camera_yaw: f32, dash_factor: f32) -> Vec3 {
        let forward = Vec3::new(camera_yaw.sin(), 0.0, camera_yaw.cos());
        let right = Vec3::new(camera_yaw.cos(), 0.0, -camera_yaw.sin());
        let combined = right * input.horizontal + forward * input.vertical;
        let direction = combined.normalize_or_zero() * dash_factor;

        let input_amount = (input.horizontal.abs() + input.vertical.abs()).clamp(0.0, 1.0);
        Vec3::new(direction.x, 0.0, direction.z) * input_amount * PLAYER_SPEED
    }

    /// Slerps toward the facing implied by the raw input axes. No input
    /// leaves the orientation untouched; there is no default facing.
    fn rotate_toward_input(&mut self, delta_time: f32, input: &SampledInput, camera_yaw: f32) {
        if input.horizontal_axis == 0 && input.vertical_axis == 0 {
            return;
        }
        let angle = (input.horizontal_axis as f32).atan2(input.vertical_axis as f32) + camera_yaw;
        let target = Quat::from_rotation_y(angle);
        let t = (ROTATION_RATE * delta_time).min(1.0);
        self.motion.orientation = self.motion.orientation.slerp(target, t);
    }

    fn resolve_gravity_and_move(
        &mut self,
        delta_time: f32,
        input: &SampledInput,
        move_direction: Vec3,
        world: &impl CollisionWorld,
    ) {
        let motion = &mut self.motion;

        if !probe::is_grounded(world, motion.position) {
            if probe::stair_contact(world, motion.position) && motion.velocity_y <= 0.0 {
                // Stair stick: tagged stair surfaces count as ground and
                // suppress gravity entirely.
                motion.velocity_y = 0.0;
                motion.jump_charges = 1;
                motion.grounded = true;
            } else {
                motion.velocity_y += delta_time * GRAVITY;
                motion.grounded = false;
            }
        }

        // Fall speed is capped at the jump force magnitude.
        motion.velocity_y = motion.velocity_y.clamp(-JUMP_FORCE, JUMP_FORCE);

        let displacement = move_direction + Vec3::Y * motion.velocity_y;
        motion.position = world.move_with_collisions(motion.position, displacement);

        if probe::is_grounded(world, motion.position) {
            motion.velocity_y = 0.0;
            motion.grounded = true;
            motion.last_grounded_position = motion.position;
            motion.jump_charges = 1;
            // Landing also restores the dash and clears any dash cut short
            // by the ground.
            motion.dash_ready = true;
            motion.dash_active = false;
            motion.dash_elapsed = 0;
        }

        let jump_wanted = match self.jump_rule {
            JumpRule::PerPress => input.jump_pressed,
            JumpRule::WhileHeld => input.jump_requested,
        };
        if jump_wanted && motion.jump_charges > 0 {
            motion.velocity_y = JUMP_FORCE;
            motion.jump_charges -= 1;
            trace!("jump consumed, velocity_y={}", motion.velocity_y);
        }
    }
}
