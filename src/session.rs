use glam::Vec3;
use log::info;

use crate::camera::FollowCamera;
use crate::input::{InputState, SampledInput};
use crate::lantern::{LanternField, Spark};
use crate::player::{CollisionWorld, JumpRule, Player};
use crate::stage::Stage;

/// Outcome of one gameplay tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Running,
    /// The spark burned out; the state machine should present LOSE.
    SparkBurnedOut,
}

/// One run of the gameplay scene: the player, its chase camera, the
/// lantern field and the spark timer, advanced in a fixed order each
/// render tick (input, movement, camera, interactions).
#[derive(Debug)]
pub struct GameSession<W: CollisionWorld> {
    world: W,
    sampled: SampledInput,
    player: Player,
    camera: FollowCamera,
    lanterns: LanternField,
    spark: Spark,
}

impl<W: CollisionWorld> GameSession<W> {
    pub fn new(stage: &Stage, world: W) -> Self {
        Self::with_jump_rule(stage, world, JumpRule::default())
    }

    pub fn with_jump_rule(stage: &Stage, world: W, jump_rule: JumpRule) -> Self {
        let mut lanterns = LanternField::from_holders(&stage.lantern_holders);
        lanterns.light_first();
        info!(
            "game session started: {} lanterns, spark lifetime {} ticks",
            lanterns.len(),
            stage.spark_ticks
        );
        Self {
            world,
            sampled: SampledInput::default(),
            player: Player::with_jump_rule(stage.spawn, jump_rule),
            camera: FollowCamera::new(stage.spawn),
            lanterns,
            spark: Spark::new(stage.spark_ticks),
        }
    }

    /// Advances one tick. Ordering is fixed: sample input, integrate
    /// movement, follow with the camera, then evaluate lantern overlaps
    /// against the post-move position.
    pub fn tick(&mut self, delta_time: f32, input: &InputState) -> SessionEvent {
        self.sampled.sample(input);
        self.player
            .update(delta_time, &self.sampled, self.camera.yaw(), &self.world);
        self.camera.follow(self.player.position());
        self.lanterns.update(self.player.position(), &mut self.spark);
        if self.spark.tick() {
            info!("spark burned out after {} lanterns", self.lanterns.lit_count());
            return SessionEvent::SparkBurnedOut;
        }
        SessionEvent::Running
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &FollowCamera {
        &self.camera
    }

    pub fn lanterns_lit(&self) -> u32 {
        self.lanterns.lit_count()
    }

    pub fn lantern_count(&self) -> usize {
        self.lanterns.len()
    }

    pub fn spark(&self) -> &Spark {
        &self.spark
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Command;
    use crate::stage::{Stage, Surface, SurfaceKind};
    use crate::world::StaticWorld;

    const DT: f32 = 1.0 / 60.0;

    fn courtyard() -> Stage {
        Stage {
            surfaces: vec![Surface {
                name: "courtyard".to_string(),
                kind: SurfaceKind::Collision,
                min: Vec3::new(-50.0, -1.0, -50.0),
                max: Vec3::new(50.0, 0.0, 50.0),
                normal: Vec3::Y,
                stair: false,
            }],
            lantern_holders: vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0)],
            models: Vec::new(),
            spawn: Vec3::new(0.0, 0.1, 0.0),
            spark_ticks: 240,
            binding_overrides: Vec::new(),
        }
    }

    fn session(stage: &Stage) -> GameSession<StaticWorld> {
        GameSession::new(stage, StaticWorld::from_stage(stage))
    }

    #[test]
    fn session_starts_with_the_first_lantern_lit() {
        let stage = courtyard();
        let session = session(&stage);
        assert_eq!(session.lanterns_lit(), 1);
        assert_eq!(session.lantern_count(), 2);
        assert!(session.spark().is_lit());
    }

    #[test]
    fn walking_into_a_lantern_lights_it() {
        let stage = courtyard();
        let mut game = session(&stage);
        let input = InputState::default();
        input.press(Command::Forward);
        for _ in 0..120 {
            if game.tick(DT, &input) == SessionEvent::SparkBurnedOut {
                panic!("spark must outlive the walk");
            }
            if game.lanterns_lit() == 2 {
                return;
            }
        }
        panic!(
            "never reached the second lantern, player at {:?}",
            game.player().position()
        );
    }

    #[test]
    fn camera_trails_the_moving_player() {
        let stage = courtyard();
        let mut game = session(&stage);
        let input = InputState::default();
        input.press(Command::Forward);
        for _ in 0..30 {
            game.tick(DT, &input);
        }
        let player_z = game.player().position().z;
        let camera_z = game.camera().anchor().z;
        assert!(player_z > 0.5);
        assert!(camera_z < player_z, "camera must lag the player");
    }

    #[test]
    fn idle_session_burns_out_and_reports_once() {
        let mut stage = courtyard();
        // Stand away from every lantern so nothing refreshes the spark.
        stage.spawn = Vec3::new(20.0, 0.1, 20.0);
        stage.spark_ticks = 50;
        let mut game = session(&stage);
        let input = InputState::default();

        let mut burnouts = 0;
        for _ in 0..200 {
            if game.tick(DT, &input) == SessionEvent::SparkBurnedOut {
                burnouts += 1;
            }
        }
        assert_eq!(burnouts, 1);
        assert!(!game.spark().is_lit());
    }

    #[test]
    fn player_stays_grounded_on_the_courtyard() {
        let stage = courtyard();
        let mut game = session(&stage);
        let input = InputState::default();
        for _ in 0..60 {
            game.tick(DT, &input);
        }
        assert!(game.player().motion.grounded);
        assert!(game.player().position().y.abs() <= 0.1);
    }
}
