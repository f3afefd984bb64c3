use log::{info, warn};
use thiserror::Error;

use crate::input::InputState;
use crate::loader::{LoadState, LoadTicket, ModelLoader, PackLoader};
use crate::pack::GamePack;
use crate::player::JumpRule;
use crate::session::{GameSession, SessionEvent};
use crate::stage::Stage;
use crate::world::StaticWorld;

/// Top-level scene the application can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    CutScene,
    Game,
    Lose,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::CutScene => "CUTSCENE",
            Self::Game => "GAME",
            Self::Lose => "LOSE",
        }
    }
}

/// Rejection returned by a transition trigger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Another transition is still loading; the trigger is ignored rather
    /// than queued.
    #[error("a scene transition is already in flight")]
    Busy,
}

/// Explicit transition machine: `Idle` between scenes, `Loading` from the
/// moment a trigger fires until the target's readiness barrier resolves.
#[derive(Debug)]
enum Transition {
    Idle,
    Loading {
        target: Phase,
        tickets: Vec<LoadTicket>,
    },
}

/// The application: owns scene lifetime and sequences
/// START → CUTSCENE → GAME → LOSE → START.
///
/// Exactly one scene is live at a time. Every transition shows the loading
/// indicator, waits for the target's assets, hides the indicator, disposes
/// the previous scene exactly once, swaps, and re-attaches input — in that
/// order. Re-entrant triggers while loading are rejected with
/// [`TransitionError::Busy`], and a failed load surfaces through
/// [`App::load_failure`] instead of stalling the indicator.
#[derive(Debug)]
pub struct App<L: ModelLoader> {
    stage: Stage,
    loader: L,
    input: InputState,
    jump_rule: JumpRule,
    transition: Transition,
    phase: Option<Phase>,
    session: Option<GameSession<StaticWorld>>,
    /// Background preload of the gameplay assets, kicked off on entry to
    /// CUTSCENE so the CUTSCENE → GAME gate usually resolves instantly.
    preload: Option<Vec<LoadTicket>>,
    input_attached: bool,
    loading_indicator: bool,
    load_failure: Option<String>,
    failed_target: Option<Phase>,
    disposed_scenes: u32,
}

impl App<PackLoader> {
    /// Builds an application from a loaded game pack.
    pub fn from_pack(pack: GamePack) -> anyhow::Result<Self> {
        let stage = Stage::from_xml(pack.stage_xml())?;
        Self::new(stage, PackLoader::new(pack))
    }
}

impl<L: ModelLoader> App<L> {
    pub fn new(stage: Stage, loader: L) -> anyhow::Result<Self> {
        let bindings = stage.key_bindings()?;
        Ok(Self {
            stage,
            loader,
            input: InputState::new(bindings),
            jump_rule: JumpRule::default(),
            transition: Transition::Idle,
            phase: None,
            session: None,
            preload: None,
            input_attached: false,
            loading_indicator: false,
            load_failure: None,
            failed_target: None,
            disposed_scenes: 0,
        })
    }

    pub fn set_jump_rule(&mut self, rule: JumpRule) {
        self.jump_rule = rule;
    }

    /// The live scene, if the first transition has completed.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.transition, Transition::Loading { .. })
    }

    /// Whether the host should render a loading indicator this frame.
    pub fn loading_indicator(&self) -> bool {
        self.loading_indicator
    }

    /// The reason the last transition failed, until a new trigger fires.
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }

    pub fn input_attached(&self) -> bool {
        self.input_attached
    }

    /// Scenes released so far; each completed transition disposes exactly
    /// one once a previous scene exists.
    pub fn disposed_scenes(&self) -> u32 {
        self.disposed_scenes
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn session(&self) -> Option<&GameSession<StaticWorld>> {
        self.session.as_ref()
    }

    pub fn go_to_start(&mut self) -> Result<(), TransitionError> {
        self.trigger(Phase::Start)
    }

    pub fn go_to_cutscene(&mut self) -> Result<(), TransitionError> {
        self.trigger(Phase::CutScene)
    }

    pub fn go_to_game(&mut self) -> Result<(), TransitionError> {
        self.trigger(Phase::Game)
    }

    pub fn go_to_lose(&mut self) -> Result<(), TransitionError> {
        self.trigger(Phase::Lose)
    }

    /// Re-fires the transition that last failed, if any.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        match self.failed_target.take() {
            Some(target) => self.trigger(target),
            None => Ok(()),
        }
    }

    fn trigger(&mut self, target: Phase) -> Result<(), TransitionError> {
        if self.is_loading() {
            return Err(TransitionError::Busy);
        }
        // Detach input immediately so the outgoing scene stops reacting
        // (the menu-button double-click guard).
        self.input_attached = false;
        self.input.clear();
        self.load_failure = None;
        self.loading_indicator = true;

        let tickets = match target {
            Phase::Game => match self.preload.take() {
                Some(tickets) => tickets,
                None => self.begin_game_assets(),
            },
            _ => Vec::new(),
        };
        info!("transition to {} started", target.name());
        self.transition = Transition::Loading { target, tickets };
        Ok(())
    }

    fn begin_game_assets(&mut self) -> Vec<LoadTicket> {
        let names: Vec<String> = self
            .stage
            .models
            .iter()
            .map(|model| model.file.clone())
            .collect();
        names
            .iter()
            .map(|name| self.loader.begin(name))
            .collect()
    }

    /// Advances one frame: polls the in-flight transition, then runs the
    /// gameplay session while GAME is live.
    pub fn tick(&mut self, delta_time: f32) {
        self.poll_transition();

        if self.phase == Some(Phase::Game) && self.input_attached {
            if let Some(session) = self.session.as_mut() {
                if session.tick(delta_time, &self.input) == SessionEvent::SparkBurnedOut {
                    // The machine is idle here, so the trigger cannot be
                    // rejected.
                    let _ = self.go_to_lose();
                }
            }
        }
    }

    fn poll_transition(&mut self) {
        let Transition::Loading { target, tickets } =
            std::mem::replace(&mut self.transition, Transition::Idle)
        else {
            return;
        };

        let mut pending = false;
        let mut failure = None;
        for ticket in &tickets {
            match self.loader.poll(ticket) {
                LoadState::Ready => {}
                LoadState::Pending => {
                    pending = true;
                    break;
                }
                LoadState::Failed(reason) => {
                    failure = Some(reason);
                    break;
                }
            }
        }

        if let Some(reason) = failure {
            warn!("transition to {} failed: {reason}", target.name());
            self.loading_indicator = false;
            self.load_failure = Some(reason);
            self.failed_target = Some(target);
            // The previous scene stays live and regains input so the
            // player can retry or back out.
            self.input_attached = self.phase.is_some();
            return;
        }
        if pending {
            self.transition = Transition::Loading { target, tickets };
            return;
        }

        self.present(target);
    }

    /// Readiness barrier resolved: hide the indicator, dispose the old
    /// scene exactly once, swap, re-attach input.
    fn present(&mut self, target: Phase) {
        self.loading_indicator = false;

        if let Some(previous) = self.phase.take() {
            if previous == Phase::Game {
                self.session = None;
            }
            self.disposed_scenes += 1;
            info!("disposed {} scene", previous.name());
        }

        self.phase = Some(target);
        match target {
            Phase::Game => {
                let world = StaticWorld::from_stage(&self.stage);
                self.session = Some(GameSession::with_jump_rule(
                    &self.stage,
                    world,
                    self.jump_rule,
                ));
            }
            Phase::CutScene => {
                if self.preload.is_none() {
                    self.preload = Some(self.begin_game_assets());
                }
            }
            _ => {}
        }
        self.input_attached = true;
        self.transition = Transition::Idle;
        info!("entered {}", target.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StagedLoader;
    use crate::stage::{ModelRef, Surface, SurfaceKind};
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn stage_with_models() -> Stage {
        Stage {
            surfaces: vec![Surface {
                name: "courtyard".to_string(),
                kind: SurfaceKind::Collision,
                min: Vec3::new(-50.0, -1.0, -50.0),
                max: Vec3::new(50.0, 0.0, 50.0),
                normal: Vec3::Y,
                stair: false,
            }],
            lantern_holders: vec![Vec3::ZERO],
            models: vec![
                ModelRef {
                    name: "environment".to_string(),
                    file: "models/env.glb".to_string(),
                },
                ModelRef {
                    name: "lantern".to_string(),
                    file: "models/lantern.glb".to_string(),
                },
            ],
            spawn: Vec3::new(0.0, 0.1, 0.0),
            spark_ticks: 600,
            binding_overrides: Vec::new(),
        }
    }

    fn app() -> App<StagedLoader> {
        App::new(stage_with_models(), StagedLoader::new()).unwrap()
    }

    fn complete_game_assets(app: &mut App<StagedLoader>) {
        app.loader.complete("models/env.glb");
        app.loader.complete("models/lantern.glb");
    }

    #[test]
    fn full_sequence_disposes_one_scene_per_transition() {
        let mut app = app();
        app.go_to_start().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Start));
        assert_eq!(app.disposed_scenes(), 0);
        assert!(app.input_attached());

        app.go_to_cutscene().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::CutScene));
        assert_eq!(app.disposed_scenes(), 1);

        complete_game_assets(&mut app);
        app.go_to_game().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Game));
        assert_eq!(app.disposed_scenes(), 2);
        assert!(app.input_attached());
        assert!(app.session().is_some());
        assert!(!app.loading_indicator());
    }

    #[test]
    fn triggers_are_rejected_while_loading() {
        let mut app = app();
        app.go_to_start().unwrap();
        // Readiness resolves on the next tick, so a second click races.
        assert_eq!(app.go_to_start(), Err(TransitionError::Busy));
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Start));
        assert_eq!(app.disposed_scenes(), 0);
    }

    #[test]
    fn game_gate_waits_for_pending_assets() {
        let mut app = app();
        app.go_to_start().unwrap();
        app.tick(DT);
        app.go_to_cutscene().unwrap();
        app.tick(DT);

        // Assets still pending: the gate holds and the indicator stays up.
        app.go_to_game().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::CutScene));
        assert!(app.is_loading());
        assert!(app.loading_indicator());
        assert!(!app.input_attached());

        complete_game_assets(&mut app);
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Game));
        assert!(!app.loading_indicator());
    }

    #[test]
    fn failed_load_surfaces_and_allows_retry() {
        let mut app = app();
        app.go_to_start().unwrap();
        app.tick(DT);
        app.go_to_cutscene().unwrap();
        app.tick(DT);

        app.loader.fail("models/env.glb", "corrupt glb");
        app.loader.complete("models/lantern.glb");
        app.go_to_game().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::CutScene));
        assert!(!app.is_loading());
        assert!(!app.loading_indicator(), "indicator must not stall");
        assert_eq!(app.load_failure(), Some("corrupt glb"));
        assert!(app.input_attached(), "previous scene regains input");

        app.loader.complete("models/env.glb");
        app.retry().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Game));
        assert_eq!(app.load_failure(), None);
    }

    #[test]
    fn spark_burnout_presents_lose_exactly_once() {
        let mut stage = stage_with_models();
        stage.spark_ticks = 30;
        stage.spawn = Vec3::new(20.0, 0.1, 20.0); // away from the lantern
        let mut app = App::new(stage, StagedLoader::new()).unwrap();

        app.go_to_start().unwrap();
        app.tick(DT);
        app.go_to_cutscene().unwrap();
        app.tick(DT);
        complete_game_assets(&mut app);
        app.go_to_game().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Game));

        for _ in 0..100 {
            app.tick(DT);
        }
        assert_eq!(app.phase(), Some(Phase::Lose));
        // START → CUTSCENE, CUTSCENE → GAME, GAME → LOSE.
        assert_eq!(app.disposed_scenes(), 3);
        assert!(app.session().is_none(), "game session released on dispose");

        app.go_to_start().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Start));
    }

    #[test]
    fn cutscene_preloads_game_assets_in_the_background() {
        let mut app = app();
        app.go_to_start().unwrap();
        app.tick(DT);
        app.go_to_cutscene().unwrap();
        app.tick(DT);
        assert!(app.preload.is_some());

        // Assets resolve while the cutscene plays; entering the game then
        // completes on the first poll.
        complete_game_assets(&mut app);
        app.go_to_game().unwrap();
        app.tick(DT);
        assert_eq!(app.phase(), Some(Phase::Game));
    }
}
