//! Core modules for the lantern game runtime, rewritten in Rust.
//!
//! The crate exposes the scene state machine, the character controller and
//! the stage plumbing as plain building blocks that can be composed into a
//! playable runtime or driven headless from tooling.  Rendering and
//! platform integration are intentionally kept outside of the crate so
//! that the code remains testable and easy to embed.

pub mod app;
pub mod camera;
pub mod input;
pub mod lantern;
pub mod loader;
pub mod pack;
pub mod player;
pub mod probe;
pub mod session;
pub mod stage;
pub mod world;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{App, Phase, TransitionError};
pub use camera::FollowCamera;
pub use input::{Command, InputState, KeyBindings, KeyCode, NamedKey, SampledInput};
pub use lantern::{LanternField, Spark};
pub use loader::{LoadState, LoadTicket, ModelLoader, PackLoader, StagedLoader};
pub use pack::{GamePack, PackBuilder, PackFileEntry};
pub use player::{JumpRule, Player};
pub use probe::{Ray, RayCaster, RayHit};
pub use session::{GameSession, SessionEvent};
pub use stage::{Stage, Surface, SurfaceKind};
pub use world::StaticWorld;
