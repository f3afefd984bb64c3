#![cfg(target_arch = "wasm32")]

use wasm_bindgen::prelude::*;

use crate::app::{App, Phase, TransitionError};
use crate::input::KeyCode;
use crate::loader::PackLoader;
use crate::pack::GamePack;
use crate::player::JumpRule;

/// Browser entry point: owns the application and forwards DOM keyboard
/// events into it. The host page drives [`WebGame::tick`] from its
/// requestAnimationFrame loop and reads state back for its HUD.
#[wasm_bindgen]
pub struct WebGame {
    app: App<PackLoader>,
}

#[wasm_bindgen]
impl WebGame {
    /// Builds the game from pack bytes fetched by the page.
    #[wasm_bindgen(constructor)]
    pub fn new(pack_bytes: js_sys::Uint8Array) -> Result<WebGame, JsValue> {
        console_error_panic_hook::set_once();
        let pack = GamePack::from_bytes(pack_bytes.to_vec())
            .map_err(|err| JsValue::from_str(&format!("failed to load pack: {err}")))?;
        log_to_console(&format!("Loaded pack with {} files", pack.files().len()));
        let app = App::from_pack(pack)
            .map_err(|err| JsValue::from_str(&format!("failed to build application: {err}")))?;
        Ok(WebGame { app })
    }

    pub fn go_to_start(&mut self) -> Result<(), JsValue> {
        self.app.go_to_start().map_err(busy)
    }

    pub fn go_to_cutscene(&mut self) -> Result<(), JsValue> {
        self.app.go_to_cutscene().map_err(busy)
    }

    pub fn go_to_game(&mut self) -> Result<(), JsValue> {
        self.app.go_to_game().map_err(busy)
    }

    pub fn retry(&mut self) -> Result<(), JsValue> {
        self.app.retry().map_err(busy)
    }

    pub fn tick(&mut self, delta_time: f32) {
        self.app.tick(delta_time);
    }

    /// Feeds a `KeyboardEvent.key` value. Unmapped keys are ignored.
    pub fn key_down(&mut self, name: &str) {
        if let Some(key) = KeyCode::from_name(name) {
            self.app.input().set_key_down(key);
        }
    }

    pub fn key_up(&mut self, name: &str) {
        if let Some(key) = KeyCode::from_name(name) {
            self.app.input().set_key_up(key);
        }
    }

    pub fn set_legacy_jump(&mut self, enabled: bool) {
        self.app.set_jump_rule(if enabled {
            JumpRule::WhileHeld
        } else {
            JumpRule::PerPress
        });
    }

    pub fn phase(&self) -> String {
        self.app
            .phase()
            .map(Phase::name)
            .unwrap_or("NONE")
            .to_string()
    }

    pub fn loading_indicator(&self) -> bool {
        self.app.loading_indicator()
    }

    pub fn load_failure(&self) -> Option<String> {
        self.app.load_failure().map(str::to_string)
    }

    /// Player position as `[x, y, z]`, or `None` outside of GAME.
    pub fn player_position(&self) -> Option<Box<[f32]>> {
        let position = self.app.session()?.player().position();
        Some(Box::new([position.x, position.y, position.z]))
    }

    pub fn camera_anchor(&self) -> Option<Box<[f32]>> {
        let anchor = self.app.session()?.camera().anchor();
        Some(Box::new([anchor.x, anchor.y, anchor.z]))
    }

    pub fn lanterns_lit(&self) -> u32 {
        self.app.session().map_or(0, |s| s.lanterns_lit())
    }

    pub fn lantern_count(&self) -> u32 {
        self.app.session().map_or(0, |s| s.lantern_count() as u32)
    }

    pub fn spark_remaining(&self) -> u32 {
        self.app.session().map_or(0, |s| s.spark().remaining())
    }
}

fn busy(err: TransitionError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn log_to_console(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
