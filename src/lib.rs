//! Keyfall core crate.
//!
//! Four-lane falling-note rhythm game. Notes drop down the S / D / J / K lanes
//! and the player presses the lane key as a note crosses the hit line. The
//! gameplay core (`session` and the engines under it) is plain Rust driven
//! through the [`display::Display`] and [`clock::Scheduler`] seams; `web`
//! supplies the browser implementations and the `#[wasm_bindgen]` entry points.

use wasm_bindgen::prelude::*;

pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod judge;
pub mod lane;
pub mod logging;
pub mod motion;
pub mod note;
pub mod session;
pub mod spawn;
pub mod web;

pub use config::GameConfig;
pub use error::Error;
pub use lane::Lane;
pub use session::{Phase, Session, Tally};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Unified entrypoints
// -----------------------------------------------------------------------------

/// Start a 30 second game with the default tuning.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::launch(GameConfig::default())?;
    Ok(())
}

/// Start a game with tuning overrides given as JSON (missing keys keep defaults).
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let config = GameConfig::from_json(json)?;
    web::launch(config)?;
    Ok(())
}

#[wasm_bindgen]
pub fn reset_game() {
    web::reset();
}
