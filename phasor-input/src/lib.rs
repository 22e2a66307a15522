//! Vim-style modal keyboard input handling for Phasor

mod commands;
mod modal;

pub use commands::{BridgeAction, Command, Mode};
pub use modal::{InputHandler, NUDGE_STEP, SCRUB_STEP};
