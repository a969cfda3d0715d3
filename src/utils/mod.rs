//! Utility helpers for Rowbot.
//!
//! - `window`: best-effort focusing of the target application's window.

pub mod window;

pub use window::focus_window;
