use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use enigo::Keyboard as _;
use enigo::Mouse as _;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Settings};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::utils::window;

/// The input effects the runtime dispatches to.
///
/// `InputInjector` is the real implementation; tests substitute a recorder so
/// that effect ordering and suppression are observable without a display
/// server. Implementations must complete `set_clipboard` before returning —
/// a paste issued afterwards has to see the value.
pub trait InputSink {
    /// Press a modifier combo `count` times.
    fn key_combo(&mut self, keys: &[&str], count: u32) -> Result<()>;
    /// Press a single named key `count` times.
    fn press_key(&mut self, name: &str, count: u32) -> Result<()>;
    /// Type literal text (unicode).
    fn type_text(&mut self, text: &str) -> Result<()>;
    /// Write text to the system clipboard.
    fn set_clipboard(&mut self, text: &str) -> Result<()>;
    /// Enter text via the clipboard: set it, then issue ctrl+v.
    fn paste_text(&mut self, text: &str) -> Result<()>;
    /// Click the left mouse button at absolute screen coordinates.
    fn click_at(&mut self, x: i32, y: i32) -> Result<()>;
    /// Sleep for a fixed duration in milliseconds (blocking).
    fn wait_ms(&mut self, ms: u64) -> Result<()>;
    /// Try to focus a window with title containing the substring.
    /// Returns Ok(true) if a window was focused.
    fn focus_window(&mut self, title_contains: &str) -> Result<bool>;
}

/// Issues low-level input effects (keyboard/mouse/clipboard/sleep) with
/// optional dry-run mode. In dry-run mode, effects are only logged — with
/// their fully resolved payloads — and no real input is simulated.
pub struct InputInjector {
    dry_run: bool,
    enigo: Option<Enigo>,
    clipboard: Option<Clipboard>,
}

impl InputInjector {
    /// Create a new injector.
    /// - dry_run: when true, only logs instead of simulating real input.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            enigo: None,
            clipboard: None,
        }
    }

    /// Returns whether the injector is currently in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn ensure_enigo(&mut self) -> Result<&mut Enigo> {
        if self.enigo.is_none() {
            trace!(target: "rowbot::input", "Initializing Enigo");
            self.enigo =
                Some(Enigo::new(&Settings::default()).context("Failed to initialize Enigo")?);
        }
        Ok(self.enigo.as_mut().expect("Enigo must be initialized"))
    }

    fn ensure_clipboard(&mut self) -> Result<&mut Clipboard> {
        if self.clipboard.is_none() {
            trace!(target: "rowbot::input", "Initializing clipboard");
            self.clipboard =
                Some(Clipboard::new().context("Failed to initialize the clipboard")?);
        }
        Ok(self
            .clipboard
            .as_mut()
            .expect("Clipboard must be initialized"))
    }
}

impl InputSink for InputInjector {
    /// Modifiers are held, the terminal key clicked, modifiers released in
    /// reverse order.
    fn key_combo(&mut self, keys: &[&str], count: u32) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", ?keys, count, "DRY-RUN key_combo");
            return Ok(());
        }
        let mapped: Vec<Key> = keys.iter().map(|k| map_key(k)).collect::<Result<_>>()?;
        let Some((terminal, modifiers)) = mapped.split_last() else {
            return Ok(());
        };
        let enigo = self.ensure_enigo()?;
        trace!(target: "rowbot::input", ?keys, count, "key_combo");
        for _ in 0..count {
            for m in modifiers {
                enigo.key(*m, Direction::Press)?;
            }
            enigo.key(*terminal, Direction::Click)?;
            for m in modifiers.iter().rev() {
                enigo.key(*m, Direction::Release)?;
            }
        }
        Ok(())
    }

    fn press_key(&mut self, name: &str, count: u32) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", key = %name, count, "DRY-RUN press_key");
            return Ok(());
        }
        let key = map_key(name)?;
        let enigo = self.ensure_enigo()?;
        trace!(target: "rowbot::input", key = %name, count, "press_key");
        for _ in 0..count {
            enigo.key(key, Direction::Click)?;
        }
        Ok(())
    }

    fn type_text(&mut self, text: &str) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", %text, "DRY-RUN type_text");
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        trace!(target: "rowbot::input", len = text.len(), "type_text");
        enigo.text(text)?;
        Ok(())
    }

    /// Returns only after the clipboard holds the value, so a paste issued
    /// next is guaranteed to see it.
    fn set_clipboard(&mut self, text: &str) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", len = text.len(), %text, "DRY-RUN set_clipboard");
            return Ok(());
        }
        let clipboard = self.ensure_clipboard()?;
        trace!(target: "rowbot::input", len = text.len(), "set_clipboard");
        clipboard
            .set_text(text.to_string())
            .context("Failed to write to the clipboard")?;
        Ok(())
    }

    fn paste_text(&mut self, text: &str) -> Result<()> {
        self.set_clipboard(text)?;
        self.key_combo(&["ctrl", "v"], 1)
    }

    fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", x, y, "DRY-RUN click_at");
            return Ok(());
        }
        let enigo = self.ensure_enigo()?;
        trace!(target: "rowbot::input", x, y, "click_at");
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    }

    fn wait_ms(&mut self, ms: u64) -> Result<()> {
        if self.dry_run {
            info!(target: "rowbot::input", ms, "DRY-RUN wait");
            return Ok(());
        }
        trace!(target: "rowbot::input", ms, "wait");
        thread::sleep(Duration::from_millis(ms));
        Ok(())
    }

    fn focus_window(&mut self, title_contains: &str) -> Result<bool> {
        if self.dry_run {
            info!(target: "rowbot::input", %title_contains, "DRY-RUN focus_window");
            return Ok(false);
        }
        trace!(target: "rowbot::input", %title_contains, "focus_window");
        let focused = window::focus_window(title_contains)
            .with_context(|| format!("focus_window({title_contains}) failed"))?;
        if focused {
            debug!(target: "rowbot::input", %title_contains, "focus_window: focused=true");
        } else {
            warn!(target: "rowbot::input", %title_contains, "focus_window: no match");
        }
        Ok(focused)
    }
}

/// Map a recognized key name (or a single character) to an enigo key.
fn map_key(name: &str) -> Result<Key> {
    Ok(match name {
        "ctrl" => Key::Control,
        "alt" => Key::Alt,
        "shift" => Key::Shift,
        "enter" => Key::Return,
        "tab" => Key::Tab,
        "esc" => Key::Escape,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "delete" => Key::Delete,
        "backspace" => Key::Backspace,
        "space" => Key::Space,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => bail!("unrecognized key name '{other}'"),
            }
        }
    })
}
