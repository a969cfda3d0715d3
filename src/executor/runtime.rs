use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::control::{ControlHandle, Mode};
use crate::executor::actions::{InputInjector, InputSink};
use crate::plan::{Action, PlanEntry};

/// Poll interval while paused.
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// How `text_k` values are entered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryMode {
    /// Type the value character by character.
    Typing,
    /// Put the value on the clipboard and paste it.
    Clipboard,
}

/// Knobs for one run, mirroring the CLI surface.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Delay before the first row.
    pub startup_delay: Duration,
    /// Delay after each completed row.
    pub row_delay: Duration,
    /// Delay after each issued action.
    pub action_delay: Duration,
    pub entry_mode: EntryMode,
    /// Describe actions instead of issuing them; delays are skipped too.
    pub dry_run: bool,
    /// Bring a window whose title contains this text to front before each row.
    pub window_title: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(3),
            row_delay: Duration::from_millis(250),
            action_delay: Duration::from_millis(250),
            entry_mode: EntryMode::Clipboard,
            dry_run: false,
            window_title: None,
        }
    }
}

/// Runtime is responsible for:
/// - walking the compiled plan one entry, one action at a time
/// - honoring the shared control mode before every action
/// - dispatching resolved actions to an `InputSink`
///
/// Dry-run and live runs share this exact control flow; only the injector's
/// side effects (and the delays) differ.
pub struct Runtime<I: InputSink = InputInjector> {
    opts: RunOptions,
    injector: I,
    control: ControlHandle,
    rows_processed: u64,
}

impl Runtime<InputInjector> {
    /// Create a new runtime with the given options and control handle.
    pub fn new(opts: RunOptions, control: ControlHandle) -> Self {
        let injector = InputInjector::new(opts.dry_run);
        Self::with_injector(injector, opts, control)
    }
}

impl<I: InputSink> Runtime<I> {
    /// Create a runtime over a custom input sink (tests use a recorder).
    pub fn with_injector(injector: I, opts: RunOptions, control: ControlHandle) -> Self {
        Self {
            opts,
            injector,
            control,
            rows_processed: 0,
        }
    }

    /// Is dry-run currently enabled?
    pub fn is_dry_run(&self) -> bool {
        self.opts.dry_run
    }

    /// Access the underlying sink (tests inspect recorded effects here).
    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Rows fully processed so far (monotonic within one run).
    pub fn rows_processed(&self) -> u64 {
        self.rows_processed
    }

    /// Drive the whole plan. Returns the number of fully processed rows,
    /// which is smaller than the plan length when a stop was requested.
    pub fn run(&mut self, plan: &[PlanEntry]) -> Result<u64> {
        info!(
            target: "rowbot::runtime",
            entries = plan.len(),
            dry_run = self.opts.dry_run,
            "Starting run"
        );
        let window_title = self.opts.window_title.clone();
        // Focus once up front so the startup delay counts against the right
        // window, then again before each row.
        if let Some(title) = &window_title {
            self.injector.focus_window(title)?;
        }
        self.sleep(self.opts.startup_delay);

        for entry in plan {
            if self.checkpoint() == Mode::Stopped {
                info!(
                    target: "rowbot::runtime",
                    rows = self.rows_processed,
                    "Stop requested; ending run before next row"
                );
                return Ok(self.rows_processed);
            }
            if let Some(title) = &window_title {
                self.injector.focus_window(title)?;
            }

            debug!(
                target: "rowbot::runtime",
                line = entry.line,
                actions = entry.actions.len(),
                "Row"
            );
            for action in &entry.actions {
                // Fresh read before every action; a stop drops the rest of
                // the row without issuing anything further.
                if self.checkpoint() == Mode::Stopped {
                    info!(
                        target: "rowbot::runtime",
                        line = entry.line,
                        rows = self.rows_processed,
                        "Stop requested; aborting mid-row"
                    );
                    return Ok(self.rows_processed);
                }
                self.perform(action)
                    .with_context(|| format!("row at line {} failed", entry.line))?;
                self.sleep(self.opts.action_delay);
            }

            self.rows_processed += 1;
            trace!(target: "rowbot::runtime", line = entry.line, "Row complete");
            self.sleep(self.opts.row_delay);
        }

        info!(
            target: "rowbot::runtime",
            rows = self.rows_processed,
            "Run complete"
        );
        Ok(self.rows_processed)
    }

    /// Read the shared mode, blocking while paused. Returns `Running` or
    /// `Stopped`.
    fn checkpoint(&self) -> Mode {
        match self.control.mode() {
            Mode::Paused => {
                info!(target: "rowbot::runtime", "Paused; waiting for resume");
                let mode = self.control.wait_while_paused(PAUSE_POLL);
                if mode == Mode::Running {
                    info!(target: "rowbot::runtime", "Resumed");
                } else {
                    warn!(target: "rowbot::runtime", "Stopped while paused");
                }
                mode
            }
            other => other,
        }
    }

    fn perform(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Combo { keys, clipboard } => {
                // The clipboard write completes before the combo is issued.
                if let Some(value) = clipboard {
                    self.injector.set_clipboard(value)?;
                }
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                self.injector.key_combo(&keys, 1)
            }
            Action::Text { value } => match self.opts.entry_mode {
                EntryMode::Typing => self.injector.type_text(value),
                EntryMode::Clipboard => self.injector.paste_text(value),
            },
            Action::Tab { count } => self.injector.press_key("tab", *count),
            Action::ShiftTab { count } => self.injector.key_combo(&["shift", "tab"], *count),
            Action::Enter { count } => self.injector.press_key("enter", *count),
            Action::Wait { ms } => self.injector.wait_ms(*ms),
            Action::Click { x, y } => self.injector.click_at(*x, *y),
            Action::Key { name } => self.injector.press_key(name, 1),
        }
    }

    fn sleep(&self, duration: Duration) {
        if self.opts.dry_run || duration.is_zero() {
            return;
        }
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{self, CompileOptions};

    /// Records every issued effect in order; optionally flips the shared
    /// control to stopped after the n-th effect, emulating a hotkey landing
    /// while a row is in flight.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        control: Option<ControlHandle>,
        stop_after: Option<usize>,
    }

    impl Recorder {
        fn record(&mut self, event: String) -> Result<()> {
            self.events.push(event);
            if let Some(n) = self.stop_after
                && self.events.len() == n
                && let Some(control) = &self.control
            {
                control.stop();
            }
            Ok(())
        }
    }

    impl InputSink for Recorder {
        fn key_combo(&mut self, keys: &[&str], count: u32) -> Result<()> {
            self.record(format!("combo {} x{count}", keys.join("+")))
        }
        fn press_key(&mut self, name: &str, count: u32) -> Result<()> {
            self.record(format!("key {name} x{count}"))
        }
        fn type_text(&mut self, text: &str) -> Result<()> {
            self.record(format!("type {text}"))
        }
        fn set_clipboard(&mut self, text: &str) -> Result<()> {
            self.record(format!("clipboard {text}"))
        }
        fn paste_text(&mut self, text: &str) -> Result<()> {
            self.set_clipboard(text)?;
            self.key_combo(&["ctrl", "v"], 1)
        }
        fn click_at(&mut self, x: i32, y: i32) -> Result<()> {
            self.record(format!("click {x},{y}"))
        }
        fn wait_ms(&mut self, ms: u64) -> Result<()> {
            self.record(format!("wait {ms}"))
        }
        fn focus_window(&mut self, title_contains: &str) -> Result<bool> {
            self.record(format!("focus {title_contains}"))?;
            Ok(true)
        }
    }

    fn zero_delays() -> RunOptions {
        RunOptions {
            startup_delay: Duration::ZERO,
            row_delay: Duration::ZERO,
            action_delay: Duration::ZERO,
            ..RunOptions::default()
        }
    }

    fn dry_options() -> RunOptions {
        RunOptions {
            dry_run: true,
            ..zero_delays()
        }
    }

    fn plan_from(csv: &str) -> Vec<plan::PlanEntry> {
        let rows = plan::rows_from_str(csv).unwrap();
        plan::compile_rows(&rows, CompileOptions::default()).unwrap()
    }

    fn sample_plan() -> Vec<plan::PlanEntry> {
        plan_from("ctrl+v_1,tab_1,click-100x1200_2\npaste me,2,\nmore,1,\n")
    }

    #[test]
    fn test_dry_run_processes_every_row() {
        let plan = sample_plan();
        let mut rt = Runtime::new(dry_options(), ControlHandle::new());
        assert!(rt.is_dry_run());
        let rows = rt.run(&plan).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(rt.rows_processed(), 2);
    }

    #[test]
    fn test_stopped_control_issues_nothing() {
        let plan = sample_plan();
        let control = ControlHandle::new();
        control.stop();
        let mut rt = Runtime::with_injector(Recorder::default(), zero_delays(), control);
        assert_eq!(rt.run(&plan).unwrap(), 0);
        assert!(rt.injector().events.is_empty());
    }

    #[test]
    fn test_clipboard_set_strictly_before_paste() {
        let plan = plan_from("ctrl+v_1\npaste me\n");
        let mut rt =
            Runtime::with_injector(Recorder::default(), zero_delays(), ControlHandle::new());
        rt.run(&plan).unwrap();
        assert_eq!(
            rt.injector().events,
            vec!["clipboard paste me".to_string(), "combo ctrl+v x1".to_string()]
        );
    }

    #[test]
    fn test_stop_mid_row_suppresses_remaining_actions() {
        // One row, three actions; the stop lands after the first effect.
        let plan = plan_from("tab_1,enter_2,f9_3\n1,1,\n");
        let control = ControlHandle::new();
        let recorder = Recorder {
            control: Some(control.clone()),
            stop_after: Some(1),
            ..Recorder::default()
        };
        let mut rt = Runtime::with_injector(recorder, zero_delays(), control);
        assert_eq!(rt.run(&plan).unwrap(), 0);
        assert_eq!(rt.injector().events, vec!["key tab x1".to_string()]);
    }

    #[test]
    fn test_window_focused_before_startup_and_each_row() {
        let plan = plan_from("tab_1\n1\n");
        let opts = RunOptions {
            window_title: Some("TIA Portal".into()),
            ..zero_delays()
        };
        let mut rt = Runtime::with_injector(Recorder::default(), opts, ControlHandle::new());
        rt.run(&plan).unwrap();
        assert_eq!(
            rt.injector().events,
            vec![
                "focus TIA Portal".to_string(),
                "focus TIA Portal".to_string(),
                "key tab x1".to_string(),
            ]
        );
    }

    #[test]
    fn test_paused_run_unblocks_on_stop() {
        let plan = sample_plan();
        let control = ControlHandle::new();
        control.toggle_pause();
        let remote = control.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.stop();
        });
        let mut rt = Runtime::new(dry_options(), control);
        assert_eq!(rt.run(&plan).unwrap(), 0);
        stopper.join().unwrap();
    }

    #[test]
    fn test_empty_plan_completes() {
        let mut rt = Runtime::new(dry_options(), ControlHandle::new());
        assert_eq!(rt.run(&[]).unwrap(), 0);
    }
}
