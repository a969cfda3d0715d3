#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for Rowbot.

This module wires together:
- `actions`: low-level input injection (keyboard, mouse, clipboard, sleep)
- `runtime`: the plan-driving loop with pause/stop checkpoints and delays

Typical usage:
- Compile a plan with `rowbot::plan`.
- Construct a `Runtime` with `RunOptions` and a `ControlHandle`.
- Call `Runtime::run` with the compiled entries.

Example:
```no_run
use rowbot::control::ControlHandle;
use rowbot::executor::{RunOptions, Runtime};
use rowbot::plan::{self, CompileOptions};

let rows = plan::rows_from_str("text_1,tab_1\nhello,2\n").unwrap();
let entries = plan::compile_rows(&rows, CompileOptions::default()).unwrap();
let opts = RunOptions { dry_run: true, ..RunOptions::default() };
let mut rt = Runtime::new(opts, ControlHandle::new());
// rt.run(&entries)?;
```

Public re-exports:
- `InputSink`: the effect interface the runtime dispatches to.
- `InputInjector`: performs low-level effects (respecting dry-run).
- `Runtime`, `RunOptions`, `EntryMode`: plan execution.
*/

pub mod actions;
pub mod runtime;

// Re-exports for convenient access from `rowbot::executor::*`
pub use actions::{InputInjector, InputSink};
pub use runtime::{EntryMode, RunOptions, Runtime};
