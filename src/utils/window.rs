use anyhow::Result;
use tracing::{debug, warn};

/// Best-effort attempt to bring the target application's window to the
/// foreground before input is replayed into it.
///
/// Matching is by case-insensitive substring of the window title. Returns
/// Ok(true) only when a window was actually focused; a missing match or an
/// unsupported platform is Ok(false), never an error, so a run can proceed
/// with whatever window currently has focus.
pub fn focus_window(title_contains: &str) -> Result<bool> {
    debug!(target: "rowbot::window", %title_contains, "focus_window requested");
    focus_window_impl(title_contains)
}

#[cfg(windows)]
fn focus_window_impl(title_contains: &str) -> Result<bool> {
    // Win32 wiring (EnumWindows + GetWindowTextW + SetForegroundWindow,
    // restoring minimized windows first) is not linked in yet.
    warn!(
        target: "rowbot::window",
        %title_contains,
        "focus_window not implemented on Windows yet; returning Ok(false)"
    );
    Ok(false)
}

#[cfg(not(windows))]
fn focus_window_impl(_title_contains: &str) -> Result<bool> {
    warn!(
        target: "rowbot::window",
        "focus_window is not supported on this platform; returning Ok(false)"
    );
    Ok(false)
}
