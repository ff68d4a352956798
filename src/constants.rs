//! Shared crate-wide constants.

/// Width in cells of a window border on each side.
pub const BORDER_INSET: u16 = 1;

/// Height in rows of a caption bar on a borderless window.
pub const CAPTION_INSET: u16 = 1;

/// Maximum number of render-state snapshots that can be pushed at once.
///
/// Handlers that nest `with_saved_state` deeper than this get
/// `WmError::StateStackOverflow` instead of growing the stack without bound.
pub const MAX_STATE_DEPTH: usize = 16;

/// Two presses of the same button on the same cell within this many
/// milliseconds are reported as a double click.
pub const DOUBLE_CLICK_MS: u64 = 400;

/// Default idle wait of the dispatch loop between terminal size polls.
pub const DEFAULT_POLL_MS: u64 = 16;

/// Poll interval used by the input producer thread so it can notice shutdown.
pub const INPUT_POLL_MS: u64 = 50;
