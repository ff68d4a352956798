//! Windowing, compositing and message-dispatch core for character-cell UIs.
//!
//! A [`Desktop`] owns a tree of rectangular windows sharing one terminal
//! screen. Every cell write goes through the occlusion test in
//! [`compositor`], and every state change reaches the screen by way of typed
//! messages dispatched through per-window handler chains with class fallback.

pub mod class;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod desktop;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod keybindings;
pub mod message;
mod modal;
pub mod queue;
pub mod state;
pub mod term_color;
pub mod theme;
pub mod tracing_sub;
pub mod window;

pub use class::{ClassId, ClassRegistry};
pub use desktop::Desktop;
pub use error::{Result, WmError};
pub use geometry::{Insets, Rect, WindowFlags};
pub use message::{Handler, HandlerResult, Message, MessageKind, Payload};
pub use window::{InteractionMode, WindowId};
