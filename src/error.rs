use std::io;

use thiserror::Error;

use crate::window::WindowId;

#[derive(Debug, Error)]
pub enum WmError {
    #[error("a non-root window requires a parent")]
    MissingParent,
    #[error("window {0} does not exist")]
    UnknownWindow(WindowId),
    #[error("unknown window class `{0}`")]
    UnknownClass(String),
    #[error("unknown message name `{0}`")]
    UnknownMessage(String),
    #[error("render state stack is full")]
    StateStackOverflow,
    #[error("render state stack is empty")]
    StateStackUnderflow,
    #[error("invalid style `{0}`")]
    InvalidStyle(String),
    #[error("invalid key binding `{0}`")]
    InvalidKeyBinding(String),
    #[error("config line {line}: {reason}")]
    Config { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, WmError>;
