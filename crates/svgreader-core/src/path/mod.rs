pub mod interpreter;
pub mod token;

pub use interpreter::{add_path, add_path_data};
pub use token::{PathBuilder, PathToken, tokenize};

use crate::geom::Point;

/// One continuous polyline run between a move and the next move/close.
pub type Subpath = Vec<Point>;

/// A malformed path; aborts the current path only.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("unexpected {text:?} in path data at offset {offset}")]
    Lex { offset: usize, text: String },

    #[error("path data must start with a command, found {value}")]
    MissingCommand { value: f64 },

    #[error("unknown path command '{command}'")]
    UnknownCommand { command: char },

    #[error("not enough parameters for '{command}': expected {expected}, found {found}")]
    MissingParameters {
        command: char,
        expected: usize,
        found: usize,
    },
}
