//! pacman backend for rusty-packages.

pub mod backend;
pub mod parse;

pub use backend::{PacmanConfig, PacmanSource, ReverseDepsQuery};
