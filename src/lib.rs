//! Chess rules and move search.
//!
//! - [`engine`]: positions, FEN, move generation, attack analysis and
//!   terminal-state detection.
//! - [`ai`]: static evaluation, minimax search and the time-bounded runner.
//! - [`facade`]: [`ChessEngine`], the FEN-in/FEN-out entry point.
//! - [`config`]: search configuration read from the environment.

pub mod ai;
pub mod config;
pub mod engine;
pub mod facade;

pub use config::{Difficulty, EngineConfig, MoveSelection};
pub use engine::{ChessError, Game, GameStatus, Move, Position};
pub use facade::ChessEngine;
