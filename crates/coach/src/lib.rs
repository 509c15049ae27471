//! Replays a PGN game against a UCI engine and turns its evaluations into
//! beginner coaching text.

pub use chess_core;

pub mod advice;
pub mod config;
pub mod controller;
pub mod error;
pub mod eval;
pub mod gateway;
pub mod render;
pub mod uci;

pub use controller::{Controller, Effect};
pub use gateway::{EngineGateway, EngineLine, RequestPurpose, RequestTag};
