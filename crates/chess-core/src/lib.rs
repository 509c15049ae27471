//! Game model shared by the coach: PGN parsing, move records and the replay cursor.

pub mod game_data;
pub mod pgn;
pub mod replay;

pub use game_data::{GameData, GameMetadata, MoveRecord, Side};
pub use pgn::{parse_pgn, PgnError};
pub use replay::{uci_to_san, uci_to_san_from_fen, Replay};
