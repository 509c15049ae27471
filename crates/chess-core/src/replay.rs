//! Replay cursor over a parsed game.
//!
//! Positions for every ply are computed once at load time, so stepping
//! forward and back is an index move rather than make/unmake.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, EnPassantMode, Position};

use crate::game_data::{GameData, GameMetadata, MoveRecord, Side};
use crate::pgn::{self, PgnError};

#[derive(Debug, Clone)]
pub struct Replay {
    game: GameData,
    /// `positions[i]` is the position before ply `i`
    positions: Vec<Chess>,
    cursor: usize,
}

impl Replay {
    /// Parse PGN text and place the cursor on the start position.
    pub fn load(pgn: &str) -> Result<Self, PgnError> {
        let (game, positions) = pgn::parse_game(pgn)?;
        Ok(Self {
            game,
            positions,
            cursor: 0,
        })
    }

    pub fn metadata(&self) -> &GameMetadata {
        &self.game.metadata
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.game.moves
    }

    pub fn len(&self) -> usize {
        self.game.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.game.moves.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.len()
    }

    /// FEN of the position at the cursor.
    pub fn fen(&self) -> String {
        fen_of(&self.positions[self.cursor])
    }

    /// Side to move at the cursor.
    pub fn turn(&self) -> Side {
        self.positions[self.cursor].turn().into()
    }

    /// The move that led to the cursor position.
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.cursor.checked_sub(1).map(|ply| &self.game.moves[ply])
    }

    /// Play the next move. Returns the move played, or `None` at the end.
    pub fn step_forward(&mut self) -> Option<&MoveRecord> {
        if self.at_end() {
            return None;
        }
        self.cursor += 1;
        Some(&self.game.moves[self.cursor - 1])
    }

    /// Undo one ply. Returns the move taken back, or `None` at the start.
    pub fn step_back(&mut self) -> Option<&MoveRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.game.moves[self.cursor])
    }

    /// Render a UCI move as SAN in the position before `ply`.
    pub fn uci_to_san_at(&self, ply: usize, uci: &str) -> Option<String> {
        uci_to_san(self.positions.get(ply)?, uci)
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Convert a single UCI move to SAN at a given position.
pub fn uci_to_san(pos: &Chess, uci_str: &str) -> Option<String> {
    let uci_move: UciMove = uci_str.parse().ok()?;
    let legal_move = uci_move.to_move(pos).ok()?;
    Some(San::from_move(pos, legal_move).to_string())
}

/// Convert a UCI move to SAN given a FEN string.
pub fn uci_to_san_from_fen(fen: &str, uci_str: &str) -> Option<String> {
    uci_to_san(&pgn::position_from_fen(fen)?, uci_str)
}
