use serde::{Deserialize, Serialize};
use shakmaty::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Capitalized name for coaching text ("White", "Black").
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "white" => Ok(Side::White),
            "b" | "black" => Ok(Side::Black),
            other => Err(format!("unknown side '{other}' (use white or black)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub event: Option<String>,
    pub date: Option<String>,
    /// Custom start position from a `FEN` header.
    pub fen: Option<String>,
}

/// One half-move of the loaded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// 0-based index into the move list
    pub ply: usize,
    pub from: String,
    pub to: String,
    pub san: String,
    /// Long algebraic form, castling as king move (e1g1)
    pub uci: String,
    pub side: Side,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub metadata: GameMetadata,
    pub moves: Vec<MoveRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("white".parse::<Side>(), Ok(Side::White));
        assert_eq!(" B ".parse::<Side>(), Ok(Side::Black));
        assert!("red".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_color_conversion() {
        assert_eq!(Side::from(Color::Black), Side::Black);
        assert_eq!(Color::from(Side::White), Color::White);
    }

    #[test]
    fn test_move_record_json() {
        let mv = MoveRecord {
            ply: 0,
            from: "e2".into(),
            to: "e4".into(),
            san: "e4".into(),
            uci: "e2e4".into(),
            side: Side::White,
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["side"], "white");
        assert_eq!(json["to"], "e4");
    }
}
