//! PGN parsing: regex header extraction, a movetext scanner and shakmaty for legality.

use std::sync::LazyLock;

use regex::Regex;
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Position};
use thiserror::Error;

use crate::game_data::{GameData, GameMetadata, MoveRecord};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[\s*(\w+)\s+"([^"]*)"\s*\]"#).expect("header regex"));
static MOVE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.+").expect("move number regex"));
// Promotion written without `=` (bxa8Q)
static BARE_PROMOTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-h](?:x[a-h])?[18])([QRBN])([+#]?)$").expect("promotion regex"));

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    NoMoves,

    #[error("Invalid FEN header: {0}")]
    InvalidFen(String),

    #[error("Unreadable move '{san}' at ply {ply}")]
    InvalidSan { ply: usize, san: String },

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },
}

/// Parse a PGN string into a GameData struct.
pub fn parse_pgn(pgn: &str) -> Result<GameData, PgnError> {
    parse_game(pgn).map(|(game, _)| game)
}

/// Parse a PGN string, also returning the position before every ply plus the
/// final one (`positions.len() == moves.len() + 1`).
pub(crate) fn parse_game(pgn: &str) -> Result<(GameData, Vec<Chess>), PgnError> {
    let (words, end) = scan_movetext(pgn);
    let metadata = parse_headers(&pgn[..end]);

    let start = match &metadata.fen {
        Some(fen) => position_from_fen(fen).ok_or_else(|| PgnError::InvalidFen(fen.clone()))?,
        None => Chess::default(),
    };

    let tokens: Vec<String> = words.into_iter().filter_map(normalize_token).collect();
    if tokens.is_empty() {
        return Err(PgnError::NoMoves);
    }

    let mut pos = start.clone();
    let mut positions = Vec::with_capacity(tokens.len() + 1);
    positions.push(start);
    let mut moves = Vec::with_capacity(tokens.len());

    for (ply, token) in tokens.into_iter().enumerate() {
        let san: San = token.parse().map_err(|_| PgnError::InvalidSan {
            ply,
            san: token.clone(),
        })?;
        let mv = san.to_move(&pos).map_err(|_| PgnError::IllegalMove {
            ply,
            san: token.clone(),
        })?;

        let uci = mv.to_uci(CastlingMode::Standard);
        let (from, to) = match &uci {
            UciMove::Normal { from, to, .. } => (from.to_string(), to.to_string()),
            UciMove::Put { to, .. } => (to.to_string(), to.to_string()),
            UciMove::Null => {
                return Err(PgnError::IllegalMove { ply, san: token });
            }
        };

        moves.push(MoveRecord {
            ply,
            from,
            to,
            san: token,
            uci: uci.to_string(),
            side: pos.turn().into(),
        });

        pos.play_unchecked(mv.clone());
        positions.push(pos.clone());
    }

    Ok((GameData { metadata, moves }, positions))
}

fn parse_headers(pgn: &str) -> GameMetadata {
    let mut metadata = GameMetadata {
        result: "*".to_string(),
        ..GameMetadata::default()
    };

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].trim().to_string();
        match &cap[1] {
            "White" => metadata.white = value,
            "Black" => metadata.black = value,
            "Result" => metadata.result = value,
            "Event" => metadata.event = Some(value),
            "Date" => metadata.date = Some(value),
            "FEN" if !value.is_empty() => metadata.fen = Some(value),
            _ => {}
        }
    }

    metadata
}

/// Split the first game's movetext into words at depth zero: tag pairs,
/// comments and variations are skipped. Returns the words and the byte offset
/// just past the game's result token (or the end of input).
fn scan_movetext(pgn: &str) -> (Vec<&str>, usize) {
    let bytes = pgn.as_bytes();
    let mut words = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => i = skip_past(pgn, i, "}"),
            b';' => i = skip_past(pgn, i, "\n"),
            b'[' => i = skip_tag_pair(bytes, i),
            b'(' => {
                depth += 1;
                i += 1;
            }
            b')' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && !b"{;[()".contains(&bytes[i]) {
                    i += 1;
                }
                if depth > 0 {
                    continue;
                }
                let word = &pgn[start..i];
                if RESULTS.contains(&word) {
                    return (words, i);
                }
                words.push(word);
            }
        }
    }

    (words, bytes.len())
}

fn skip_past(pgn: &str, from: usize, end: &str) -> usize {
    pgn[from..].find(end).map_or(pgn.len(), |at| from + at + end.len())
}

fn skip_tag_pair(bytes: &[u8], from: usize) -> usize {
    let mut quoted = false;
    let mut i = from + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => quoted = !quoted,
            b'\\' if quoted => i += 1,
            b']' if !quoted => return i + 1,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// Reduce a movetext word to a SAN token: move numbers, NAGs and `!?`
/// annotations go, zero-castling becomes `O-O` and a bare promotion piece
/// gets its `=`. `None` when nothing of the word is a move.
fn normalize_token(word: &str) -> Option<String> {
    let word = MOVE_NUMBER_RE.replace(word, "");
    if word.starts_with('$') || word == "e.p." {
        return None;
    }
    let word = word.trim_end_matches(['!', '?']);
    if word.is_empty() {
        return None;
    }

    let word = if word.starts_with("0-0") {
        word.replace('0', "O")
    } else {
        word.to_string()
    };
    Some(BARE_PROMOTION_RE.replace(&word, "${1}=${2}${3}").into_owned())
}

pub(crate) fn position_from_fen(fen: &str) -> Option<Chess> {
    let fen: Fen = fen.trim().parse().ok()?;
    fen.into_position::<Chess>(CastlingMode::Standard).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_data::Side;

    #[test]
    fn test_parse_pgn_basic() {
        let pgn = r#"[White "Player1"]
[Black "Player2"]
[Result "1-0"]
[Date "2025.01.15"]

1. e4 e5 2. Nf3 Nc6 1-0"#;

        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.white, "Player1");
        assert_eq!(game.metadata.black, "Player2");
        assert_eq!(game.metadata.result, "1-0");
        assert_eq!(game.metadata.date.as_deref(), Some("2025.01.15"));
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.moves[0].san, "e4");
        assert_eq!(game.moves[0].from, "e2");
        assert_eq!(game.moves[0].to, "e4");
        assert_eq!(game.moves[1].side, Side::Black);
        assert_eq!(game.moves[2].uci, "g1f3");
    }

    #[test]
    fn test_headers_and_moves_on_one_line() {
        let pgn = r#"[White "A"] [Black "B"] 1. d4 d5 2. c4"#;
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.metadata.black, "B");
        assert_eq!(game.moves.len(), 3);
    }

    #[test]
    fn test_comments_variations_and_nags_are_skipped() {
        let pgn = "1. e4 {best by test} e5 (1... c5 2. Nf3 (2. c3 d5) d6) 2. Nf3 $1 Nc6 ; Qh5 would be silly\n3. Bb5 a6 *";
        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let pgn = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. 0-0 Nf6";
        let game = parse_pgn(pgn).unwrap();
        let castle = &game.moves[6];
        assert_eq!(castle.san, "O-O");
        assert_eq!(castle.from, "e1");
        assert_eq!(castle.to, "g1");
        assert_eq!(castle.uci, "e1g1");
    }

    #[test]
    fn test_fen_header_sets_start_position() {
        let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1"]

1... Kd7 2. e4"#;
        let (game, positions) = parse_game(pgn).unwrap();
        assert_eq!(game.moves.len(), 2);
        assert_eq!(game.moves[0].side, Side::Black);
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn test_invalid_pgn() {
        assert_eq!(parse_pgn("").unwrap_err(), PgnError::NoMoves);
        assert_eq!(parse_pgn("1. 2. *").unwrap_err(), PgnError::NoMoves);
        assert_eq!(
            parse_pgn("hello world").unwrap_err(),
            PgnError::InvalidSan { ply: 0, san: "hello".into() }
        );
        assert_eq!(
            parse_pgn("1. e4 e5 2. Ke3").unwrap_err(),
            PgnError::IllegalMove { ply: 2, san: "Ke3".into() }
        );
        assert!(matches!(
            parse_pgn("[FEN \"not a fen\"]\n1. e4").unwrap_err(),
            PgnError::InvalidFen(_)
        ));
    }

    #[test]
    fn test_promotion_without_equals_sign() {
        let pgn = "1. e4 d5 2. exd5 c6 3. dxc6 Nf6 4. cxb7 Nbd7 5. bxa8Q *";
        let game = parse_pgn(pgn).unwrap();
        let promo = &game.moves[8];
        assert_eq!(promo.san, "bxa8=Q");
        assert_eq!(promo.uci, "b7a8q");
    }

    #[test]
    fn test_only_first_game_is_read() {
        let pgn = "[White \"A\"]\n\n1. e4 e5 1-0\n\n[White \"B\"]\n\n1. d4 d5 0-1";
        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5"]);
        assert_eq!(game.metadata.white, "A");
        assert_eq!(game.metadata.result, "*");
    }

    #[test]
    fn test_unreadable_token_is_rejected() {
        let pgn = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. o-o *";
        assert_eq!(
            parse_pgn(pgn).unwrap_err(),
            PgnError::InvalidSan { ply: 6, san: "o-o".into() }
        );
    }

    #[test]
    fn test_move_numbers_and_annotations() {
        let pgn = "[Event \"x ] y\"]\n1.e4!? e5?! 2.Nf3!! $14 Nc6 3.Bb5 3...a6? *";
        let game = parse_pgn(pgn).unwrap();
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]);
        assert_eq!(game.metadata.event.as_deref(), Some("x ] y"));
    }
}
