//! Typed view of the UCI lines the engine prints.

/// The engine output the coach cares about. Everything else is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineReply {
    /// Centipawn score from the side to move's point of view
    ScoreCentipawns(i32),
    /// Mate in N (positive = side to move mates, 0 = side to move is mated)
    ScoreMate(i32),
    /// End of a search; `None` for `bestmove (none)` or an unreadable move
    BestMove(Option<String>),
    Unknown,
}

pub fn parse_line(line: &str) -> EngineReply {
    let trimmed = line.trim();

    if trimmed.starts_with("bestmove") {
        let best = trimmed
            .split_whitespace()
            .nth(1)
            .filter(|mv| is_coordinate_move(mv))
            .map(String::from);
        return EngineReply::BestMove(best);
    }

    if !trimmed.starts_with("info") {
        return EngineReply::Unknown;
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    // "info string ..." is free text and may contain anything
    if parts.get(1) == Some(&"string") {
        return EngineReply::Unknown;
    }

    for window in parts.windows(3) {
        if window[0] != "score" {
            continue;
        }
        match (window[1], window[2].parse::<i32>()) {
            ("cp", Ok(cp)) => return EngineReply::ScoreCentipawns(cp),
            ("mate", Ok(mate)) => return EngineReply::ScoreMate(mate),
            _ => {}
        }
    }

    EngineReply::Unknown
}

/// `e2e4` or `e7e8q`
fn is_coordinate_move(mv: &str) -> bool {
    let b = mv.as_bytes();
    let square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && matches!(b[4], b'q' | b'r' | b'b' | b'n'),
        _ => false,
    }
}
