//! Evaluation bar reading

use serde::Serialize;

/// Bar saturation value for a forced mate
pub const MATE_SCORE: f64 = 10.0;

/// The bar only moves within +/- this many pawns
const BAR_LIMIT: f64 = 5.0;

/// Evaluation shown on the bar, always from White's side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalDisplay {
    Pawns { score: f64 },
    Mate { moves: u32, white_wins: bool },
}

impl EvalDisplay {
    pub fn pawns(score: f64) -> Self {
        EvalDisplay::Pawns { score }
    }

    pub fn score(&self) -> f64 {
        match *self {
            EvalDisplay::Pawns { score } => score,
            EvalDisplay::Mate { white_wins: true, .. } => MATE_SCORE,
            EvalDisplay::Mate { white_wins: false, .. } => -MATE_SCORE,
        }
    }

    /// Height of White's share of the bar: 0 = Black +5, 50 = equal, 100 = White +5.
    pub fn fill_percent(&self) -> f64 {
        let clamped = self.score().clamp(-BAR_LIMIT, BAR_LIMIT);
        (clamped + BAR_LIMIT) / (2.0 * BAR_LIMIT) * 100.0
    }

    pub fn label(&self) -> String {
        match *self {
            EvalDisplay::Pawns { score } if score > 0.0 => format!("+{score:.1}"),
            EvalDisplay::Pawns { score } => format!("{score:.1}"),
            EvalDisplay::Mate { moves, white_wins: true } => format!("M{moves}"),
            EvalDisplay::Mate { moves, white_wins: false } => format!("-M{moves}"),
        }
    }
}
