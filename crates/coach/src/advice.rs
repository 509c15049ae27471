/// Coaching heuristic — pure functions only
/// (No engine, board or terminal dependencies)

use chess_core::{MoveRecord, Side};
use serde::Serialize;

/// Eval loss (pawns) beyond which a move is a blunder
pub const BLUNDER_THRESHOLD: f64 = -2.0;
/// Eval loss (pawns) beyond which a move is a mistake
pub const MISTAKE_THRESHOLD: f64 = -0.8;
/// Eval gain (pawns) beyond which a move is great
pub const GREAT_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Neutral,
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoachMessage {
    pub title: String,
    pub body: String,
    pub sentiment: Sentiment,
}

impl CoachMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            sentiment,
        }
    }

    pub fn neutral(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, Sentiment::Neutral)
    }
}

/// The engine's preferred move in the position before the played move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedMove {
    pub uci: String,
    /// SAN form, when it could be resolved on the pre-move position
    pub san: Option<String>,
}

impl SuggestedMove {
    pub fn origin(&self) -> &str {
        self.uci.get(0..2).unwrap_or_default()
    }

    pub fn destination(&self) -> &str {
        self.uci.get(2..4).unwrap_or_default()
    }

    fn describe(&self) -> String {
        match &self.san {
            Some(san) => format!("{san} ({})", self.uci),
            None => self.uci.clone(),
        }
    }
}

pub struct AdviceInput<'a> {
    /// Evaluation after the move, White's side, pawns
    pub current: f64,
    /// Evaluation before the move, White's side, pawns
    pub previous: f64,
    pub played: &'a MoveRecord,
    pub suggestion: Option<&'a SuggestedMove>,
    pub first_move: bool,
}

/// Evaluation gained by the side that just moved.
pub fn mover_delta(current: f64, previous: f64, mover: Side) -> f64 {
    match mover {
        Side::White => current - previous,
        Side::Black => previous - current,
    }
}

pub fn advise(input: &AdviceInput<'_>) -> CoachMessage {
    let mover = input.played.side;
    let delta = mover_delta(input.current, input.previous, mover);
    let preferred = input
        .suggestion
        .map(SuggestedMove::describe)
        .unwrap_or_else(|| "something else".to_string());

    if input.first_move {
        CoachMessage::neutral(
            "Opening Phase",
            "Opening phase. Control the center and develop your pieces!",
        )
    } else if delta < BLUNDER_THRESHOLD {
        CoachMessage::new(
            "Blunder!",
            format!(
                "Ouch! {} just lost a major advantage. Evaluation dropped by {:.1}. The engine preferred {preferred}.",
                mover.name(),
                delta.abs()
            ),
            Sentiment::Bad,
        )
    } else if delta < MISTAKE_THRESHOLD {
        CoachMessage::new(
            "Mistake",
            format!("Not the best move. It gave away some positioning. The engine preferred {preferred}."),
            Sentiment::Bad,
        )
    } else if delta > GREAT_THRESHOLD {
        CoachMessage::new(
            "Great Move!",
            format!("Excellent find by {}! You improved your position significantly.", mover.name()),
            Sentiment::Good,
        )
    } else if input
        .suggestion
        .is_some_and(|s| s.destination() == input.played.to)
    {
        CoachMessage::new("Best Move", "You found the top engine move! Keep it up.", Sentiment::Good)
    } else {
        CoachMessage::neutral(
            "Solid Move",
            format!("The position is stable. Evaluation is {:.1}.", input.current),
        )
    }
}
