//! Terminal rendering of controller effects: board, eval bar and coach panel.

use std::fmt::Write as _;

use chess_core::Side;

use crate::advice::{CoachMessage, Sentiment};
use crate::controller::Effect;
use crate::eval::EvalDisplay;

const BAR_CELLS: usize = 20;

/// What the page would show, rebuilt from effects
#[derive(Debug, Clone)]
pub struct Screen {
    fen: String,
    orientation: Side,
    last_move: Option<(String, String)>,
    suggested: Option<(String, String)>,
    white_name: String,
    black_name: String,
    coached: Option<Side>,
    eval: EvalDisplay,
    coach: Option<CoachMessage>,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
            orientation: Side::White,
            last_move: None,
            suggested: None,
            white_name: String::new(),
            black_name: String::new(),
            coached: None,
            eval: EvalDisplay::pawns(0.0),
            coach: None,
        }
    }
}

impl Screen {
    /// Apply one effect. Returns whether anything visible changed.
    pub fn apply(&mut self, effect: &Effect) -> bool {
        match effect {
            Effect::SetBoard { fen } => self.fen = fen.clone(),
            Effect::SetOrientation { side } => self.orientation = *side,
            Effect::PlayerLabels { white, black, coached } => {
                self.white_name = white.clone();
                self.black_name = black.clone();
                self.coached = *coached;
            }
            Effect::Coach { message } => self.coach = Some(message.clone()),
            Effect::EvalBar { display } => self.eval = *display,
            Effect::HighlightLastMove { from, to } => self.last_move = Some((from.clone(), to.clone())),
            Effect::ClearLastMove => self.last_move = None,
            Effect::HighlightSuggested { from, to } => self.suggested = Some((from.clone(), to.clone())),
            Effect::ClearSuggested => self.suggested = None,
            Effect::PromptPlayerChoice { .. } | Effect::Evaluate { .. } => return false,
        }
        true
    }

    pub fn draw(&self) -> String {
        let mut out = String::new();
        let (top, bottom) = match self.orientation {
            Side::White => (Side::Black, Side::White),
            Side::Black => (Side::White, Side::Black),
        };

        let _ = writeln!(out, "  {}", self.player_label(top));
        out.push_str(&self.draw_board());
        let _ = writeln!(out, "  {}", self.player_label(bottom));
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", eval_bar(&self.eval));
        if let Some(message) = &self.coach {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", coach_panel(message));
        }
        out
    }

    fn player_label(&self, side: Side) -> String {
        let name = match side {
            Side::White => &self.white_name,
            Side::Black => &self.black_name,
        };
        let name = if name.is_empty() { side.name() } else { name.as_str() };
        if self.coached == Some(side) {
            format!("{name} ({}, coached)", side.name())
        } else {
            format!("{name} ({})", side.name())
        }
    }

    fn draw_board(&self) -> String {
        let grid = parse_placement(&self.fen);
        let ranks: Vec<usize> = match self.orientation {
            Side::White => (0..8).rev().collect(),
            Side::Black => (0..8).collect(),
        };
        let files: Vec<usize> = match self.orientation {
            Side::White => (0..8).collect(),
            Side::Black => (0..8).rev().collect(),
        };

        let mut out = String::new();
        for &rank in &ranks {
            let _ = write!(out, "{} ", rank + 1);
            for &file in &files {
                let square = square_name(file, rank);
                let piece = grid[rank][file].unwrap_or('.');
                let cell = if self.is_highlighted(&self.suggested, &square) {
                    format!("[{piece}]")
                } else if self.is_highlighted(&self.last_move, &square) {
                    format!("({piece})")
                } else {
                    format!(" {piece} ")
                };
                out.push_str(&cell);
            }
            out.push('\n');
        }
        out.push_str("  ");
        for &file in &files {
            let _ = write!(out, " {} ", (b'a' + file as u8) as char);
        }
        out.push('\n');
        out
    }

    fn is_highlighted(&self, squares: &Option<(String, String)>, square: &str) -> bool {
        squares
            .as_ref()
            .is_some_and(|(from, to)| from == square || to == square)
    }
}

fn square_name(file: usize, rank: usize) -> String {
    format!("{}{}", (b'a' + file as u8) as char, rank + 1)
}

/// Piece grid indexed `[rank][file]` from the FEN placement field.
fn parse_placement(fen: &str) -> [[Option<char>; 8]; 8] {
    let mut grid = [[None; 8]; 8];
    let placement = fen.split_whitespace().next().unwrap_or_default();
    for (i, row) in placement.split('/').take(8).enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as usize;
            } else if file < 8 {
                grid[rank][file] = Some(c);
                file += 1;
            }
        }
    }
    grid
}

/// `[#########...........] +0.4`, White's share filled from the left.
pub fn eval_bar(display: &EvalDisplay) -> String {
    let filled = ((display.fill_percent() / 100.0) * BAR_CELLS as f64).round() as usize;
    let filled = filled.min(BAR_CELLS);
    format!(
        "[{}{}] {}",
        "#".repeat(filled),
        ".".repeat(BAR_CELLS - filled),
        display.label()
    )
}

pub fn coach_panel(message: &CoachMessage) -> String {
    let marker = match message.sentiment {
        Sentiment::Good => "+",
        Sentiment::Bad => "!",
        Sentiment::Neutral => "*",
    };
    format!("{marker} {}\n  {}", message.title, message.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_bar() {
        assert_eq!(eval_bar(&EvalDisplay::pawns(0.0)), "[##########..........] 0.0");
        assert_eq!(eval_bar(&EvalDisplay::pawns(9.0)), "[####################] +9.0");
        assert_eq!(
            eval_bar(&EvalDisplay::Mate { moves: 2, white_wins: false }),
            "[....................] -M2"
        );
    }

    #[test]
    fn test_parse_placement() {
        let grid = parse_placement("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(grid[0][4], Some('K'));
        assert_eq!(grid[3][4], Some('P'));
        assert_eq!(grid[1][4], None);
        assert_eq!(grid[7][0], Some('r'));
    }

    #[test]
    fn test_highlights_and_orientation() {
        let mut screen = Screen::default();
        screen.apply(&Effect::HighlightLastMove {
            from: "e2".into(),
            to: "e4".into(),
        });
        screen.apply(&Effect::HighlightSuggested {
            from: "d2".into(),
            to: "d4".into(),
        });
        let drawn = screen.draw();
        assert!(drawn.contains("[P]"));
        assert!(drawn.contains("(P)"));
        assert!(drawn.lines().nth(1).unwrap().starts_with("8 "));

        screen.apply(&Effect::SetOrientation { side: Side::Black });
        screen.apply(&Effect::ClearSuggested);
        let drawn = screen.draw();
        assert!(!drawn.contains("[P]"));
        assert!(drawn.contains("(P)"));
        assert!(drawn.lines().nth(1).unwrap().starts_with("1 "));
    }

    #[test]
    fn test_player_labels() {
        let mut screen = Screen::default();
        screen.apply(&Effect::PlayerLabels {
            white: "Alice".into(),
            black: String::new(),
            coached: Some(Side::White),
        });
        let drawn = screen.draw();
        assert!(drawn.contains("Alice (White, coached)"));
        assert!(drawn.contains("Black (Black)"));
    }

    #[test]
    fn test_prompt_is_not_drawn() {
        let mut screen = Screen::default();
        assert!(!screen.apply(&Effect::PromptPlayerChoice {
            white: "A".into(),
            black: "B".into()
        }));
        assert!(!screen.draw().contains("* "));
    }
}
