//! Game controller — replay state plus the engine reply interpreter.
//!
//! Every operation mutates the controller and returns the effects the host
//! should apply (board updates, coaching text, engine requests). Nothing here
//! touches the engine or the terminal.

use chess_core::{MoveRecord, Replay, Side};
use serde::Serialize;
use tracing::{debug, info};

use crate::advice::{self, AdviceInput, CoachMessage, Sentiment, SuggestedMove};
use crate::eval::{EvalDisplay, MATE_SCORE};
use crate::gateway::{EngineLine, RequestPurpose, RequestTag};
use crate::uci::{self, EngineReply};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    SetBoard { fen: String },
    SetOrientation { side: Side },
    PlayerLabels { white: String, black: String, coached: Option<Side> },
    PromptPlayerChoice { white: String, black: String },
    Coach { message: CoachMessage },
    EvalBar { display: EvalDisplay },
    HighlightLastMove { from: String, to: String },
    ClearLastMove,
    HighlightSuggested { from: String, to: String },
    ClearSuggested,
    Evaluate { fen: String, tag: RequestTag },
}

impl Effect {
    fn coach(title: &str, body: impl Into<String>, sentiment: Sentiment) -> Self {
        Effect::Coach {
            message: CoachMessage::new(title, body, sentiment),
        }
    }
}

/// The request the controller is waiting on
#[derive(Debug, Clone)]
struct Pending {
    tag: RequestTag,
    /// Side to move in the evaluated position
    turn: Side,
    /// Ply being judged; `None` for rewinds
    ply: Option<usize>,
    /// Whether the judged ply belongs to the coached side
    coached: bool,
    /// Latest score seen during this cycle, White's side
    score: Option<EvalDisplay>,
    /// Carried from the pre-move cycle into the post-move one
    suggestion: Option<SuggestedMove>,
}

#[derive(Debug, Default)]
pub struct Controller {
    replay: Option<Replay>,
    current_eval: f64,
    prev_eval: f64,
    coached: Option<Side>,
    next_seq: u64,
    pending: Option<Pending>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replay(&self) -> Option<&Replay> {
        self.replay.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.replay.as_ref().map_or(0, Replay::cursor)
    }

    /// `(previous, current)` evaluation, White's side
    pub fn evaluation(&self) -> (f64, f64) {
        (self.prev_eval, self.current_eval)
    }

    pub fn coached_side(&self) -> Option<Side> {
        self.coached
    }

    /// No engine reply is outstanding.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    pub fn at_end(&self) -> bool {
        self.replay.as_ref().map_or(true, Replay::at_end)
    }

    // --- Game controls ---

    pub fn load_pgn(&mut self, pgn: &str) -> Vec<Effect> {
        let replay = match Replay::load(pgn) {
            Ok(replay) => replay,
            Err(e) => {
                info!(error = %e, "Rejected PGN");
                return vec![Effect::coach(
                    "Error",
                    format!("That PGN looks invalid ({e}). Please check the text and try again."),
                    Sentiment::Bad,
                )];
            }
        };

        let white = replay.metadata().white.clone();
        let black = replay.metadata().black.clone();
        info!(moves = replay.len(), %white, %black, "Game loaded");

        let start_fen = replay.fen();
        self.replay = Some(replay);
        self.current_eval = 0.0;
        self.prev_eval = 0.0;
        self.coached = None;
        self.pending = None;

        vec![
            Effect::SetBoard { fen: start_fen },
            Effect::SetOrientation { side: Side::White },
            Effect::coach(
                "Game Loaded",
                "Choose which player's moves to analyze (white or black), then step forward with next.",
                Sentiment::Neutral,
            ),
            Effect::EvalBar {
                display: EvalDisplay::pawns(0.0),
            },
            Effect::ClearSuggested,
            Effect::ClearLastMove,
            Effect::PlayerLabels {
                white: white.clone(),
                black: black.clone(),
                coached: None,
            },
            Effect::PromptPlayerChoice { white, black },
        ]
    }

    pub fn choose_side(&mut self, side: Side) -> Vec<Effect> {
        let Some(replay) = &self.replay else {
            return vec![no_game()];
        };
        if let Some(current) = self.coached {
            return vec![Effect::coach(
                "Already Chosen",
                format!("Analyzing {}'s moves. Load the game again to switch sides.", current.name()),
                Sentiment::Neutral,
            )];
        }

        self.coached = Some(side);
        let meta = replay.metadata();
        vec![
            Effect::SetOrientation { side },
            Effect::PlayerLabels {
                white: meta.white.clone(),
                black: meta.black.clone(),
                coached: Some(side),
            },
            Effect::coach(
                "Ready",
                format!("Analyzing {}'s moves. Step forward with next to start.", side.name()),
                Sentiment::Neutral,
            ),
        ]
    }

    pub fn next_move(&mut self) -> Vec<Effect> {
        let Some(replay) = self.replay.as_mut() else {
            return vec![no_game()];
        };

        let mut effects = vec![Effect::ClearSuggested];
        if replay.at_end() {
            effects.push(Effect::coach("End of Game", "That's all the moves! How did you do?", Sentiment::Good));
            return effects;
        }

        let fen_before = replay.fen();
        let Some(mv) = replay.step_forward().cloned() else {
            return effects;
        };
        let fen_after = replay.fen();
        let turn_before = mv.side;
        let turn_after = replay.turn();
        let coached = self.coached.map_or(true, |side| side == mv.side);

        effects.push(Effect::SetBoard { fen: fen_after.clone() });
        effects.push(Effect::HighlightLastMove {
            from: mv.from.clone(),
            to: mv.to.clone(),
        });

        if coached {
            effects.push(Effect::coach("Thinking...", "Finding the best move for you...", Sentiment::Neutral));
            effects.push(self.request(RequestPurpose::PreMoveAdvice, fen_before, turn_before, Some(mv.ply), true, None));
        } else {
            effects.push(Effect::coach("Thinking...", "Calculating the best moves...", Sentiment::Neutral));
            effects.push(self.request(RequestPurpose::PostMoveAdvice, fen_after, turn_after, Some(mv.ply), false, None));
        }
        effects
    }

    pub fn prev_move(&mut self) -> Vec<Effect> {
        let Some(replay) = self.replay.as_mut() else {
            return Vec::new();
        };
        if replay.step_back().is_none() {
            return Vec::new();
        }

        self.pending = None;
        let mut effects = vec![Effect::ClearSuggested, Effect::SetBoard { fen: replay.fen() }];
        match replay.last_move() {
            Some(last) => effects.push(Effect::HighlightLastMove {
                from: last.from.clone(),
                to: last.to.clone(),
            }),
            None => effects.push(Effect::ClearLastMove),
        }
        effects.push(Effect::coach(
            "Rewind",
            "Let's take a look at the previous position.",
            Sentiment::Neutral,
        ));

        let fen = replay.fen();
        let turn = replay.turn();
        effects.push(self.request(RequestPurpose::Rewind, fen, turn, None, false, None));
        effects
    }

    fn request(
        &mut self,
        purpose: RequestPurpose,
        fen: String,
        turn: Side,
        ply: Option<usize>,
        coached: bool,
        suggestion: Option<SuggestedMove>,
    ) -> Effect {
        self.next_seq += 1;
        let tag = RequestTag {
            seq: self.next_seq,
            purpose,
        };
        self.pending = Some(Pending {
            tag,
            turn,
            ply,
            coached,
            score: None,
            suggestion,
        });
        Effect::Evaluate { fen, tag }
    }

    // --- Engine translation & coaching ---

    pub fn on_engine_line(&mut self, line: &EngineLine) -> Vec<Effect> {
        let Some(tag) = line.tag else {
            return Vec::new();
        };
        match &self.pending {
            Some(pending) if pending.tag == tag => {}
            _ => {
                debug!(seq = tag.seq, "Ignoring stale engine line");
                return Vec::new();
            }
        }

        match uci::parse_line(&line.text) {
            EngineReply::ScoreCentipawns(cp) => self.on_centipawns(cp),
            EngineReply::ScoreMate(mate) => self.on_mate(mate),
            EngineReply::BestMove(best) => self.on_best_move(best),
            EngineReply::Unknown => Vec::new(),
        }
    }

    fn on_centipawns(&mut self, cp: i32) -> Vec<Effect> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };

        let pawns = f64::from(cp) / 100.0;
        let white_pov = match pending.turn {
            Side::White => pawns,
            Side::Black => -pawns,
        };
        let display = EvalDisplay::pawns(white_pov);
        pending.score = Some(display);

        if pending.tag.purpose == RequestPurpose::PreMoveAdvice {
            return Vec::new();
        }
        self.current_eval = white_pov;
        vec![Effect::EvalBar { display }]
    }

    fn on_mate(&mut self, mate: i32) -> Vec<Effect> {
        let Some(pending) = self.pending.as_mut() else {
            return Vec::new();
        };

        // mate 0: the side to move is already mated
        let white_wins = if mate > 0 {
            pending.turn == Side::White
        } else {
            pending.turn == Side::Black
        };
        let display = EvalDisplay::Mate {
            moves: mate.unsigned_abs(),
            white_wins,
        };
        let previous = pending.score.replace(display);

        if pending.tag.purpose == RequestPurpose::PreMoveAdvice {
            return Vec::new();
        }

        self.current_eval = if white_wins { MATE_SCORE } else { -MATE_SCORE };
        let mut effects = vec![Effect::EvalBar { display }];
        if previous != Some(display) {
            let winner = if white_wins { Side::White } else { Side::Black };
            let sentiment = match self.perspective() {
                Some(side) if side == winner => Sentiment::Good,
                Some(_) => Sentiment::Bad,
                None => Sentiment::Neutral,
            };
            let body = if mate == 0 {
                format!("Checkmate on the board. {} wins!", winner.name())
            } else {
                format!("Forced mate in {} moves detected for {}!", mate.unsigned_abs(), winner.name())
            };
            effects.push(Effect::Coach {
                message: CoachMessage::new("Checkmate!", body, sentiment),
            });
        }
        effects
    }

    /// Whose interests the coaching text speaks for: the coached side, else
    /// the side that made the move being judged.
    fn perspective(&self) -> Option<Side> {
        self.coached.or_else(|| {
            let replay = self.replay.as_ref()?;
            match self.pending.as_ref().and_then(|p| p.ply) {
                Some(ply) => replay.moves().get(ply).map(|m| m.side),
                None => replay.last_move().map(|m| m.side),
            }
        })
    }

    fn on_best_move(&mut self, best: Option<String>) -> Vec<Effect> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };

        match pending.tag.purpose {
            RequestPurpose::PreMoveAdvice => self.finish_pre_move(pending, best),
            RequestPurpose::PostMoveAdvice => self.finish_post_move(pending),
            RequestPurpose::Rewind => {
                self.prev_eval = self.current_eval;
                Vec::new()
            }
        }
    }

    fn finish_pre_move(&mut self, pending: Pending, best: Option<String>) -> Vec<Effect> {
        let Some(replay) = self.replay.as_ref() else {
            return Vec::new();
        };
        let Some(ply) = pending.ply else {
            return Vec::new();
        };

        self.prev_eval = pending.score.map_or(self.current_eval, |s| s.score());

        let suggestion = best.map(|uci| SuggestedMove {
            san: replay.uci_to_san_at(ply, &uci),
            uci,
        });

        let mut effects = Vec::new();
        if let Some(s) = &suggestion {
            effects.push(Effect::HighlightSuggested {
                from: s.origin().to_string(),
                to: s.destination().to_string(),
            });
        }
        effects.push(Effect::coach("Thinking...", "Calculating evaluation...", Sentiment::Neutral));

        let fen = replay.fen();
        let turn = replay.turn();
        effects.push(self.request(RequestPurpose::PostMoveAdvice, fen, turn, Some(ply), true, suggestion));
        effects
    }

    fn finish_post_move(&mut self, pending: Pending) -> Vec<Effect> {
        let ended_in_mate = matches!(pending.score, Some(EvalDisplay::Mate { .. }));
        let played: Option<MoveRecord> = self
            .replay
            .as_ref()
            .zip(pending.ply)
            .and_then(|(replay, ply)| replay.moves().get(ply).cloned());

        let effects = match played {
            _ if ended_in_mate => Vec::new(),
            Some(mv) if pending.coached => {
                let message = advice::advise(&AdviceInput {
                    current: self.current_eval,
                    previous: self.prev_eval,
                    played: &mv,
                    suggestion: pending.suggestion.as_ref(),
                    first_move: mv.ply == 0,
                });
                debug!(ply = mv.ply, title = %message.title, "Advice");
                vec![Effect::Coach { message }]
            }
            Some(_) => {
                let next = self
                    .coached
                    .map_or_else(|| "the next".to_string(), |side| format!("{}'s next", side.name()));
                vec![
                    Effect::ClearSuggested,
                    Effect::coach(
                        "Opponent's Move",
                        format!(
                            "Evaluation is {:.1}. Step forward to see {next} move.",
                            self.current_eval
                        ),
                        Sentiment::Neutral,
                    ),
                ]
            }
            None => Vec::new(),
        };

        self.prev_eval = self.current_eval;
        effects
    }
}

fn no_game() -> Effect {
    Effect::coach("No Game", "Load a PGN first.", Sentiment::Neutral)
}
