#![allow(dead_code)]

use pgn_coach::advice::CoachMessage;
use pgn_coach::{Controller, Effect, EngineLine, RequestTag};

/// Short miniature with headers, comments and a clock annotation, as exported
/// by online sites.
pub const MINIATURE: &str = r#"[Event "Casual game"]
[White "Alice"]
[Black "Bob"]
[Result "1-0"]

1. e4 { [%clk 0:10:00] } e5 2. Bc4 Nc6 3. Qh5 Nf6?? 4. Qxf7# 1-0"#;

/// Tag of the first engine request in a batch of effects.
pub fn evaluate_tag(effects: &[Effect]) -> Option<RequestTag> {
    effects.iter().find_map(|e| match e {
        Effect::Evaluate { tag, .. } => Some(*tag),
        _ => None,
    })
}

/// Last coaching message in a batch of effects.
pub fn last_message(effects: &[Effect]) -> Option<&CoachMessage> {
    effects.iter().rev().find_map(|e| match e {
        Effect::Coach { message } => Some(message),
        _ => None,
    })
}

/// Answer one engine request with a score line and a bestmove line.
pub fn reply(controller: &mut Controller, tag: RequestTag, score: &str, best: &str) -> Vec<Effect> {
    let mut effects = controller.on_engine_line(&EngineLine {
        tag: Some(tag),
        text: format!("info depth 14 seldepth 20 multipv 1 {score} nodes 52000 pv {best}"),
    });
    effects.extend(controller.on_engine_line(&EngineLine {
        tag: Some(tag),
        text: format!("bestmove {best}"),
    }));
    effects
}
