/// Replay tests on full game exports: every ply must land on the position a
/// board would show, forward and back.

mod common;

use chess_core::{parse_pgn, uci_to_san_from_fen, Replay, Side};
use pretty_assertions::assert_eq;

use common::MINIATURE;

#[test]
fn test_miniature_headers_and_moves() {
    let game = parse_pgn(MINIATURE).unwrap();
    assert_eq!(game.metadata.white, "Alice");
    assert_eq!(game.metadata.black, "Bob");
    assert_eq!(game.metadata.result, "1-0");

    let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
    assert_eq!(sans, vec!["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"]);
    assert_eq!(game.moves[6].uci, "h5f7");
    assert_eq!(game.moves[6].side, Side::White);
}

#[test]
fn test_en_passant_and_promotion() {
    let pgn = "1. e4 a6 2. e5 d5 3. exd6 c6 4. dxe7 a5 5. exf8=Q+ Kxf8 *";
    let mut replay = Replay::load(pgn).unwrap();
    assert_eq!(replay.len(), 10);

    let ep = &replay.moves()[4];
    assert_eq!((ep.from.as_str(), ep.to.as_str()), ("e5", "d6"));
    let promo = &replay.moves()[8];
    assert_eq!(promo.uci, "e7f8q");
    assert_eq!(promo.san, "exf8=Q+");

    while replay.step_forward().is_some() {}
    assert!(replay.at_end());
    assert_eq!(
        replay.fen(),
        "rnbq1knr/1p3ppp/2p5/p7/8/8/PPPP1PPP/RNBQKBNR w KQ - 0 6"
    );

    while replay.step_back().is_some() {}
    assert_eq!(replay.cursor(), 0);
    assert!(replay.last_move().is_none());
}

#[test]
fn test_custom_start_position() {
    let pgn = r#"[SetUp "1"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 40"]

40... Kd7 41. e4 *"#;
    let mut replay = Replay::load(pgn).unwrap();
    assert_eq!(replay.turn(), Side::Black);
    assert_eq!(replay.moves()[0].side, Side::Black);
    replay.step_forward();
    replay.step_forward();
    assert_eq!(replay.fen(), "8/3k4/8/8/4P3/8/8/4K3 b - - 0 41");
}

#[test]
fn test_engine_moves_in_san() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
    assert_eq!(uci_to_san_from_fen(fen, "f1b5").as_deref(), Some("Bb5"));
    assert_eq!(uci_to_san_from_fen(fen, "e1g1"), None);
    assert_eq!(uci_to_san_from_fen(fen, "nonsense"), None);
}
