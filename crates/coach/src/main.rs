//! PGN Coach
//!
//! Replays a PGN game in the terminal, asks a local UCI engine to evaluate
//! each position and prints beginner coaching for every move.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pgn_coach::chess_core::Side;
use pgn_coach::config::CoachConfig;
use pgn_coach::render::Screen;
use pgn_coach::{Controller, Effect, EngineGateway, EngineLine};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a PGN game with engine coaching", long_about = None)]
struct Args {
    /// PGN file to load (pasted on stdin, ended by a lone ".", when omitted)
    pgn: Option<PathBuf>,

    /// Side whose moves are coached: white or black
    #[arg(long)]
    side: Option<Side>,

    /// Path to the UCI engine binary (overrides STOCKFISH_PATH)
    #[arg(long)]
    engine: Option<String>,

    /// Search depth per position (overrides SEARCH_DEPTH)
    #[arg(long)]
    depth: Option<u32>,

    /// Step through the whole game without prompting
    #[arg(long)]
    auto: bool,

    /// Print every effect as a JSON line instead of drawing the board
    #[arg(long)]
    json: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Next,
    Prev,
    Side(Side),
    Load(Option<PathBuf>),
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(input: &str) -> Option<Command> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let (word, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let command = match word.to_ascii_lowercase().as_str() {
            "n" | "next" => Command::Next,
            "p" | "prev" => Command::Prev,
            "w" | "white" => Command::Side(Side::White),
            "b" | "black" => Command::Side(Side::Black),
            "load" => {
                let rest = rest.trim();
                Command::Load((!rest.is_empty()).then(|| PathBuf::from(rest)))
            }
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(input.to_string()),
        };
        Some(command)
    }
}

const HELP: &str = "commands: n/next, p/prev, w/white, b/black, load [file], help, q/quit";

enum Event {
    Engine(Option<EngineLine>),
    Input(Option<String>),
}

struct Session {
    controller: Controller,
    screen: Screen,
    gateway: EngineGateway,
    json: bool,
}

impl Session {
    /// Run effects: engine requests go to the gateway, the rest to the screen.
    async fn dispatch(&mut self, effects: Vec<Effect>) -> anyhow::Result<()> {
        let mut redraw = false;
        for effect in &effects {
            if self.json {
                println!("{}", serde_json::to_string(effect)?);
            }
            match effect {
                Effect::Evaluate { fen, tag } => {
                    self.gateway.evaluate(fen, *tag).await;
                }
                Effect::PromptPlayerChoice { white, black } if !self.json => {
                    println!(
                        "Whose moves should be analyzed? Type 'white' ({}) or 'black' ({}).",
                        display_name(white, Side::White),
                        display_name(black, Side::Black)
                    );
                }
                other => redraw |= self.screen.apply(other),
            }
        }
        if redraw && !self.json {
            println!("{}", self.screen.draw());
        }
        Ok(())
    }

    /// Feed engine lines to the controller until the current cycle is done.
    async fn wait_idle(&mut self, lines: &mut mpsc::UnboundedReceiver<EngineLine>) -> anyhow::Result<()> {
        while !self.controller.is_idle() && self.gateway.is_ready() {
            let Some(line) = lines.recv().await else {
                warn!("Engine output closed mid-search");
                break;
            };
            let effects = self.controller.on_engine_line(&line);
            self.dispatch(effects).await?;
        }
        Ok(())
    }
}

fn display_name(name: &str, side: Side) -> &str {
    if name.is_empty() { side.name() } else { name }
}

/// Read pasted PGN up to a line holding only "." (or end of input).
async fn read_pgn_block<R>(lines: &mut Lines<R>) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut pgn = String::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "." {
            break;
        }
        pgn.push_str(&line);
        pgn.push('\n');
    }
    Ok(pgn)
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the board or JSON stream
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = CoachConfig::load()?.with_overrides(args.engine.clone(), args.depth)?;

    let (lines_tx, mut lines_rx) = mpsc::unbounded_channel();
    let gateway = EngineGateway::spawn(&config.engine, lines_tx).await;
    if !gateway.is_ready() {
        eprintln!(
            "warning: engine '{}' is unavailable, replaying without evaluation",
            config.engine.path
        );
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let pgn = match &args.pgn {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            if !args.json {
                println!("Paste PGN, then a line with a single '.':");
            }
            read_pgn_block(&mut stdin).await?
        }
    };

    let mut session = Session {
        controller: Controller::new(),
        screen: Screen::default(),
        gateway,
        json: args.json,
    };

    let effects = session.controller.load_pgn(&pgn);
    session.dispatch(effects).await?;
    if session.controller.replay().is_none() {
        anyhow::bail!("No game loaded");
    }
    if let Some(side) = args.side {
        let effects = session.controller.choose_side(side);
        session.dispatch(effects).await?;
    }

    if args.auto {
        while !session.controller.at_end() {
            let effects = session.controller.next_move();
            session.dispatch(effects).await?;
            session.wait_idle(&mut lines_rx).await?;
        }
        let effects = session.controller.next_move();
        session.dispatch(effects).await?;
    } else {
        run_interactive(&mut session, &mut stdin, &mut lines_rx).await?;
    }

    info!("Shutting down engine");
    session.gateway.quit().await;
    Ok(())
}

async fn run_interactive<R>(
    session: &mut Session,
    stdin: &mut Lines<R>,
    lines_rx: &mut mpsc::UnboundedReceiver<EngineLine>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    if !session.json {
        println!("{HELP}");
        prompt();
    }
    let mut engine_open = true;

    loop {
        let event = tokio::select! {
            line = lines_rx.recv(), if engine_open => Event::Engine(line),
            input = stdin.next_line() => Event::Input(input?),
        };

        let effects = match event {
            Event::Engine(Some(line)) => session.controller.on_engine_line(&line),
            Event::Engine(None) => {
                engine_open = false;
                continue;
            }
            Event::Input(None) => break,
            Event::Input(Some(input)) => match Command::parse(&input) {
                None => Vec::new(),
                Some(Command::Quit) => break,
                Some(Command::Next) => session.controller.next_move(),
                Some(Command::Prev) => session.controller.prev_move(),
                Some(Command::Side(side)) => session.controller.choose_side(side),
                Some(Command::Load(Some(path))) => match tokio::fs::read_to_string(&path).await {
                    Ok(pgn) => session.controller.load_pgn(&pgn),
                    Err(e) => {
                        println!("Could not read {}: {e}", path.display());
                        Vec::new()
                    }
                },
                Some(Command::Load(None)) => {
                    println!("Paste PGN, then a line with a single '.':");
                    let pgn = read_pgn_block(stdin).await?;
                    session.controller.load_pgn(&pgn)
                }
                Some(Command::Help) => {
                    println!("{HELP}");
                    Vec::new()
                }
                Some(Command::Unknown(input)) => {
                    println!("Unknown command '{input}'. {HELP}");
                    Vec::new()
                }
            },
        };

        let printed = !effects.is_empty();
        session.dispatch(effects).await?;
        if printed && !session.json {
            prompt();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("n"), Some(Command::Next));
        assert_eq!(Command::parse("  PREV "), Some(Command::Prev));
        assert_eq!(Command::parse("black"), Some(Command::Side(Side::Black)));
        assert_eq!(
            Command::parse("load games/lost.pgn"),
            Some(Command::Load(Some(PathBuf::from("games/lost.pgn"))))
        );
        assert_eq!(Command::parse("load"), Some(Command::Load(None)));
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("castle"), Some(Command::Unknown("castle".into())));
    }

    #[tokio::test]
    async fn test_read_pgn_block_stops_at_dot() {
        let input: &[u8] = b"[White \"A\"]\n1. e4 e5\n.\nnext\n";
        let mut lines = BufReader::new(input).lines();
        let pgn = read_pgn_block(&mut lines).await.unwrap();
        assert_eq!(pgn, "[White \"A\"]\n1. e4 e5\n");
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("next"));
    }
}
