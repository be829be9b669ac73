use std::io::{self, BufRead, Write};

use chess_academy::config::AppConfig;
use chess_academy::engine::layouts;
use chess_academy::engine::notation::{parse_promotion, parse_square};
use chess_academy::engine::{ChessError, Game, MoveOutcome};

const HELP: &str = "\
commands:
  <from><to>[piece]   play a move, e.g. e2e4 or e7e8q
  moves <square>      list legal targets from a square
  promote <piece>     finish a pending promotion (q, r, b, n)
  undo                take back the last move
  reset [layout]      start over, optionally from a named layout
  fen [<fen>]         print the position, or load one
  show | status       print the board or the status
  layouts             list named layouts
  quit";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_academy=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let mut game = Game::with_layout(&config.default_layout)?;

    tracing::info!(
        "chess-academy v{} ready (layout {})",
        env!("CARGO_PKG_VERSION"),
        game.layout()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render(&mut out, &mut game, &config)?;
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        if !line.is_empty() {
            match execute(line, &mut game, &config, &mut out) {
                Ok(()) => {}
                Err(CommandError::Chess(e)) => writeln!(out, "error: {e}")?,
                Err(CommandError::Io(e)) => return Err(e.into()),
            }
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Chess(#[from] ChessError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn execute(
    line: &str,
    game: &mut Game,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };

    match cmd {
        "help" => writeln!(out, "{HELP}")?,
        "show" => render(out, game, config)?,
        "status" => writeln!(out, "{}", game.status())?,
        "layouts" => {
            for name in layouts::names() {
                writeln!(out, "{name}")?;
            }
        }
        "moves" => {
            let from = parse_square(arg)?;
            let targets: Vec<String> = game
                .legal_moves_from(from)
                .iter()
                .map(|m| m.to.to_algebraic())
                .collect();
            if config.show_legal_after_select {
                writeln!(out, "{from}: {}", targets.join(" "))?;
            } else {
                writeln!(out, "{from}: {} moves", targets.len())?;
            }
        }
        "promote" => {
            let kind = parse_promotion(arg)?;
            game.complete_promotion(kind)?;
            render(out, game, config)?;
        }
        "undo" => {
            if game.undo().is_some() {
                render(out, game, config)?;
            } else {
                writeln!(out, "nothing to undo")?;
            }
        }
        "reset" => {
            let layout = if arg.is_empty() {
                config.default_layout.as_str()
            } else {
                arg
            };
            game.reset_game(Some(layout))?;
            render(out, game, config)?;
        }
        "fen" if arg.is_empty() => writeln!(out, "{}", game.to_fen())?,
        "fen" => {
            game.reset_game_fen(arg)?;
            render(out, game, config)?;
        }
        _ => match game.apply_coordinate(line)? {
            MoveOutcome::PromotionRequired { square } => {
                writeln!(out, "promotion on {square}: choose q, r, b or n")?;
            }
            MoveOutcome::Committed(_) => render(out, game, config)?,
        },
    }
    Ok(())
}

fn render(out: &mut impl Write, game: &mut Game, config: &AppConfig) -> io::Result<()> {
    let snapshot = game.snapshot();
    if config.json_snapshots {
        let json = serde_json::to_string(&snapshot).map_err(io::Error::other)?;
        return writeln!(out, "{json}");
    }

    writeln!(out, "{}", game.state().board)?;
    if let Some(text) = &snapshot.last_move_text {
        writeln!(out, "last move: {text}")?;
    }
    writeln!(out, "{} to move ({})", snapshot.side_to_move, snapshot.status)
}
