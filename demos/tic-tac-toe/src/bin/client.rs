//! Interactive terminal client.
//!
//! ```text
//! tabula-client --host 127.0.0.1 --port 8000
//! ```

use std::io::{BufRead, Write};

use clap::Parser;
use tabula::is_terminal_error;
use tabula::prelude::*;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "tabula-client")]
#[command(about = "Join a game on a Tabula server")]
struct Args {
    /// Server host address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log: String,
}

/// What the main loop does after a message has been shown.
enum Next {
    Wait,
    AskForMove,
    Stop,
}

#[tokio::main]
async fn main() -> Result<(), TabulaError> {
    let args = Args::parse();
    tabula::init_logging(&args.log);

    let addr = format!("{}:{}", args.host, args.port);
    let client = match GameClient::connect(&addr).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error connecting to server: {e}");
            return Err(e);
        }
    };
    println!("Connected to server at {addr}");

    let mut lines = stdin_lines();
    let mut me = None;

    loop {
        let msg = match client.recv().await {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                println!("Connection lost");
                break;
            }
            Err(e) => {
                println!("Error: {e}");
                break;
            }
        };

        match show(&msg, &mut me) {
            Next::Wait => {}
            Next::Stop => break,
            Next::AskForMove => match ask_for_move(&mut lines).await {
                Some(mv) => client.send_move(mv).await?,
                None => {
                    println!("\nDisconnecting...");
                    break;
                }
            },
        }
    }

    if let Err(e) = client.disconnect().await {
        tracing::debug!(error = %e, "disconnect failed");
    }
    Ok(())
}

/// Prints one server message the way a player wants to read it.
fn show(msg: &Message, me: &mut Option<PlayerId>) -> Next {
    let banner = "=".repeat(50);
    match msg {
        Message::Connected(ack) => {
            *me = Some(ack.player_id);
            println!("Connected! You are player {}", ack.player_id.index());
            println!("Game: {}", ack.game_name);
            println!(
                "Waiting for players... ({}/{})",
                ack.current_players, ack.max_players
            );
        }
        Message::GameStart(start) => {
            *me = Some(start.player_id);
            println!("\n{banner}");
            println!("Game Started: {}", start.game_name);
            println!("You are Player {}", start.player_id.index());
            println!("{banner}");
            if !start.help.is_empty() {
                println!("\n{}\n", start.help);
            }
        }
        Message::YourTurn(turn) => {
            print_board(&turn.board_display);
            println!("\n>>> It's YOUR turn! <<<");
            return Next::AskForMove;
        }
        Message::GameState(update) => {
            print_board(&update.board_display);
            if *me != Some(update.current_player) {
                println!(
                    "\nWaiting for Player {} to move...",
                    update.current_player.index()
                );
            }
        }
        Message::MoveAccepted(accepted) => {
            print_board(&accepted.board_display);
            println!("Move accepted!");
        }
        Message::MoveRejected { error } => {
            println!("Move rejected: {error}");
            println!("Please try again.");
            return Next::AskForMove;
        }
        Message::GameEnd(end) => {
            println!("\n{banner}");
            println!("GAME OVER");
            println!("{banner}");
            println!("{}", end.message);
            if end.draw {
                println!("It's a tie!");
            } else if end.won {
                println!("Congratulations! You won!");
            } else {
                println!("Better luck next time!");
            }
            println!("{banner}\n");
            return Next::Stop;
        }
        Message::Error { error } => {
            println!("Error: {error}");
            if is_terminal_error(msg) {
                return Next::Stop;
            }
        }
        Message::ServerMessage(notice) => {
            if !notice.message.is_empty() {
                println!("[SERVER] {}", notice.message);
            }
        }
        other => {
            tracing::warn!(kind = %other.kind(), "unexpected message from server");
            println!("Unknown message type: {}", other.kind());
        }
    }
    Next::Wait
}

fn print_board(board: &str) {
    if !board.is_empty() {
        println!("{board}");
    }
}

/// Prompts until the player types a move. `None` means they want out,
/// either by typing `exit` or by closing stdin.
async fn ask_for_move(lines: &mut mpsc::UnboundedReceiver<String>) -> Option<String> {
    loop {
        print!("Enter your move (or 'exit' to quit): ");
        if let Err(e) = std::io::stdout().flush() {
            tracing::debug!(error = %e, "stdout flush failed");
        }

        let line = lines.recv().await?;
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") {
            return None;
        }
        if !line.is_empty() {
            return Some(line.to_string());
        }
    }
}

/// Forwards stdin lines from a detached thread.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
