//! Hosts one of the bundled games.
//!
//! ```text
//! tabula-server --game tictactoe --bind 127.0.0.1:8000
//! tabula-server --game rps --rounds 5 --websocket --serve-forever
//! ```
//!
//! Type `exit` or press Ctrl-C to stop the server.

use std::io::BufRead;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tabula::prelude::*;
use tabula::rules::DEFAULT_ROUNDS;
use tabula::{DEFAULT_BIND_ADDR, TabulaServerBuilder};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Game {
    Tictactoe,
    Rps,
}

#[derive(Parser, Debug)]
#[command(name = "tabula-server")]
#[command(about = "Host a turn-based board game")]
struct Args {
    /// Game to host
    #[arg(short, long, value_enum, default_value = "tictactoe")]
    game: Game,

    /// Address to listen on
    #[arg(short, long, default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Rounds per Rock-Paper-Scissors match
    #[arg(long, default_value_t = DEFAULT_ROUNDS)]
    rounds: u32,

    /// Seconds a player may take per move; 0 waits forever
    #[arg(long, default_value = "300")]
    turn_timeout: u64,

    /// Keep hosting new games after one ends
    #[arg(long)]
    serve_forever: bool,

    /// Accept WebSocket clients instead of raw TCP
    #[arg(long)]
    websocket: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

impl Args {
    fn builder(&self) -> TabulaServerBuilder {
        let session = match self.turn_timeout {
            0 => SessionConfig::without_timeout(),
            secs => SessionConfig::default().with_turn_timeout(Duration::from_secs(secs)),
        };
        TabulaServer::builder()
            .bind(&self.bind)
            .session_config(session)
            .serve_forever(self.serve_forever)
    }
}

#[tokio::main]
async fn main() -> Result<(), TabulaError> {
    let args = Args::parse();
    tabula::init_logging(&args.log);

    match args.game {
        Game::Tictactoe => serve(TicTacToe, &args).await,
        Game::Rps => serve(RockPaperScissors::new(args.rounds), &args).await,
    }
}

async fn serve<G: GameRules + Clone>(rules: G, args: &Args) -> Result<(), TabulaError> {
    if args.websocket {
        let server = args.builder().build_websocket(rules).await?;
        if let Ok(addr) = server.local_addr() {
            tracing::info!(%addr, "accepting WebSocket players");
        }
        stop_on_request(server.shutdown_handle());
        server.run().await
    } else {
        let server = args.builder().build(rules).await?;
        if let Ok(addr) = server.local_addr() {
            tracing::info!(%addr, "accepting TCP players");
        }
        stop_on_request(server.shutdown_handle());
        server.run().await
    }
}

/// Triggers `shutdown` on an `exit` line from stdin or on Ctrl-C.
fn stop_on_request(shutdown: Shutdown) {
    // Blocking reads stay on a detached thread.
    let on_exit = shutdown.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("exit") {
                tracing::info!("exit requested, shutting down");
                on_exit.trigger();
                break;
            }
        }
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupted, shutting down");
                shutdown.trigger();
            }
            Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });
}
