//! Line-oriented search client.
//!
//! Run the dispatcher first (`cargo run -p server -- serve`), then type a
//! query per line. Panels print as they stand once the interaction
//! finishes; `!reset` clears the session, EOF quits.

mod orchestrator;
mod pool;
mod transport;

use orchestrator::Orchestrator;
use transport::{DispatcherTransport, PanelTransport};

use query::QueryType;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let strategy = config::create_strategy()?;
    let socket_path = config::socket_path(&strategy);

    println!("connecting to {:?}", socket_path);
    let transport = DispatcherTransport::connect(&socket_path).await?;
    match transport.ping().await {
        Ok(pong) => println!("connected: {pong}"),
        Err(e) => {
            eprintln!("connection failed: {e}");
            eprintln!("start the dispatcher with: cargo run -p server -- serve");
            return Ok(());
        }
    }

    let mut orchestrator = Orchestrator::new(vec![
        QueryType::Hits,
        QueryType::Words,
        QueryType::Facets,
    ]);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "!reset" {
            transport.reset().await?;
            orchestrator.reset();
            println!("session cleared");
            continue;
        }

        orchestrator.interact(&transport, input).await;

        let state = orchestrator.state();
        for (key, panel) in &state.panels {
            println!("== {key}: {}", panel.title);
            if !panel.body.is_empty() {
                print!("{}", panel.body);
            }
        }
        if let Some(error) = &state.error {
            println!("!! {error}");
        }
        println!(
            "-- backend {:.1} ms, {} bytes, token: {}",
            state.backend_ms,
            state.bytes_transferred,
            orchestrator.history_token()
        );
    }

    Ok(())
}
