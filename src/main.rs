use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mystery_tree::config::Config;
use mystery_tree::game::GameSession;
use mystery_tree::models::RoundStatus;
use mystery_tree::{api, render, store};

#[derive(Parser)]
#[command(name = "mtree")]
#[command(about = "Guess the mystery species from its revealed lineage")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the game over HTTP
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,

        /// Tree document to play on
        #[arg(short, long)]
        tree: Option<PathBuf>,
    },
    /// Play a round in the terminal
    Play {
        /// Tree document to play on
        #[arg(short, long)]
        tree: Option<PathBuf>,

        /// Seed for reproducible target draws
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the whole tree
    Tree {
        /// Tree document to print
        #[arg(short, long)]
        tree: Option<PathBuf>,

        /// Print normalized nested JSON instead of ASCII art
        #[arg(long)]
        json: bool,
    },
    /// Validate a tree document
    Check {
        /// Tree document to validate
        #[arg(short, long)]
        tree: Option<PathBuf>,
    },
}

const SERVER_LOG_FILTER: &str = "mystery_tree=debug,tower_http=debug";
const PLAY_LOG_FILTER: &str = "mystery_tree=info";

/// Terminal play shares the screen with the game, so it stays at `info`.
fn default_log_filter(command: Option<&Commands>) -> &'static str {
    match command {
        Some(Commands::Play { .. }) => PLAY_LOG_FILTER,
        _ => SERVER_LOG_FILTER,
    }
}

/// Initialize tracing with output to stderr (for terminal commands) or stdout
fn init_tracing(use_stderr: bool, default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
    );

    if use_stderr {
        // Terminal mode: keep stdout for the game itself
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr, default_log_filter(cli.command.as_ref()));

    match cli.command {
        Some(Commands::Serve { port, tree }) => {
            serve(Config::from_env().with_overrides(tree, port)).await?;
        }
        Some(Commands::Play { tree, seed }) => {
            let config = Config::from_env().with_overrides(tree, None);
            let store = Arc::new(store::load_tree_file(&config.tree_path)?);
            let session = match seed {
                Some(seed) => GameSession::with_seed(store, seed),
                None => GameSession::new(store),
            };
            play(session)?;
        }
        Some(Commands::Tree { tree, json }) => {
            let config = Config::from_env().with_overrides(tree, None);
            let store = store::load_tree_file(&config.tree_path)?;
            let nested = store.to_nested();
            if json {
                println!("{}", serde_json::to_string_pretty(&nested)?);
            } else {
                print!("{}", render::render_forest(&nested));
            }
        }
        Some(Commands::Check { tree }) => {
            let config = Config::from_env().with_overrides(tree, None);
            let store = store::load_tree_file(&config.tree_path)?;
            println!("{}: ok", config.tree_path.display());
            println!("  nodes:   {}", store.len());
            println!("  species: {}", store.species().len());
            println!("  roots:   {}", store.roots().len());
        }
        None => {
            serve(Config::from_env()).await?;
        }
    }

    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = store::load_tree_file(&config.tree_path)?;
    let app = api::create_router(store, config.session_ttl);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("Mystery tree listening on http://{}", config.bind_addr());

    axum::serve(listener, app).await?;
    Ok(())
}

/// Interactive terminal round. Lines starting with `:` are commands.
fn play(mut session: GameSession) -> anyhow::Result<()> {
    let snapshot = session.start_round()?;
    println!("{}", snapshot.message);
    println!("(commands: :species, :restart, :quit)");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            ":quit" | ":q" => break,
            ":species" => {
                println!("{}", session.store().species_names().join(", "));
                continue;
            }
            ":restart" => {
                let snapshot = session.start_round()?;
                println!("{}", snapshot.message);
                continue;
            }
            guess => {
                // Rejections already set the status message shown below.
                let _ = session.submit_guess(guess);
            }
        }

        let snapshot = session.snapshot();
        print!("{}", render::render_disclosed(&snapshot));
        println!("{}", snapshot.message);

        if snapshot.status == RoundStatus::Won {
            println!("Type :restart to play again or :quit to leave.");
        }
    }

    Ok(())
}
