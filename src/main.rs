use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod conversation;
mod handler;
mod tui;
mod ui;

use api::ApiClient;
use app::App;

#[derive(Parser)]
#[command(name = "partsbot")]
#[command(about = "Terminal chat client for the PartSelect customer-support agent")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides PARTSBOT_API_URL and the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// Your question for the agent
        message: String,
        /// Let the agent browse for fresh information
        #[arg(short, long)]
        browse: bool,
    },
    /// Ask the backend to clear the session memory
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let api = ApiClient::new(&config::resolve_base_url(cli.url));

    match cli.command {
        Some(Commands::Ask { message, browse }) => {
            // Blank input sends nothing, same as the TUI
            if message.trim().is_empty() {
                return Ok(());
            }
            let reply = api.send_message(&message, browse).await;
            println!("{}", reply.content);
        }
        Some(Commands::Reset) => {
            api.reset_session().await;
            println!("Session reset requested.");
        }
        None => run_tui(api).await?,
    }

    Ok(())
}

async fn run_tui(api: ApiClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = tui::EventHandler::new();
    let (replies_tx, mut replies) = mpsc::unbounded_channel();
    let mut app = App::new(api, replies_tx);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        // Terminal events and finished exchanges feed the same loop;
        // replies apply in whatever order they arrive.
        tokio::select! {
            Some(event) = events.next() => {
                handler::handle_event(&mut app, event)?;
            }
            Some(reply) = replies.recv() => {
                app.apply_reply(reply);
            }
            else => break,
        }
    }

    tui::restore()?;
    Ok(())
}

/// Set up file-backed logging under the config dir. The TUI owns the
/// terminal, so nothing is ever written to stdout/stderr. Best-effort:
/// if the log file cannot be created the app runs without logging.
fn init_logging() {
    let Ok(dir) = config::Config::data_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("partsbot.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_env("PARTSBOT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}
