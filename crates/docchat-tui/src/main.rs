use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use docchat_core::{
    context, Config, ConversationController, FileStore, MessageStore, OpenRouterClient, Sender,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::AppEvent;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Chat with a hosted model, optionally grounded in a local document")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
        /// File whose text is attached as context
        #[arg(short, long)]
        context: Option<PathBuf>,
        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Some(Commands::Ask {
            question,
            context,
            model,
        }) => ask_once(&config, &question, context.as_deref(), model.as_deref()).await,
        None => run_tui(&config).await,
    }
}

fn build_controller(config: &Config, model_override: Option<&str>) -> Result<ConversationController> {
    let api_key = config.resolve_api_key().ok_or_else(|| {
        anyhow!(
            "No API key configured. Set {} or add \"api_key\" to the docchat config file.",
            docchat_core::config::API_KEY_ENV
        )
    })?;

    let model = model_override.unwrap_or_else(|| config.model());
    let client = OpenRouterClient::new(&api_key, config.endpoint(), model);

    let store = MessageStore::new(Box::new(FileStore::open_default()?));
    Ok(ConversationController::new(store, Arc::new(client)))
}

async fn ask_once(
    config: &Config,
    question: &str,
    context_path: Option<&std::path::Path>,
    model: Option<&str>,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut controller = build_controller(config, model)?;

    if let Some(path) = context_path {
        let text = context::read_context_file(path)?;
        println!(
            "📄 Using {} ({} chars) as context\n",
            path.display().to_string().cyan(),
            text.chars().count().to_string().bold()
        );
        controller.set_context(text);
    }

    if !controller.ask(question).await {
        return Err(anyhow!("Question is empty"));
    }

    if let Some(reply) = controller
        .messages()
        .iter()
        .rev()
        .find(|m| m.sender == Sender::Bot)
    {
        println!("{}", "🤖 Bot:".yellow().bold());
        println!("{}", reply.text);
    }

    if let Some(err) = controller.last_error() {
        eprintln!("{} {}", "Request failed:".red().bold(), err);
    }

    Ok(())
}

async fn run_tui(config: &Config) -> Result<()> {
    let controller = build_controller(config, None)?;
    let mut app = App::new(controller);
    app.scroll_to_bottom();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(AppEvent::Key(key)) => handler::handle_key(&mut app, key),
            Some(AppEvent::Tick) => app.tick().await,
            Some(AppEvent::Resize(_, _)) => {}
            None => break,
        }
    }

    tui::restore()?;
    Ok(())
}
