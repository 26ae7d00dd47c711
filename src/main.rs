use anyhow::{Result, bail};
use clap::Parser;
use console::style;
use folio::activity::ActivityLog;
use folio::agent::Agent;
use folio::cli::{Cli, Command};
use folio::client::ReplayClient;
use folio::tool_collection::ToolCollection;
use folio::{Config, config};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Schema => {
            let tools = ToolCollection::new(".", &Config::default());
            println!("{}", serde_json::to_string_pretty(&tools.get_all_schemas())?);
        }
        Command::Replay {
            book,
            script,
            prompt,
            model,
            max_rounds,
        } => {
            let mut config = config::load_or_create()?;
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(max_rounds) = max_rounds {
                config.max_tool_rounds = max_rounds;
            }
            replay(&book, &script, &prompt, &config).await?;
        }
    }

    Ok(())
}

async fn replay(book: &Path, script: &Path, prompt: &str, config: &Config) -> Result<()> {
    if !book.is_dir() {
        bail!("Book directory {} does not exist", book.display());
    }

    let client = Arc::new(ReplayClient::from_file(script)?);
    let agent = Agent::new(client, book, config);
    let mut activity = ActivityLog::with_preview_chars(config.activity_preview_chars);

    println!("Model: {}", config.model);
    let reply = agent.run(prompt, &mut activity).await?;
    if reply.capped {
        eprintln!(
            "{}",
            style(format!(
                "Stopped after {} tool round(s); the response may be incomplete.",
                reply.tool_rounds
            ))
            .yellow()
        );
    }

    let summary = activity.summary_markdown();
    if !summary.is_empty() {
        println!("{}", style("Activity:").dim());
        println!("{}", style(summary).dim());
    }
    if let Some(path) = activity.last_edited_file() {
        println!("{} {}", style("Last edited:").dim(), path.display());
    }

    let text = reply.into_text()?;
    println!();
    println!("{text}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
