use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Surgical text edits for book projects, driven by a language model
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log every tool call and result
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one authoring request against a recorded response script
    Replay {
        /// Root directory of the book
        #[arg(long)]
        book: PathBuf,

        /// JSON array of model responses, played back in order
        #[arg(long)]
        script: PathBuf,

        /// The prompt sent as the first user message
        #[arg(long, default_value = "")]
        prompt: String,

        /// Override the configured model name
        #[arg(long)]
        model: Option<String>,

        /// Override the configured tool round cap
        #[arg(long)]
        max_rounds: Option<usize>,
    },
    /// Print the tool schemas offered to the model
    Schema,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "folio", "replay", "--book", "my-book", "--script", "s.json", "--max-rounds", "2", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Replay {
                book,
                max_rounds,
                model,
                prompt,
                ..
            } => {
                assert_eq!(book, PathBuf::from("my-book"));
                assert_eq!(max_rounds, Some(2));
                assert_eq!(model, None);
                assert_eq!(prompt, "");
            }
            Command::Schema => panic!("expected replay"),
        }
    }

    #[test]
    fn test_replay_requires_book() {
        assert!(Cli::try_parse_from(["folio", "replay", "--script", "s.json"]).is_err());
    }
}
