use crate::domain::ports::Confirm;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "studio-content")]
#[command(about = "Edit, draft and publish the marketing site content")]
pub struct Cli {
    #[arg(long, short, help = "TOML config file (defaults to STUDIO_* environment variables)")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "STUDIO_BASE_URL", help = "Storage base URL, overrides the config file")]
    pub base_url: Option<String>,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show loading state, unsaved changes and where content comes from
    Status,
    /// Print the merged content (or one dotted path) as JSON
    Show { path: Option<String> },
    /// Print a single field
    Get {
        path: String,
        #[arg(long, default_value = "")]
        default: String,
    },
    /// Set a field in the local draft
    Set {
        path: String,
        value: String,
        #[arg(long, help = "Parse VALUE as JSON instead of a plain string")]
        json: bool,
    },
    /// Write the current content to the local draft now
    SaveDraft,
    /// Upload the current content as the live version
    Publish,
    /// Throw away the local draft and revert to the live version
    Discard {
        #[arg(long, short, help = "Do not ask for confirmation")]
        yes: bool,
    },
    /// Upload a file and optionally point a content field at it
    Upload {
        file: PathBuf,
        #[arg(long, default_value = crate::core::assets::DEFAULT_ASSET_PREFIX)]
        prefix: String,
        #[arg(long, help = "Dotted path to set to the uploaded file's URL")]
        key: Option<String>,
    },
}

/// Asks on stdin unless `assume_yes` is set.
#[derive(Debug, Clone, Copy)]
pub struct StdinConfirm {
    pub assume_yes: bool,
}

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
