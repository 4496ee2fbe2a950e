use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

/// Pathways CLI - inspect, render and save data-entry pathways
#[derive(Parser, Debug)]
#[command(name = "pathwayctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Pathways config file (overrides PATHWAYS_CONFIG env var)
    #[arg(long, short = 'c', global = true, env = "PATHWAYS_CONFIG", default_value = "pathways.yaml")]
    pub config: PathBuf,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered pathways
    List {
        /// Output format (wide, json, yaml, name)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Show a pathway as the front end receives it
    Show {
        /// Pathway slug
        slug: String,

        /// Episode the pathway is opened for
        #[arg(long)]
        episode: Option<u64>,

        /// Output format (json, yaml)
        #[arg(short, long, default_value = "json")]
        output: String,
    },

    /// Print the page templates a pathway renders with, most specific first
    Templates {
        /// Pathway slug
        slug: String,
    },

    /// Save a JSON payload through a pathway into the configured record store
    Save {
        /// Pathway slug
        slug: String,

        /// JSON file holding the payload, keyed by record model API name
        #[arg(short, long)]
        data: PathBuf,

        /// User performing the save
        #[arg(short, long, env = "PATHWAYS_USER")]
        user: String,

        /// Episode the pathway is opened for
        #[arg(long)]
        episode: Option<u64>,
    },

    /// Load every installed app and render every pathway
    Validate,

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: clap_complete::Shell,

        /// Write the script to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::List { output } => commands::list::execute(&self.config, &output),
            Commands::Show {
                slug,
                episode,
                output,
            } => commands::show::execute(&self.config, &slug, episode, &output),
            Commands::Templates { slug } => commands::templates::execute(&self.config, &slug),
            Commands::Save {
                slug,
                data,
                user,
                episode,
            } => commands::save::execute(&self.config, &slug, &data, &user, episode).await,
            Commands::Validate => commands::validate::execute(&self.config),
            Commands::Completion { shell, output } => {
                commands::completion::execute(shell, output.as_deref())
            }
        }
    }
}
