mod extract;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "llmschema")]
#[command(version)]
#[command(
    about = "Extract database schemas into compact, LLM-friendly documentation",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a database schema and write it as text or markdown
    Extract {
        /// Database URL: postgres://, postgresql://, mysql:// or sqlite://<path>
        #[arg(short, long)]
        url: Option<String>,

        /// Schema to extract (PostgreSQL default: public; MySQL default: database in URL)
        #[arg(short, long)]
        schema: Option<String>,

        /// Only extract specific tables, in this order (comma-separated)
        #[arg(short, long)]
        tables: Option<String>,

        /// Exclude specific tables (comma-separated)
        #[arg(short, long)]
        exclude: Option<String>,

        /// Output format: text (compact) or markdown (structured)
        #[arg(short, long)]
        format: Option<String>,

        /// Write a single document to this file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an overview plus one file per table into this directory
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// With --output-dir, only split when there are more tables than this (0 = always split)
        #[arg(long)]
        split_threshold: Option<usize>,

        /// YAML config file supplying defaults for these flags
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show progress during extraction
        #[arg(short, long)]
        progress: bool,

        /// Print a JSON run summary instead of status lines (requires --output or --output-dir)
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Extract {
            url,
            schema,
            tables,
            exclude,
            format,
            output,
            output_dir,
            split_threshold,
            config,
            progress,
            json,
        } => extract::run(extract::ExtractArgs {
            url,
            schema,
            tables,
            exclude,
            format,
            output,
            output_dir,
            split_threshold,
            config,
            progress,
            json,
        }),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "llmschema", &mut io::stdout());
            Ok(())
        }
    }
}
