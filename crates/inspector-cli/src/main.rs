//! inspector CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "inspector",
    version,
    about = "Dependency-aware autograder for Rhai assignments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade student code against a test tree
    Grade(commands::grade::GradeArgs),

    /// Check a test tree without running any student code
    Validate {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding the question groups
        #[arg(long)]
        test_root: Option<PathBuf>,

        /// Only check this question and its prerequisites
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Create a starter config, student code and test tree
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inspector=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade(args) => commands::grade::execute(args).await,
        Commands::Validate {
            config,
            test_root,
            question,
        } => commands::validate::execute(config, test_root, question),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
