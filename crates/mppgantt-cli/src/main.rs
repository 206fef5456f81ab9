//! mppgantt CLI - Microsoft Project schedule to Excel Gantt chart
//!
//! Loads `config.json`, reads a project file, and writes the Gantt workbook,
//! prompting for whatever was not given on the command line.

mod prompt;

use anyhow::{bail, Context, Result};
use clap::Parser;
use mppgantt_core::config::CONFIG_FILE;
use mppgantt_core::{GanttConfig, Renderer};
use mppgantt_reader::read_project;
use mppgantt_render::{GanttRenderer, TreeRenderer};
use prompt::{
    ask_path, clean_path_input, save_interactively, Prompter, SaveOutcome, INPUT_PROMPT,
};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "mppgantt")]
#[command(author, version, about = "Convert a Microsoft Project schedule into an Excel Gantt chart", long_about = None)]
struct Cli {
    /// Microsoft Project XML (MSPDI) file; asked for when omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILE, env = "MPPGANTT_CONFIG")]
    config: PathBuf,

    /// Output workbook name ('.xlsx' is appended when missing); asked for when omitted
    #[arg(short, long, value_name = "NAME")]
    output: Option<String>,

    /// Overwrite an existing workbook without asking
    #[arg(short, long)]
    force: bool,

    /// Print the task tree instead of writing a workbook
    #[arg(long)]
    tree: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

/// Logs go to stderr; stdout carries the prompts
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = GanttConfig::load(&cli.config)
        .with_context(|| format!("cannot load configuration '{}'", cli.config.display()))?;
    debug!(?config, "configuration");

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let input = match cli.file {
        Some(path) => path,
        None => {
            let answer = if interactive {
                ask_path(INPUT_PROMPT)?
            } else {
                prompter.ask(INPUT_PROMPT)?
            };
            let answer = answer.unwrap_or_default();
            let cleaned = clean_path_input(&answer);
            if cleaned.is_empty() {
                bail!("no project file given");
            }
            PathBuf::from(cleaned)
        }
    };
    if !input.exists() {
        bail!("File '{}' not found.", input.display());
    }

    let project = read_project(&input)
        .with_context(|| format!("cannot read project file '{}'", input.display()))?;
    println!("Total number of tasks: {}", project.task_count());
    info!(project = %project.name, "project loaded");

    if cli.tree {
        print!("{}", TreeRenderer::new().render(&project)?);
        return Ok(());
    }

    let workbook = GanttRenderer::new(&config).render(&project)?;
    let dir = std::env::current_dir().context("cannot determine the working directory")?;

    let outcome = save_interactively(&mut prompter, &dir, cli.output, cli.force, |path| {
        std::fs::write(path, &workbook)
    })?;
    match outcome {
        SaveOutcome::Saved(path) => println!("Saved '{}'", path.display()),
        SaveOutcome::Aborted => info!("workbook not saved"),
    }

    Ok(())
}
