use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use outbox::cli::args::{Cli, Commands};
use outbox::cli::commands::{self, AppContext};
use outbox::config::{Config, Paths};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{}: {e:#}", "error".red().bold());
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Completions need no config or service.
    if let Commands::Completions { shell } = &cli.command {
        print!("{}", commands::completions(*shell)?);
        return Ok(());
    }

    let paths = match &cli.dir {
        Some(dir) => Paths::with_root(dir.clone()),
        None => Paths::new()?,
    };
    let config = Config::load_from_path(&paths.config_file).context("loading configuration")?;
    let ctx = AppContext { config, paths };

    let service = commands::build_service(&ctx, cli.offline)?;
    let format = cli.output;

    let output = match cli.command {
        Commands::Send(args) => commands::send(&service, &args, format)?,
        Commands::Status => commands::status(&service, format)?,
        Commands::List(args) => commands::list(&service, &args, format)?,
        Commands::Sync => commands::sync(&service, format)?,
        Commands::Retry(args) => commands::retry(&service, &args, format)?,
        Commands::Clear(args) => commands::clear(&service, &args, format)?,
        Commands::Prune(args) => commands::prune(&service, &args, format)?,
        Commands::Watch(args) => commands::watch(&service, &ctx.config.watch, &args, format)?,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}
