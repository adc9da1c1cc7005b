use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use uccelli_sync::config::{self, StoreBackend};
use uccelli_sync::normalize::normalize_named;
use uccelli_sync::observability::{MetricsRegistry, init_logging};
use uccelli_sync::{build_orchestrator, run};

#[derive(Parser)]
#[command(name = "uccelli-sync", about = "Sync WordPress posts and events into the content store")]
struct Cli {
	/// Override the configured store backend (memory, document, relational)
	#[arg(long, global = true)]
	store: Option<StoreBackend>,

	#[command(subcommand)]
	command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
	/// Serve the HTTP trigger (default)
	Serve,
	/// Run one sync of posts and events and print the report as JSON
	Once,
	/// Normalize raw source JSON (an object or an array) and print the result
	Normalize {
		/// Record kind: post or event. Unknown kinds are passed through unchanged.
		#[arg(long)]
		kind: String,
		/// Read from this file instead of stdin
		#[arg(long)]
		file: Option<PathBuf>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let mut settings = match config::load() {
		Ok(s) => s,
		Err(e) => {
			eprintln!("failed to load config, using defaults: {}", e);
			config::Settings::default()
		}
	};
	if let Some(store) = cli.store {
		settings.store = store;
	}
	init_logging(settings.log_level.to_level_filter())?;

	match cli.command.unwrap_or(Commands::Serve) {
		Commands::Serve => run(settings).await,
		Commands::Once => {
			let metrics = Arc::new(MetricsRegistry::new()?);
			let orchestrator = build_orchestrator(&settings, metrics).await?;
			let report = orchestrator.sync_all().await;
			println!("{}", serde_json::to_string_pretty(&report)?);
			Ok(())
		}
		Commands::Normalize { kind, file } => {
			let input = match file {
				Some(path) => std::fs::read_to_string(&path)
					.with_context(|| format!("reading {}", path.display()))?,
				None => {
					let mut buf = String::new();
					std::io::stdin().read_to_string(&mut buf)?;
					buf
				}
			};
			let raw: Value = serde_json::from_str(&input).context("input is not valid JSON")?;
			let out = match raw {
				Value::Array(items) => Value::Array(
					items
						.iter()
						.map(|item| normalize_named(item, &kind).to_value())
						.collect::<Result<_, _>>()?,
				),
				item => normalize_named(&item, &kind).to_value()?,
			};
			println!("{}", serde_json::to_string_pretty(&out)?);
			Ok(())
		}
	}
}
