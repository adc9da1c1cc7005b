use chrono::{SecondsFormat, Utc};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// Initialize line-oriented logging to stdout: RFC 3339 UTC timestamp,
/// colored level, target and message.
pub fn init_logging(level: LevelFilter) -> anyhow::Result<()> {
	let colors = ColoredLevelConfig::new()
		.error(Color::Red)
		.warn(Color::Yellow)
		.info(Color::Green)
		.debug(Color::Blue)
		.trace(Color::BrightBlack);

	fern::Dispatch::new()
		.format(move |out, message, record| {
			out.finish(format_args!(
				"{} {:<5} [{}] {}",
				Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
				colors.color(record.level()),
				record.target(),
				message
			))
		})
		.level(level)
		// sqlx logs every statement at info
		.level_for("sqlx", LevelFilter::Warn)
		.chain(std::io::stdout())
		.apply()
		.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

	Ok(())
}
