use glob;
use logging::*;
use sim_time::*;
use std::f64::INFINITY;

/// Used to configure the `Simulation`.
pub struct Config
{
	/// Number of ticks in one second of simulated time. Use 1_000.0 for ms,
	/// 1.0 for seconds, 0.016667 for minutes, etc.
	/// Defaults to micro-second resolution.
	pub time_units: f64,

	/// Maximum time to run the simulation for (seconds).
	/// Defaults to INFINITY which means run until no component is left
	/// to schedule.
	pub max_secs: f64,

	/// Random number generator seed.
	/// Defaults to 0 which means seed with entropy. Note that if you want
	/// deterministic results you should use a fixed seed.
	pub seed: u32,

	/// If a computed scheduled time lands before the current time, clamp
	/// it to the current time instead of failing the run with an
	/// OrderingViolation.
	/// Defaults to false.
	pub cap_now: bool,

	/// Default log level.
	/// Defaults to Info.
	pub log_level: LogLevel,

	/// Overrides log_level for components whose name matches a glob
	/// pattern. The first matching pattern wins.
	pub log_levels: Vec<(glob::Pattern, LogLevel)>,

	/// Used to limit the width of the component name when logging.
	/// Defaults to 0 which means no limit.
	pub max_log_name: usize,

	/// Use escape sequences to color code stdout.
	/// Defaults to true.
	pub colorize: bool,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to bright red. See https://en.wikipedia.org/wiki/ANSI_escape_code#Colors
	/// for information on color escape codes.
	pub error_escape_code: String,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to red.
	pub warning_escape_code: String,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to bold black.
	pub info_escape_code: String,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to black.
	pub debug_escape_code: String,

	/// Used when logging to stdout when colorize is on.
	/// Defaults to light gray.
	pub excessive_escape_code: String,
}

impl Config
{
	pub fn new() -> Config
	{
		Config {
			time_units: 1_000_000.0,
			max_secs: INFINITY,
			seed: 0,
			cap_now: false,
			log_level: LogLevel::Info,
			log_levels: Vec::new(),
			max_log_name: 0,
			colorize: true,
			error_escape_code: "\x1b[31;1m".to_string(),
			warning_escape_code: "\x1b[31m".to_string(),
			info_escape_code: "\x1b[30;1m".to_string(),
			debug_escape_code: "".to_string(),
			excessive_escape_code: "\x1b[1;38;5;244m".to_string(),
		}
	}

	/// Sets log_level from a string like "info". On failure returns an
	/// error suitable for a --help style message.
	pub fn parse_log_level(&mut self, text: &str) -> Option<String>
	{
		match parse_level(text) {
			Ok(level) => {self.log_level = level; None},
			Err(err) => Some(err),
		}
	}

	/// Appends log_levels overrides from strings like "debug:clerk*".
	pub fn parse_log_levels(&mut self, entries: Vec<&str>) -> Option<String>
	{
		for entry in entries {
			let parts: Vec<&str> = entry.splitn(2, ':').collect();
			if parts.len() != 2 {
				return Some(format!("expected LEVEL:GLOB but found '{}'", entry));
			}

			let level = match parse_level(parts[0]) {
				Ok(level) => level,
				Err(err) => return Some(err),
			};

			match glob::Pattern::new(parts[1]) {
				Ok(pattern) => self.log_levels.push((pattern, level)),
				Err(err) => return Some(format!("couldn't parse '{}' as a glob: {}", parts[1], err)),
			}
		}
		None
	}

	/// Sets max_secs from a string like "100", "30s", "5m", "2h", or "1d".
	pub fn parse_max_secs(&mut self, text: &str) -> Option<String>
	{
		match parse_secs(text) {
			Ok(secs) => {self.max_secs = secs; None},
			Err(err) => Some(err),
		}
	}
}

fn parse_level(text: &str) -> Result<LogLevel, String>
{
	match text {
		"error" => Ok(LogLevel::Error),
		"warning" => Ok(LogLevel::Warning),
		"info" => Ok(LogLevel::Info),
		"debug" => Ok(LogLevel::Debug),
		"excessive" => Ok(LogLevel::Excessive),
		_ => Err(format!("level should be {} not '{}'", log_levels(), text)),
	}
}

#[cfg(test)]
mod tests
{
	use logging::*;
	use super::*;

	#[test]
	fn parses_levels()
	{
		let mut config = Config::new();
		assert!(config.parse_log_level("debug").is_none());
		assert_eq!(config.log_level, LogLevel::Debug);
		assert!(config.parse_log_level("noisy").is_some());
	}

	#[test]
	fn parses_level_overrides()
	{
		let mut config = Config::new();
		assert!(config.parse_log_levels(vec!["excessive:clerk*", "error:customer.1"]).is_none());
		assert_eq!(config.log_levels.len(), 2);
		assert!(config.log_levels[0].0.matches("clerk.2"));
		assert!(!config.log_levels[0].0.matches("customer.2"));

		assert!(config.parse_log_levels(vec!["clerk*"]).is_some());
	}

	#[test]
	fn parses_max_secs()
	{
		let mut config = Config::new();
		assert!(config.parse_max_secs("5m").is_none());
		assert_eq!(config.max_secs, 300.0);
		assert!(config.parse_max_secs("five").is_some());
	}
}
