use std;

/// To better support deterministic execution time is stored
/// using 64-bit integer ticks. The number of ticks per second
/// is set with `Config::time_units`; by default the units are
/// micro-seconds. All public APIs deal in f64 seconds and the
/// `Simulation` converts at the boundary.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Time(pub i64);	// unsigned would give us more range, but makes it awkward to use times in the past

/// Used for components that are suspended without a wakeup time,
/// e.g. a request with no deadline or an infinite hold. Entries
/// with this time are never placed on the event list.
pub const TIME_NEVER: Time = Time(std::i64::MAX);

impl Time
{
	pub fn is_never(self) -> bool
	{
		self == TIME_NEVER
	}
}

/// For use in --help messages.
pub fn time_suffixes() -> &'static str
{
	"s, m, h, or d"
}

/// Parses a time duration with an optional suffix, e.g. "100", "30s",
/// "5m", "2h", or "1d". Returns seconds.
pub fn parse_secs(text: &str) -> Result<f64, String>
{
	let text = text.trim();
	if text.is_empty() {
		return Err("time should not be empty".to_string());
	}

	let (value, scale) = match text.char_indices().last().unwrap() {
		(i, 's') => (&text[..i], 1.0),
		(i, 'm') => (&text[..i], 60.0),
		(i, 'h') => (&text[..i], 60.0*60.0),
		(i, 'd') => (&text[..i], 60.0*60.0*24.0),
		_ => (text, 1.0),
	};

	match value.parse::<f64>() {
		Ok(x) if x < 0.0 => Err(format!("time '{}' should not be negative", text)),
		Ok(x) => Ok(x*scale),
		Err(_) => Err(format!("couldn't parse '{}' as a time (use {} suffixes)", text, time_suffixes())),
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn parses_suffixes()
	{
		assert_eq!(parse_secs("10"), Ok(10.0));
		assert_eq!(parse_secs("10s"), Ok(10.0));
		assert_eq!(parse_secs("2m"), Ok(120.0));
		assert_eq!(parse_secs("1h"), Ok(3600.0));
		assert_eq!(parse_secs("1d"), Ok(86400.0));
	}

	#[test]
	fn rejects_garbage()
	{
		assert!(parse_secs("").is_err());
		assert!(parse_secs("bogus").is_err());
		assert!(parse_secs("-5s").is_err());
	}

	#[test]
	fn never_ordering()
	{
		assert!(Time(0) < TIME_NEVER);
		assert!(Time(std::i64::MAX - 1) < TIME_NEVER);
		assert!(TIME_NEVER.is_never());
		assert!(!Time(100).is_never());
	}
}
