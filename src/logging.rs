#[derive(Debug, PartialEq, PartialOrd)]
pub enum LogLevel
{
	Error,	// update log_levels if this changes
	Warning,
	Info,
	Debug,
	Excessive
}

/// For use in --help messages.
pub fn log_levels() -> &'static str
{
	"error, warning, info, debug, or excessive"
}

#[macro_export]
macro_rules! log_error
{
	($target:expr) => ($target.log(LogLevel::Error, ""));
	($target:expr, $msg:expr) => ($target.log(LogLevel::Error, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log(LogLevel::Error, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_warning
{
	($target:expr) => ($target.log(LogLevel::Warning, ""));
	($target:expr, $msg:expr) => ($target.log(LogLevel::Warning, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log(LogLevel::Warning, &format!($fmt, $($arg)*)));
}

/// # Examples
///
/// ```rust
/// #[macro_use]
/// extern crate desk;
/// use desk::*;
///
/// # fn main() {
/// let mut sim = Simulation::new(Config::new());
/// log_info!(sim);						// logs an empty line
/// log_info!(sim, "hello");				// logs a string
/// log_info!(sim, "now = {:.1}", sim.now());	// logs using a format string
/// # }
/// ```
#[macro_export]
macro_rules! log_info
{
	($target:expr) => ($target.log(LogLevel::Info, ""));
	($target:expr, $msg:expr) => ($target.log(LogLevel::Info, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log(LogLevel::Info, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_debug
{
	($target:expr) => ($target.log(LogLevel::Debug, ""));
	($target:expr, $msg:expr) => ($target.log(LogLevel::Debug, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log(LogLevel::Debug, &format!($fmt, $($arg)*)));
}

#[macro_export]
macro_rules! log_excessive
{
	($target:expr) => ($target.log(LogLevel::Excessive, ""));
	($target:expr, $msg:expr) => ($target.log(LogLevel::Excessive, $msg));
	($target:expr, $fmt:expr, $($arg:tt)*) => ($target.log(LogLevel::Excessive, &format!($fmt, $($arg)*)));
}
