use std::error::Error;
use std::fmt;

/// All fallible kernel APIs return `SimResult`. Conditions are raised
/// synchronously to the caller and never retried internally: the run is
/// expected to stop unless the caller catches the condition (e.g. to
/// count `CapacityExceeded` occurrences).
pub type SimResult<T> = Result<T, SimError>;

#[derive(Clone, Debug, PartialEq)]
pub enum SimError
{
	/// A computed event time precedes the current time and `Config::cap_now`
	/// was off. Times are reported in seconds.
	OrderingViolation {
		scheduled: f64,
		now: f64,
	},

	/// A queue or store insertion would exceed the capacity. The insertion
	/// is rejected, never silently dropped or blocked.
	CapacityExceeded {
		name: String,
		capacity: usize,
	},

	/// A process-interaction call that is not legal for the target's
	/// current status, e.g. resuming a component that is not interrupted
	/// or requesting a negative quantity from a non-anonymous resource.
	InvalidTransition(String),

	/// A body broke the suspension contract, e.g. a `Context` call that
	/// would suspend the current component instead of returning the
	/// corresponding `Transition`.
	BodyContractViolation(String),
}

impl fmt::Display for SimError
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match self {
			&SimError::OrderingViolation{scheduled, now} =>
				write!(formatter, "scheduled time ({:.3}) is before now ({:.3})", scheduled, now),
			&SimError::CapacityExceeded{ref name, capacity} =>
				write!(formatter, "{} is at its capacity ({})", name, capacity),
			&SimError::InvalidTransition(ref message) =>
				write!(formatter, "{}", message),
			&SimError::BodyContractViolation(ref message) =>
				write!(formatter, "{}", message),
		}
	}
}

impl Error for SimError
{
	fn description(&self) -> &str
	{
		match self {
			&SimError::OrderingViolation{..} => "scheduled time is before now",
			&SimError::CapacityExceeded{..} => "capacity exceeded",
			&SimError::InvalidTransition(_) => "invalid transition",
			&SimError::BodyContractViolation(_) => "body contract violation",
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn displays()
	{
		let err = SimError::CapacityExceeded{name: "dock".to_string(), capacity: 2};
		assert_eq!(format!("{}", err), "dock is at its capacity (2)");

		let err = SimError::OrderingViolation{scheduled: 1.0, now: 2.0};
		assert_eq!(format!("{}", err), "scheduled time (1.000) is before now (2.000)");
	}
}
