use queue::*;
use sim_time::*;
use std;
use std::fmt;

/// A shared value cell with a queue of waiters. Mutating the value wakes
/// every waiter whose condition now holds; unlike a resource, satisfying
/// one waiter does not consume anything so one mutation may release many.
pub struct State
{
	pub name: String,
	pub base_name: String,
	pub sequence_number: usize,

	pub value: StateValue,

	/// The time the value was last set.
	pub value_time: Time,

	pub waiters: QueueID,
}

/// The kinds of values a `State` can hold. The typed variants mirror the
/// int/float/string triad used for component data elsewhere in the
/// library; `Bool` covers the common gate/flag case.
#[derive(Clone, Debug, PartialEq)]
pub enum StateValue
{
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}

impl fmt::Display for StateValue
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		match self {
			&StateValue::Bool(value) => write!(formatter, "{}", value),
			&StateValue::Int(value) => write!(formatter, "{}", value),
			&StateValue::Float(value) => write!(formatter, "{}", value),
			&StateValue::Str(ref value) => write!(formatter, "{}", value),
		}
	}
}

impl From<bool> for StateValue
{
	fn from(value: bool) -> StateValue {StateValue::Bool(value)}
}

impl From<i64> for StateValue
{
	fn from(value: i64) -> StateValue {StateValue::Int(value)}
}

impl From<f64> for StateValue
{
	fn from(value: f64) -> StateValue {StateValue::Float(value)}
}

impl<'a> From<&'a str> for StateValue
{
	fn from(value: &'a str) -> StateValue {StateValue::Str(value.to_string())}
}

impl From<String> for StateValue
{
	fn from(value: String) -> StateValue {StateValue::Str(value)}
}

/// How a wait condition decides whether a state value is acceptable.
pub enum WaitTest
{
	/// Accept exactly this value.
	Equals(StateValue),

	/// Accept any value the predicate approves of, e.g. a threshold or
	/// a membership check.
	Predicate(Box<Fn(&StateValue) -> bool>),
}

impl WaitTest
{
	pub fn holds(&self, value: &StateValue) -> bool
	{
		match self {
			&WaitTest::Equals(ref wanted) => wanted == value,
			&WaitTest::Predicate(ref test) => test(value),
		}
	}
}

/// States are referenced using a small integer, like components.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateID(pub usize);

pub const NO_STATE: StateID = StateID(std::usize::MAX);

impl fmt::Display for StateID
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "{}", self.0)
	}
}
