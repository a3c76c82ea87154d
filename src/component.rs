// Copyright (C) 2017 Jesse Jones
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 3, or (at your option)
// any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program; if not, write to the Free Software Foundation,
// Inc., 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301, USA.
use event::*;
use process::*;
use queue::*;
use resource::*;
use sim_time::*;
use state::*;
use store::*;
use std;
use std::fmt;

/// `Component`s are the building blocks of a `Simulation`: the process
/// instances the kernel schedules. A component with a body moves through
/// the status state machine as the body suspends and resumes; a data
/// component just sits in queues and stores.
pub struct Component
{
	/// The name of the component. Note that, in general, these are not unique.
	pub name: String,

	/// The part of the name before serialization, e.g. "customer" for
	/// "customer.3".
	pub base_name: String,

	/// The serialized part of the name, 0 for names that were not
	/// serialized.
	pub sequence_number: usize,

	pub status: Status,

	/// Only meaningful in Scheduled (wakeup time) and Requesting/Waiting
	/// (deadline). TIME_NEVER when the component has no pending wakeup.
	pub scheduled_time: Time,

	/// The event list slot the component occupies, if any.
	pub event_key: Option<EventKey>,

	pub creation_time: Time,

	/// A user tag used in traces and animations, plus the time it was
	/// last changed.
	pub mode: String,
	pub mode_time: Time,

	/// Set when a pending request or wait was abandoned (deadline
	/// elapsed or a forced reschedule); reset by each new request/wait.
	pub failed: bool,

	/// Stacked interrupts: zero unless the status is Interrupted.
	pub interrupt_level: u32,

	/// The status to return to when the interrupt level drops to zero.
	pub interrupted_status: Status,

	/// Snapshot of time-to-event taken when the component was interrupted,
	/// used to re-derive the wakeup/deadline on resume.
	pub remaining_duration: Time,

	/// Event key fields restored on resume.
	pub saved_priority: Priority,
	pub saved_urgent: bool,

	/// Outstanding resource requests, empty unless Requesting.
	pub requests: Vec<RequestEntry>,

	/// True when the outstanding requests use OR semantics.
	pub oneof: bool,

	/// Currently claimed resources with the claimed quantity per resource.
	pub claims: Vec<(ResourceID, f64)>,

	/// Outstanding wait conditions, empty unless Waiting.
	pub waits: Vec<WaitCond>,
	pub wait_all: bool,

	/// Pending store operations, at most one of the two.
	pub putting: Option<PendingPut>,
	pub getting: Option<PendingGet>,

	/// The item delivered by the last honored from-store request.
	pub retrieved: Option<ComponentID>,

	/// The queues the component is currently a member of, including the
	/// internal requester/claimer/waiter queues. The queue does not own
	/// the component and the component does not own the queue.
	pub queues: Vec<QueueID>,

	/// The suspendable unit of work. None for data components and for
	/// terminated components (termination is terminal).
	pub process: Option<Box<Process>>,
}

/// A single member of an outstanding request spec.
pub struct RequestEntry
{
	pub resource: ResourceID,
	pub quantity: f64,

	/// The priority the component holds in the resource's requesters
	/// queue; preserved when moving to the claimers queue.
	pub priority: Priority,
}

/// A single member of an outstanding wait.
pub struct WaitCond
{
	pub state: StateID,
	pub test: WaitTest,
}

/// A pending deposit blocked on a full store.
pub struct PendingPut
{
	pub store: StoreID,
	pub item: ComponentID,
}

/// A pending take blocked on an empty store or an unmatched filter.
pub struct PendingGet
{
	pub store: StoreID,
	pub filter: Option<Box<Fn(&Component) -> bool>>,
	pub key: Option<Box<Fn(&Component) -> i64>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status
{
	/// Not scheduled and without a pending body slice: either never
	/// started, or terminated (terminal).
	Data,

	/// The single component actively executing right now.
	Current,

	/// On the event list with a wakeup time.
	Scheduled,

	/// Suspended without a wakeup time; only an activate can revive it.
	Passive,

	/// Becomes current again at every event list step.
	Standby,

	/// Blocked on state wait conditions.
	Waiting,

	/// Blocked on resource claims or a store rendezvous.
	Requesting,

	/// Forcibly suspended; resumes to the pre-interrupt status.
	Interrupted,
}

impl fmt::Display for Status
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		let name = match self {
			&Status::Data => "data",
			&Status::Current => "current",
			&Status::Scheduled => "scheduled",
			&Status::Passive => "passive",
			&Status::Standby => "standby",
			&Status::Waiting => "waiting",
			&Status::Requesting => "requesting",
			&Status::Interrupted => "interrupted",
		};
		write!(formatter, "{}", name)
	}
}

/// To make lifetime management easier components are referenced using a small
/// integer instead of a rust reference.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ComponentID(pub usize);

/// The id of no component, e.g. the value of `Simulation::current_component`
/// before the first step.
pub const NO_COMPONENT: ComponentID = ComponentID(std::usize::MAX);

impl fmt::Display for ComponentID
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "{}", self.0)
	}
}

impl Component
{
	pub fn new(name: String, base_name: String, sequence_number: usize, time: Time, process: Option<Box<Process>>) -> Component
	{
		Component {
			name,
			base_name,
			sequence_number,
			status: Status::Data,
			scheduled_time: TIME_NEVER,
			event_key: None,
			creation_time: time,
			mode: "".to_string(),
			mode_time: time,
			failed: false,
			interrupt_level: 0,
			interrupted_status: Status::Data,
			remaining_duration: TIME_NEVER,
			saved_priority: 0,
			saved_urgent: false,
			requests: Vec::new(),
			oneof: false,
			claims: Vec::new(),
			waits: Vec::new(),
			wait_all: false,
			putting: None,
			getting: None,
			retrieved: None,
			queues: Vec::new(),
			process,
		}
	}

	pub fn claimed_quantity(&self, resource: ResourceID) -> f64
	{
		match self.claims.iter().find(|claim| claim.0 == resource) {
			Some(claim) => claim.1,
			None => 0.0,
		}
	}

	pub fn requested_quantity(&self, resource: ResourceID) -> f64
	{
		self.requests.iter()
			.filter(|request| request.resource == resource)
			.fold(0.0, |sum, request| sum + request.quantity)
	}

	pub fn is_in_queue(&self, queue: QueueID) -> bool
	{
		self.queues.contains(&queue)
	}
}

#[cfg(test)]
mod tests
{
	use resource::*;
	use sim_time::*;
	use super::*;

	#[test]
	fn fresh_component_is_data()
	{
		let c = Component::new("cart".to_string(), "cart".to_string(), 0, Time(0), None);
		assert_eq!(c.status, Status::Data);
		assert!(c.scheduled_time.is_never());
		assert_eq!(c.interrupt_level, 0);
		assert_eq!(c.claimed_quantity(ResourceID(0)), 0.0);
	}

	#[test]
	fn status_displays()
	{
		assert_eq!(format!("{}", Status::Requesting), "requesting");
		assert_eq!(format!("{}", Status::Data), "data");
	}
}
