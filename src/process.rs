use component::*;
use errors::*;
use event::*;
use logging::*;
use rand::XorShiftRng;
use resource::*;
use simulation::*;
use state::*;
use store::*;

/// The suspendable unit of work attached to a component. The kernel
/// invokes `process` every time the component becomes current; the body
/// does a slice of work and returns what the component does next. All
/// suspension goes through the returned `Transition`; synchronous
/// operations on other components go through the `Context`.
///
/// Closures work too: any `FnMut(&mut Context) -> SimResult<Transition>`
/// is a `Process`.
pub trait Process
{
	fn process(&mut self, context: &mut Context) -> SimResult<Transition>;
}

impl<F> Process for F
	where F: FnMut(&mut Context) -> SimResult<Transition>
{
	fn process(&mut self, context: &mut Context) -> SimResult<Transition>
	{
		self(context)
	}
}

/// What a component does when its body slice finishes: the next
/// suspension point of the cooperative task.
pub enum Transition
{
	/// Become scheduled for a wakeup time.
	Hold(Hold),

	/// Suspend with no wakeup time; only an activate can revive it.
	Passivate,

	/// Become current again at every event list step.
	Standby,

	/// Claim quantities from one or more resources, blocking until the
	/// spec is honorable.
	Request(Request),

	/// Block until state conditions hold.
	Wait(Wait),

	/// Deposit an item into a store, blocking while the store is full.
	ToStore(ToStore),

	/// Take a matching item out of a store, blocking until one shows up.
	/// The item is delivered through `Context::retrieved`.
	FromStore(FromStore),

	/// The body is done: the component terminates, releasing every
	/// claimed resource, and becomes a data component permanently.
	Terminate,
}

impl Transition
{
	/// Hold for a duration, the most common transition.
	pub fn hold(duration: f64) -> Transition
	{
		Transition::Hold(Hold::secs(duration))
	}

	pub fn hold_till(till: f64) -> Transition
	{
		Transition::Hold(Hold::till(till))
	}
}

/// Arguments for a hold: exactly one of duration/till should be set
/// (neither means "reschedule for now").
pub struct Hold
{
	pub duration: Option<f64>,
	pub till: Option<f64>,
	pub urgent: bool,
	pub priority: Priority,
}

impl Hold
{
	pub fn secs(duration: f64) -> Hold
	{
		Hold{duration: Some(duration), till: None, urgent: false, priority: 0}
	}

	pub fn till(till: f64) -> Hold
	{
		Hold{duration: None, till: Some(till), urgent: false, priority: 0}
	}

	pub fn now() -> Hold
	{
		Hold{duration: None, till: None, urgent: false, priority: 0}
	}

	pub fn urgent(mut self) -> Hold
	{
		self.urgent = true;
		self
	}

	pub fn priority(mut self, priority: Priority) -> Hold
	{
		self.priority = priority;
		self
	}
}

/// Arguments for activating a component (`Simulation::activate`).
pub struct Activation
{
	/// Absolute time; if None now is used. If both at and delay are set
	/// the component becomes current at their sum.
	pub at: Option<f64>,
	pub delay: f64,
	pub urgent: bool,
	pub priority: Priority,

	/// Keep a pending request/wait alive (only the deadline moves)
	/// instead of abandoning it with the failed flag set.
	pub keep_request: bool,
	pub keep_wait: bool,

	/// Only meaningful for `Simulation::add_component_with`: with false
	/// the component is created as a data component and is not scheduled
	/// until an explicit activate call.
	pub started: bool,
}

impl Activation
{
	pub fn new() -> Activation
	{
		Activation{at: None, delay: 0.0, urgent: false, priority: 0, keep_request: false, keep_wait: false, started: true}
	}

	pub fn started(mut self, started: bool) -> Activation
	{
		self.started = started;
		self
	}

	pub fn at(mut self, at: f64) -> Activation
	{
		self.at = Some(at);
		self
	}

	pub fn delay(mut self, delay: f64) -> Activation
	{
		self.delay = delay;
		self
	}

	pub fn urgent(mut self) -> Activation
	{
		self.urgent = true;
		self
	}

	pub fn priority(mut self, priority: Priority) -> Activation
	{
		self.priority = priority;
		self
	}

	pub fn keep_request(mut self) -> Activation
	{
		self.keep_request = true;
		self
	}

	pub fn keep_wait(mut self) -> Activation
	{
		self.keep_wait = true;
		self
	}
}

/// One (resource, quantity, priority) member of a request spec.
pub struct RequestSpec
{
	pub resource: ResourceID,
	pub quantity: f64,

	/// Position in the requesters queue; None enters at the tail.
	pub priority: Option<Priority>,
}

impl RequestSpec
{
	pub fn new(resource: ResourceID, quantity: f64) -> RequestSpec
	{
		RequestSpec{resource, quantity, priority: None}
	}

	pub fn priority(mut self, priority: Priority) -> RequestSpec
	{
		self.priority = Some(priority);
		self
	}
}

/// Arguments for a resource request. Members combine with AND semantics
/// unless oneof is set (then the request is honored once any one member
/// is satisfiable). At most one of fail_at/fail_delay may be set.
pub struct Request
{
	pub specs: Vec<RequestSpec>,
	pub oneof: bool,
	pub fail_at: Option<f64>,
	pub fail_delay: Option<f64>,
}

impl Request
{
	/// Request quantity 1 from a single resource.
	pub fn one(resource: ResourceID) -> Request
	{
		Request{specs: vec![RequestSpec::new(resource, 1.0)], oneof: false, fail_at: None, fail_delay: None}
	}

	pub fn new(specs: Vec<RequestSpec>) -> Request
	{
		Request{specs, oneof: false, fail_at: None, fail_delay: None}
	}

	pub fn oneof(mut self) -> Request
	{
		self.oneof = true;
		self
	}

	pub fn fail_at(mut self, at: f64) -> Request
	{
		self.fail_at = Some(at);
		self
	}

	pub fn fail_delay(mut self, delay: f64) -> Request
	{
		self.fail_delay = Some(delay);
		self
	}
}

/// One (state, accepted-value-or-predicate) member of a wait.
pub struct WaitSpec
{
	pub state: StateID,
	pub test: WaitTest,

	/// Position in the waiters queue; None enters at the tail.
	pub priority: Option<Priority>,
}

impl WaitSpec
{
	pub fn equals<V: Into<StateValue>>(state: StateID, value: V) -> WaitSpec
	{
		WaitSpec{state, test: WaitTest::Equals(value.into()), priority: None}
	}

	pub fn predicate(state: StateID, test: Box<Fn(&StateValue) -> bool>) -> WaitSpec
	{
		WaitSpec{state, test: WaitTest::Predicate(test), priority: None}
	}

	pub fn priority(mut self, priority: Priority) -> WaitSpec
	{
		self.priority = Some(priority);
		self
	}
}

/// Arguments for a state wait. With all=false (the default) the wait is
/// satisfied when any one condition holds; with all=true every condition
/// must hold simultaneously.
pub struct Wait
{
	pub conds: Vec<WaitSpec>,
	pub all: bool,
	pub fail_at: Option<f64>,
	pub fail_delay: Option<f64>,
}

impl Wait
{
	pub fn for_any(conds: Vec<WaitSpec>) -> Wait
	{
		Wait{conds, all: false, fail_at: None, fail_delay: None}
	}

	pub fn for_all(conds: Vec<WaitSpec>) -> Wait
	{
		Wait{conds, all: true, fail_at: None, fail_delay: None}
	}

	pub fn fail_at(mut self, at: f64) -> Wait
	{
		self.fail_at = Some(at);
		self
	}

	pub fn fail_delay(mut self, delay: f64) -> Wait
	{
		self.fail_delay = Some(delay);
		self
	}
}

/// Arguments for depositing an item into a store.
pub struct ToStore
{
	pub store: StoreID,
	pub item: ComponentID,
	pub priority: Option<Priority>,
	pub fail_at: Option<f64>,
	pub fail_delay: Option<f64>,
}

impl ToStore
{
	pub fn new(store: StoreID, item: ComponentID) -> ToStore
	{
		ToStore{store, item, priority: None, fail_at: None, fail_delay: None}
	}

	pub fn priority(mut self, priority: Priority) -> ToStore
	{
		self.priority = Some(priority);
		self
	}

	pub fn fail_at(mut self, at: f64) -> ToStore
	{
		self.fail_at = Some(at);
		self
	}

	pub fn fail_delay(mut self, delay: f64) -> ToStore
	{
		self.fail_delay = Some(delay);
		self
	}
}

/// Arguments for taking an item out of a store. The contents are scanned
/// in store order for entries matching the filter; among matches the one
/// with the minimal key is selected, ties broken by store order.
pub struct FromStore
{
	pub store: StoreID,
	pub filter: Option<Box<Fn(&Component) -> bool>>,
	pub key: Option<Box<Fn(&Component) -> i64>>,
	pub priority: Option<Priority>,
	pub fail_at: Option<f64>,
	pub fail_delay: Option<f64>,
}

impl FromStore
{
	pub fn new(store: StoreID) -> FromStore
	{
		FromStore{store, filter: None, key: None, priority: None, fail_at: None, fail_delay: None}
	}

	pub fn filter(mut self, filter: Box<Fn(&Component) -> bool>) -> FromStore
	{
		self.filter = Some(filter);
		self
	}

	pub fn key(mut self, key: Box<Fn(&Component) -> i64>) -> FromStore
	{
		self.key = Some(key);
		self
	}

	pub fn priority(mut self, priority: Priority) -> FromStore
	{
		self.priority = Some(priority);
		self
	}

	pub fn fail_at(mut self, at: f64) -> FromStore
	{
		self.fail_at = Some(at);
		self
	}

	pub fn fail_delay(mut self, delay: f64) -> FromStore
	{
		self.fail_delay = Some(delay);
		self
	}
}

/// Encapsulates information related to the component currently being
/// executed. Bodies use this for everything that takes effect
/// immediately and synchronously; anything that would suspend the
/// component itself is expressed as the returned `Transition` instead.
pub struct Context<'a>
{
	/// The kernel. Operations on other components, queues, resources,
	/// stores and states all go through here.
	pub sim: &'a mut Simulation,

	/// The component currently being executed.
	pub id: ComponentID,
}

impl<'a> Context<'a>
{
	pub fn now(&self) -> f64
	{
		self.sim.now()
	}

	pub fn name(&self) -> String
	{
		self.sim.component(self.id).name.clone()
	}

	/// True if the component's last request/wait was abandoned, e.g.
	/// because its deadline elapsed.
	pub fn failed(&self) -> bool
	{
		self.sim.component(self.id).failed
	}

	/// The item delivered by the last honored from-store request.
	pub fn retrieved(&self) -> Option<ComponentID>
	{
		self.sim.component(self.id).retrieved
	}

	pub fn set_mode(&mut self, mode: &str)
	{
		self.sim.set_mode(self.id, mode);
	}

	/// This should be the only source of randomness used within a body.
	pub fn rng(&mut self) -> &mut XorShiftRng
	{
		self.sim.rng()
	}

	/// Normally you'll use one of the log macros, e.g. log_info!.
	pub fn log(&self, level: LogLevel, message: &str)
	{
		self.sim.log_component(&level, self.id, message);
	}
}
