use component::*;
use components::*;
use config::*;
use errors::*;
use event::*;
use logging::*;
use monitor::*;
use process::*;
use queue::*;
use rand::{SeedableRng, XorShiftRng};
use resource::*;
use sim_time::*;
use state::*;
use store::*;
use std;
use std::collections::HashMap;
use std::mem;
use time::get_time;

/// This is the top-level data structure: the coordinator that owns the
/// event list, the current simulation time, the notion of the current
/// component, and every queue, resource, store and state. Once an exe
/// initializes it the simulation will run until either a time limit
/// elapses or there are no components left to schedule.
///
/// Execution is single threaded cooperative virtual time scheduling: at
/// most one component is logically current at any instant, ordering
/// between same-time events is fully determined by `EventKey`, and a
/// suspension happens only when the current component's body returns a
/// `Transition`.
pub struct Simulation
{
	config: Config,
	precision: usize,	// number of decimal places to include when logging, derived from config.time_units

	components: Components,
	queues: Vec<Queue>,
	resources: Vec<Resource>,
	stores: Vec<Store>,
	states: Vec<State>,

	events: EventList,
	standby: Vec<ComponentID>,
	pending_standby: Vec<ComponentID>,

	now_ticks: Time,
	origin: Time,
	current: ComponentID,
	main_id: ComponentID,
	in_body: bool,

	monitors: Vec<Box<Monitor>>,
	counters: HashMap<String, usize>,	// for serializing queue/resource/store/state names
	rng: XorShiftRng,
	max_name_len: usize,
}

impl Simulation
{
	pub fn new(config: Config) -> Simulation
	{
		assert!(config.time_units > 0.0, "time units ({}) are not positive", config.time_units);

		let precision = config.time_units.log10().max(0.0) as usize;
		let seed = config.seed;
		let mut sim = Simulation {
			config,
			precision,
			components: Components::new(),
			queues: Vec::new(),
			resources: Vec::new(),
			stores: Vec::new(),
			states: Vec::new(),
			events: EventList::new(),
			standby: Vec::new(),
			pending_standby: Vec::new(),
			now_ticks: Time(0),
			origin: Time(0),
			current: NO_COMPONENT,
			main_id: NO_COMPONENT,
			in_body: false,
			monitors: Vec::new(),
			counters: HashMap::new(),
			rng: new_rng(seed, 10_000),
			max_name_len: 0,
		};

		// The main pseudo-component drives run(): it has no body and is
		// current whenever control is at the top level.
		let main_id = sim.components.add("main", Time(0), None);
		sim.components.get_mut(main_id).status = Status::Current;
		sim.main_id = main_id;
		sim.current = main_id;
		sim.max_name_len = 4;
		sim
	}

	// --- construction ----------------------------------------------------------

	/// Adds a component with a body and schedules it for the current
	/// time. Names ending in a period auto-serialize ("customer." becomes
	/// "customer.1", "customer.2", ...).
	pub fn add_component(&mut self, name: &str, process: Box<Process>) -> SimResult<ComponentID>
	{
		self.add_component_with(name, Activation::new(), process)
	}

	/// Adds a component with a body using explicit activation arguments.
	/// With `started(false)` the component is created as a data component
	/// and waits for an `activate` call.
	pub fn add_component_with(&mut self, name: &str, activation: Activation, process: Box<Process>) -> SimResult<ComponentID>
	{
		let id = self.components.add(name, self.now_ticks, Some(process));
		self.note_name(id);
		self.trace(id, "create");

		if activation.started {
			let time = self.activation_time(&activation)?;
			self.reschedule(id, time, activation.urgent, activation.priority, "activate")?;
		}
		Ok(id)
	}

	/// Adds a component without a body. Data components sit in queues
	/// and stores; they are never scheduled.
	pub fn add_data_component(&mut self, name: &str) -> ComponentID
	{
		let id = self.components.add(name, self.now_ticks, None);
		self.note_name(id);
		self.trace(id, "create (data)");
		id
	}

	pub fn add_queue(&mut self, name: &str, capacity: Option<usize>) -> QueueID
	{
		let id = self.make_queue(name, capacity, false);
		let name = self.queues[id.0].name.clone();
		self.log_named(&LogLevel::Debug, &name, "create");
		id
	}

	pub fn add_resource(&mut self, config: ResourceConfig) -> ResourceID
	{
		assert!(config.capacity >= 0.0, "capacity ({}) should not be negative", config.capacity);

		let (name, base_name, sequence_number) = self.serialize_name(&config.name);
		let requesters = self.make_queue(&format!("requesters of {}", name), None, true);
		let claimers = self.make_queue(&format!("claimers of {}", name), None, true);

		let id = ResourceID(self.resources.len());
		self.resources.push(Resource {
			name: name.clone(),
			base_name,
			sequence_number,
			capacity: config.capacity,
			claimed_quantity: 0.0,
			anonymous: config.anonymous,
			preemptive: config.preemptive,
			honor_only_first: config.honor_only_first,
			honor_only_highest_priority: config.honor_only_highest_priority,
			requesters,
			claimers,
		});
		self.max_name_len = self.max_name_len.max(name.len());
		self.log_named(&LogLevel::Debug, &name, &format!("create, capacity={}", config.capacity));
		id
	}

	pub fn add_store(&mut self, config: StoreConfig) -> StoreID
	{
		let (name, base_name, sequence_number) = self.serialize_name(&config.name);
		let contents = self.make_queue(&format!("contents of {}", name), config.capacity, true);
		let from_requesters = self.make_queue(&format!("takers of {}", name), None, true);
		let to_requesters = self.make_queue(&format!("givers of {}", name), None, true);

		let id = StoreID(self.stores.len());
		self.stores.push(Store{name: name.clone(), base_name, sequence_number, contents, from_requesters, to_requesters});
		self.max_name_len = self.max_name_len.max(name.len());
		self.log_named(&LogLevel::Debug, &name, "create");
		id
	}

	pub fn add_state<V: Into<StateValue>>(&mut self, name: &str, value: V) -> StateID
	{
		let (name, base_name, sequence_number) = self.serialize_name(name);
		let waiters = self.make_queue(&format!("waiters of {}", name), None, true);

		let id = StateID(self.states.len());
		let value = value.into();
		let message = format!("create, value={}", value);
		self.states.push(State{name: name.clone(), base_name, sequence_number, value, value_time: self.now_ticks, waiters});
		self.max_name_len = self.max_name_len.max(name.len());
		self.log_named(&LogLevel::Debug, &name, &message);
		id
	}

	/// Registers a statistics collector; every queue/resource/state/status
	/// mutation is reported to it with the old and new values and the
	/// time of the change.
	pub fn add_monitor(&mut self, monitor: Box<Monitor>)
	{
		self.monitors.push(monitor);
	}

	// --- accessors -------------------------------------------------------------

	/// The current simulation time in seconds.
	pub fn now(&self) -> f64
	{
		self.time_to_secs(self.now_ticks)
	}

	/// Rebases the time origin so that now() returns new_now. Relative
	/// ordering of scheduled events is unaffected.
	pub fn reset_now(&mut self, new_now: f64)
	{
		let ticks = (new_now*self.config.time_units).round() as i64;
		self.origin = Time(self.now_ticks.0 - ticks);
	}

	/// The time of the next component to become current, if any.
	pub fn peek(&self) -> Option<f64>
	{
		for id in self.pending_standby.iter() {
			if self.components.get(*id).status == Status::Standby {
				return Some(self.now());
			}
		}
		self.events.peek_earliest().map(|(key, _)| self.time_to_secs(key.time))
	}

	pub fn current_component(&self) -> ComponentID
	{
		self.current
	}

	pub fn main(&self) -> ComponentID
	{
		self.main_id
	}

	pub fn component(&self, id: ComponentID) -> &Component
	{
		self.components.get(id)
	}

	pub fn components<'a>(&'a self) -> Box<Iterator<Item=(ComponentID, &'a Component)> + 'a>
	{
		self.components.iter()
	}

	pub fn queue(&self, id: QueueID) -> &Queue
	{
		assert!(id != NO_QUEUE);
		self.queues.get(id.0).unwrap()
	}

	pub fn resource(&self, id: ResourceID) -> &Resource
	{
		assert!(id != NO_RESOURCE);
		self.resources.get(id.0).unwrap()
	}

	pub fn store(&self, id: StoreID) -> &Store
	{
		assert!(id != NO_STORE);
		self.stores.get(id.0).unwrap()
	}

	pub fn state(&self, id: StateID) -> &State
	{
		assert!(id != NO_STATE);
		self.states.get(id.0).unwrap()
	}

	/// The items currently sitting in a store, in deposit order.
	pub fn store_items(&self, id: StoreID) -> Vec<ComponentID>
	{
		let contents = self.store(id).contents;
		self.queue(contents).components()
	}

	/// Use this if a model wants random numbers: it is seeded from
	/// `Config::seed` so runs can be reproduced.
	pub fn rng(&mut self) -> &mut XorShiftRng
	{
		&mut self.rng
	}

	// --- run loop --------------------------------------------------------------

	/// Dispatches events until `Config::max_secs` is reached or there is
	/// no component left to schedule.
	pub fn run(&mut self) -> SimResult<()>
	{
		if self.config.max_secs.is_infinite() {
			self.run_exhaust()
		} else {
			let till = self.config.max_secs;
			self.run_until(till)
		}
	}

	/// Runs for a duration from the current time.
	pub fn run_for(&mut self, duration: f64) -> SimResult<()>
	{
		let till = self.now() + duration;
		self.run_until(till)
	}

	/// Runs until an absolute time. The wake-up for main is scheduled
	/// with the least possible urgency so all other events at that time
	/// are processed first. If the event list empties earlier, main is
	/// woken at the time of the last event instead.
	pub fn run_until(&mut self, till: f64) -> SimResult<()>
	{
		let time = self.secs_to_time(till);
		let main_id = self.main_id;
		self.reschedule(main_id, time, false, LEAST_URGENT, "run")?;
		self.run_loop()
	}

	fn run_exhaust(&mut self) -> SimResult<()>
	{
		let main_id = self.main_id;
		self.unschedule(main_id);
		self.components.get_mut(main_id).scheduled_time = TIME_NEVER;
		self.set_status(main_id, Status::Scheduled);
		self.run_loop()
	}

	fn run_loop(&mut self) -> SimResult<()>
	{
		loop {
			self.step()?;
			if self.current == self.main_id {
				let message = format!("run ended at {:.1$}", self.now(), self.precision);
				let main_id = self.main_id;
				self.trace(main_id, &message);
				return Ok(());
			}
		}
	}

	/// Executes the next slice: removes the earliest entry from the event
	/// list, advances the simulation time to its scheduled time, marks
	/// the popped component current, and invokes its body. For advanced
	/// use with external loops; normally you'll use run.
	pub fn step(&mut self) -> SimResult<()>
	{
		if self.in_body {
			return Err(SimError::BodyContractViolation("step cannot be called from a body".to_string()));
		}

		// Components that went standby get a turn before the next event,
		// skipping any whose status changed in the meantime.
		while !self.pending_standby.is_empty() {
			let id = self.pending_standby.remove(0);
			if self.components.get(id).status == Status::Standby {
				return self.execute(id);
			}
		}

		// When no component is left to schedule, main wakes at the time
		// of the last event, not at its synthetic wake-up time.
		let only_main = match self.events.len() {
			0 => true,
			1 => self.events.peek_earliest().unwrap().1 == self.main_id,
			_ => false,
		};
		if only_main {
			let main_id = self.main_id;
			self.unschedule(main_id);
			self.components.get_mut(main_id).scheduled_time = TIME_NEVER;
			return self.execute(main_id);
		}

		if !self.standby.is_empty() {
			self.pending_standby = mem::replace(&mut self.standby, Vec::new());
		}

		let (key, id) = self.events.pop_earliest().unwrap();
		assert!(key.time >= self.now_ticks);	// the event list can't order entries into the past
		self.now_ticks = key.time;
		self.components.get_mut(id).event_key = None;
		self.execute(id)
	}

	fn execute(&mut self, id: ComponentID) -> SimResult<()>
	{
		self.current = id;
		self.components.get_mut(id).scheduled_time = TIME_NEVER;
		self.set_status(id, Status::Current);
		self.trace(id, "current");

		// A deadline elapsed while requesting/waiting abandons the
		// pending synchronization and sets the failed flag.
		self.check_fail(id)?;

		if id == self.main_id {
			return Ok(());
		}

		let mut process = match self.components.take_process(id) {
			Some(process) => process,
			None => return Err(SimError::InvalidTransition(format!("component {} has no body to run", self.components.get(id).name))),
		};

		self.in_body = true;
		let result = {
			let mut context = Context{sim: self, id};
			process.process(&mut context)
		};
		self.in_body = false;

		match result {
			Ok(Transition::Terminate) => {
				self.finish(id)
			},
			Ok(transition) => {
				self.components.put_process(id, process);
				self.apply_transition(id, transition)
			},
			Err(err) => {
				self.components.put_process(id, process);
				Err(err)
			},
		}
	}

	fn apply_transition(&mut self, id: ComponentID, transition: Transition) -> SimResult<()>
	{
		match transition {
			Transition::Hold(hold) => self.apply_hold(id, hold),
			Transition::Passivate => self.apply_passivate(id),
			Transition::Standby => self.apply_standby(id),
			Transition::Request(request) => self.apply_request(id, request),
			Transition::Wait(wait) => self.apply_wait(id, wait),
			Transition::ToStore(put) => self.apply_to_store(id, put),
			Transition::FromStore(get) => self.apply_from_store(id, get),
			Transition::Terminate => unreachable!(),	// handled in execute
		}
	}

	fn finish(&mut self, id: ComponentID) -> SimResult<()>
	{
		self.release_all(id)?;
		self.components.get_mut(id).scheduled_time = TIME_NEVER;
		self.set_status(id, Status::Data);
		self.trace(id, "ended");
		Ok(())
	}

	// --- process interaction ---------------------------------------------------

	/// Moves a component into the scheduled state. Executes synchronously:
	/// only the current component may suspend itself, and it does that by
	/// returning a `Transition` from its body.
	pub fn activate(&mut self, id: ComponentID, activation: Activation) -> SimResult<()>
	{
		if id == self.main_id {
			return Err(SimError::InvalidTransition("main cannot be activated".to_string()));
		}
		if id == self.current {
			return Err(SimError::BodyContractViolation("a body cannot activate itself; return a Transition instead".to_string()));
		}

		let status = self.components.get(id).status;
		match status {
			Status::Data => {
				if self.components.get(id).process.is_none() {
					return Err(SimError::InvalidTransition(format!("cannot activate {} (it has no body)", self.components.get(id).name)));
				}
			},
			Status::Interrupted => {
				return Err(SimError::InvalidTransition("resume interrupted components instead of activating them".to_string()));
			},
			_ => (),
		}

		let time = self.activation_time(&activation)?;

		// Activating a requesting/waiting component normally abandons the
		// pending request/wait; keep_request/keep_wait just move the
		// deadline instead.
		if (status == Status::Requesting && activation.keep_request) || (status == Status::Waiting && activation.keep_wait) {
			let time = self.check_time(time)?;
			self.unschedule(id);
			self.components.get_mut(id).scheduled_time = time;
			if !time.is_never() {
				let key = self.events.schedule(id, time, activation.priority, activation.urgent);
				self.components.get_mut(id).event_key = Some(key);
			}
			self.trace(id, "activate (deadline moved)");
			return Ok(());
		}

		if status != Status::Data {
			self.unschedule(id);
			self.check_fail(id)?;
		}
		self.reschedule(id, time, activation.urgent, activation.priority, "activate")
	}

	/// Moves another component's wakeup time. Executes synchronously; the
	/// current component holds by returning `Transition::Hold`.
	pub fn hold(&mut self, id: ComponentID, hold: Hold) -> SimResult<()>
	{
		if id == self.current {
			return Err(SimError::BodyContractViolation("a body cannot hold itself; return Transition::Hold instead".to_string()));
		}
		self.check_interactable(id, "hold")?;

		self.unschedule(id);
		self.check_fail(id)?;
		self.apply_hold(id, hold)
	}

	/// Suspends another component with no wakeup time. Executes
	/// synchronously; the current component passivates by returning
	/// `Transition::Passivate`.
	pub fn passivate(&mut self, id: ComponentID) -> SimResult<()>
	{
		if id == self.current {
			return Err(SimError::BodyContractViolation("a body cannot passivate itself; return Transition::Passivate instead".to_string()));
		}
		self.check_interactable(id, "passivate")?;

		self.unschedule(id);
		self.check_fail(id)?;
		self.apply_passivate(id)
	}

	/// Puts another component in standby. Executes synchronously; the
	/// current component goes standby by returning `Transition::Standby`.
	pub fn standby(&mut self, id: ComponentID) -> SimResult<()>
	{
		if id == self.current {
			return Err(SimError::BodyContractViolation("a body cannot standby itself; return Transition::Standby instead".to_string()));
		}
		self.check_interactable(id, "standby")?;

		self.unschedule(id);
		self.check_fail(id)?;
		self.apply_standby(id)
	}

	/// Cancels a component: releases its claims, abandons its pending
	/// synchronization, removes it from the event list, and makes it a
	/// data component permanently. Cancelling an already-data component
	/// is a no-op.
	pub fn cancel(&mut self, id: ComponentID) -> SimResult<()>
	{
		if self.components.get(id).status == Status::Data {
			return Ok(());	// idempotent
		}
		if id == self.main_id {
			return Err(SimError::InvalidTransition("main cannot be cancelled".to_string()));
		}
		if id == self.current {
			return Err(SimError::BodyContractViolation("a body cannot cancel itself; return Transition::Terminate instead".to_string()));
		}

		self.check_fail(id)?;
		self.release_all(id)?;
		self.unschedule(id);
		{
			let component = self.components.get_mut(id);
			component.process = None;
			component.scheduled_time = TIME_NEVER;
			component.interrupt_level = 0;
		}
		self.set_status(id, Status::Data);
		self.trace(id, "cancelled");
		Ok(())
	}

	/// Forcibly suspends a component, capturing its remaining time to
	/// event so a later resume can restore it. Repeated interrupts stack.
	pub fn interrupt(&mut self, id: ComponentID) -> SimResult<()>
	{
		if id == self.current {
			return Err(SimError::InvalidTransition("cannot interrupt the current component".to_string()));
		}

		let status = self.components.get(id).status;
		match status {
			Status::Interrupted => {
				let component = self.components.get_mut(id);
				component.interrupt_level += 1;
				let level = component.interrupt_level;
				self.trace(id, &format!("interrupt (level {})", level));
				Ok(())
			},
			Status::Scheduled | Status::Waiting | Status::Requesting => {
				let remaining = {
					let component = self.components.get(id);
					if component.scheduled_time.is_never() {
						TIME_NEVER
					} else {
						Time(component.scheduled_time.0 - self.now_ticks.0)
					}
				};
				self.unschedule(id);
				{
					let component = self.components.get_mut(id);
					component.interrupted_status = status;
					component.remaining_duration = remaining;
					component.interrupt_level = 1;
					component.scheduled_time = TIME_NEVER;
				}
				self.set_status(id, Status::Interrupted);
				self.trace(id, "interrupt");
				Ok(())
			},
			Status::Passive => {
				{
					let component = self.components.get_mut(id);
					component.interrupted_status = Status::Passive;
					component.interrupt_level = 1;
				}
				self.set_status(id, Status::Interrupted);
				self.trace(id, "interrupt");
				Ok(())
			},
			_ => Err(SimError::InvalidTransition(format!("cannot interrupt a {} component", status))),
		}
	}

	/// Undoes one level of interrupt (or all of them). When the level
	/// reaches zero the component returns to its pre-interrupt status,
	/// re-deriving its wakeup/deadline from the captured remaining
	/// duration and re-attempting honor for requests and waits.
	pub fn resume(&mut self, id: ComponentID, all: bool) -> SimResult<()>
	{
		if self.components.get(id).status != Status::Interrupted {
			return Err(SimError::InvalidTransition(format!("cannot resume a {} component", self.components.get(id).status)));
		}

		let level = {
			let component = self.components.get_mut(id);
			component.interrupt_level = if all {0} else {component.interrupt_level - 1};
			component.interrupt_level
		};
		if level > 0 {
			self.trace(id, &format!("resume (still interrupted, level {})", level));
			return Ok(());
		}

		let (pre_status, remaining, priority, urgent) = {
			let component = self.components.get(id);
			(component.interrupted_status, component.remaining_duration, component.saved_priority, component.saved_urgent)
		};
		let time = if remaining.is_never() {TIME_NEVER} else {Time(self.now_ticks.0 + remaining.0)};

		match pre_status {
			Status::Passive => {
				self.components.get_mut(id).scheduled_time = TIME_NEVER;
				self.set_status(id, Status::Passive);
				self.trace(id, "resume (passive)");
				Ok(())
			},
			Status::Scheduled => {
				self.reschedule(id, time, urgent, priority, "resume")
			},
			Status::Requesting => {
				self.block(id, Status::Requesting, time)?;
				self.trace(id, "resume (requesting)");
				self.try_request(id)?;
				Ok(())
			},
			Status::Waiting => {
				self.block(id, Status::Waiting, time)?;
				self.trace(id, "resume (waiting)");
				self.try_wait(id)?;
				Ok(())
			},
			_ => unreachable!(),
		}
	}

	/// Sets the user visible mode tag of a component, recording the time
	/// of the change.
	pub fn set_mode(&mut self, id: ComponentID, mode: &str)
	{
		let now = self.now_ticks;
		let component = self.components.get_mut(id);
		component.mode = mode.to_string();
		component.mode_time = now;
	}

	// --- queues ----------------------------------------------------------------

	/// Adds the component to the tail of a queue, taking over the tail's
	/// priority. Fails with CapacityExceeded if the queue is full.
	pub fn enter(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		self.check_model_queue(queue)?;
		self.do_enter_tail(queue, id)
	}

	/// Adds the component to a queue, sorted by priority. Equal-priority
	/// entries keep FIFO order.
	pub fn enter_sorted(&mut self, queue: QueueID, id: ComponentID, priority: Priority) -> SimResult<()>
	{
		self.check_model_queue(queue)?;
		self.do_enter_sorted(queue, id, priority)
	}

	pub fn enter_at_head(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		self.check_model_queue(queue)?;
		self.do_enter_head(queue, id)
	}

	pub fn leave(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		self.check_model_queue(queue)?;
		self.do_leave(queue, id)
	}

	/// Removes the component from every queue it is a member of except
	/// the internal resource/store/state queues.
	pub fn leave_all(&mut self, id: ComponentID) -> SimResult<()>
	{
		let queues: Vec<QueueID> = self.components.get(id).queues.iter()
			.cloned()
			.filter(|q| !self.queues[q.0].internal)
			.collect();
		for queue in queues {
			self.do_leave(queue, id)?;
		}
		Ok(())
	}

	/// Changes the priority of a member, re-sorting it stably.
	pub fn change_priority(&mut self, queue: QueueID, id: ComponentID, priority: Priority) -> SimResult<()>
	{
		self.check_model_queue(queue)?;
		self.queues[queue.0].change_priority(id, priority)
	}

	/// Membership snapshot in queue order. The live queue may be mutated
	/// while walking the snapshot; callers that care should re-validate
	/// membership with `Queue::contains`.
	pub fn queue_components(&self, queue: QueueID) -> Vec<ComponentID>
	{
		self.queue(queue).components()
	}

	/// Returns a new queue holding the members of a then the members of
	/// b, de-duplicated. Order and priorities of the sources are ignored.
	pub fn union(&mut self, a: QueueID, b: QueueID, name: &str) -> SimResult<QueueID>
	{
		let mut members = self.queue(a).components();
		for id in self.queue(b).components() {
			if !members.contains(&id) {
				members.push(id);
			}
		}
		self.collect_queue(members, name)
	}

	/// Returns a new queue holding the members of a that are also in b.
	pub fn intersection(&mut self, a: QueueID, b: QueueID, name: &str) -> SimResult<QueueID>
	{
		let members: Vec<ComponentID> = self.queue(a).components().into_iter()
			.filter(|id| self.queue(b).contains(*id))
			.collect();
		self.collect_queue(members, name)
	}

	/// Returns a new queue holding the members of a that are not in b.
	pub fn difference(&mut self, a: QueueID, b: QueueID, name: &str) -> SimResult<QueueID>
	{
		let members: Vec<ComponentID> = self.queue(a).components().into_iter()
			.filter(|id| !self.queue(b).contains(*id))
			.collect();
		self.collect_queue(members, name)
	}

	/// Returns a new queue holding the members in exactly one of a and b.
	pub fn symmetric_difference(&mut self, a: QueueID, b: QueueID, name: &str) -> SimResult<QueueID>
	{
		let mut members: Vec<ComponentID> = self.queue(a).components().into_iter()
			.filter(|id| !self.queue(b).contains(*id))
			.collect();
		for id in self.queue(b).components() {
			if !self.queue(a).contains(id) {
				members.push(id);
			}
		}
		self.collect_queue(members, name)
	}

	/// Returns a new queue with the same members and priorities.
	pub fn copy_queue(&mut self, source: QueueID, name: &str) -> SimResult<QueueID>
	{
		let entries: Vec<(ComponentID, Priority)> = self.queue(source).entries().iter()
			.map(|entry| (entry.component, entry.priority))
			.collect();
		let queue = self.add_queue(name, None);
		for (id, priority) in entries {
			self.do_enter_sorted(queue, id, priority)?;
		}
		Ok(queue)
	}

	// --- resources -------------------------------------------------------------

	/// Releases a quantity (default: the whole claim) the component holds
	/// on a resource and re-runs the honor algorithm.
	pub fn release(&mut self, id: ComponentID, resource: ResourceID, quantity: Option<f64>) -> SimResult<()>
	{
		let claim = {
			let component = self.components.get(id);
			match component.claims.iter().find(|claim| claim.0 == resource) {
				Some(claim) => claim.1,
				None => return Err(SimError::InvalidTransition(format!("{} is not claiming from {}", component.name, self.resources[resource.0].name))),
			}
		};
		let quantity = match quantity {
			Some(quantity) => if quantity > claim {claim} else {quantity},
			None => claim,
		};

		let old = self.resources[resource.0].claimed_quantity;
		self.resources[resource.0].claimed_quantity -= quantity;
		self.notify_resource_claim(resource, old, old - quantity);

		let remaining = claim - quantity;
		if remaining < 1e-8 {
			let index = self.components.get(id).claims.iter().position(|claim| claim.0 == resource).unwrap();
			self.components.get_mut(id).claims.remove(index);
			let claimers = self.resources[resource.0].claimers;
			self.do_leave(claimers, id)?;
			if self.queues[claimers.0].is_empty() && !self.resources[resource.0].anonymous {
				self.resources[resource.0].claimed_quantity = 0.0;	// avoid rounding drift
			}
		} else {
			let index = self.components.get(id).claims.iter().position(|claim| claim.0 == resource).unwrap();
			self.components.get_mut(id).claims[index].1 = remaining;
		}

		let message = format!("release {} from {}", quantity, self.resources[resource.0].name);
		self.trace(id, &message);
		self.try_honor_resource(resource)
	}

	/// Releases every claim the component holds.
	pub fn release_all(&mut self, id: ComponentID) -> SimResult<()>
	{
		let claimed: Vec<ResourceID> = self.components.get(id).claims.iter().map(|claim| claim.0).collect();
		for resource in claimed {
			self.release(id, resource, None)?;
		}
		Ok(())
	}

	/// Resource level release. For anonymous resources this returns a
	/// quantity (default: everything) to the pool; for normal resources
	/// it releases every claimer completely.
	pub fn resource_release(&mut self, resource: ResourceID, quantity: Option<f64>) -> SimResult<()>
	{
		if self.resources[resource.0].anonymous {
			let old = self.resources[resource.0].claimed_quantity;
			let quantity = quantity.unwrap_or(old);
			let mut new = old - quantity;
			if new.abs() < 1e-8 {
				new = 0.0;
			}
			self.resources[resource.0].claimed_quantity = new;
			self.notify_resource_claim(resource, old, new);
			self.try_honor_resource(resource)
		} else {
			if quantity.is_some() {
				return Err(SimError::InvalidTransition("no quantity allowed when releasing a non-anonymous resource".to_string()));
			}
			let claimers = self.resources[resource.0].claimers;
			let ids = self.queues[claimers.0].components();
			for id in ids {
				if self.queues[claimers.0].contains(id) {
					self.release(id, resource, None)?;
				}
			}
			Ok(())
		}
	}

	/// Changes the capacity of a resource at run time. This may honor
	/// pending requests.
	pub fn set_capacity(&mut self, resource: ResourceID, capacity: f64) -> SimResult<()>
	{
		assert!(capacity >= 0.0, "capacity ({}) should not be negative", capacity);

		let old = self.resources[resource.0].capacity;
		self.resources[resource.0].capacity = capacity;
		self.notify_resource_capacity(resource, old, capacity);
		self.try_honor_resource(resource)
	}

	// --- states ----------------------------------------------------------------

	/// Sets the value of a state. On a change the waiters queue is
	/// re-scanned in order and every waiter whose condition now holds is
	/// woken: satisfying one waiter does not consume anything.
	pub fn set_state<V: Into<StateValue>>(&mut self, state: StateID, value: V) -> SimResult<()>
	{
		let value = value.into();
		if self.states[state.0].value != value {
			self.write_state(state, value);
			self.scan_waiters(state, None)?;
		}
		Ok(())
	}

	/// Resets the state to false. Identical to set_state except for the
	/// default value.
	pub fn reset_state(&mut self, state: StateID) -> SimResult<()>
	{
		self.set_state(state, false)
	}

	/// Sets the value, wakes up to `limit` waiters (default unlimited),
	/// then sets the value to value_after (default: the value before the
	/// trigger) and re-scans once more.
	pub fn trigger<V: Into<StateValue>>(&mut self, state: StateID, value: V, value_after: Option<StateValue>, limit: Option<usize>) -> SimResult<()>
	{
		let value_after = value_after.unwrap_or_else(|| self.states[state.0].value.clone());
		self.write_state(state, value.into());
		self.scan_waiters(state, limit)?;
		self.write_state(state, value_after);
		self.scan_waiters(state, None)
	}

	// --- stores ----------------------------------------------------------------

	/// Changes the size limit of a store at run time. This may honor
	/// pending depositors.
	pub fn set_store_capacity(&mut self, store: StoreID, capacity: Option<usize>) -> SimResult<()>
	{
		let contents = self.stores[store.0].contents;
		self.queues[contents.0].capacity = capacity;
		self.store_rescan(store)
	}

	// --- logging ---------------------------------------------------------------

	/// Normally you'll use one of the log macros, e.g. log_info!.
	pub fn log(&self, level: LogLevel, message: &str)
	{
		self.log_named(&level, "simulation", message);
	}

	#[doc(hidden)]
	pub fn log_component(&self, level: &LogLevel, id: ComponentID, message: &str)
	{
		let name = &self.components.get(id).name;
		self.log_named(level, name, message);
	}

	// --- internals -------------------------------------------------------------

	fn check_interactable(&self, id: ComponentID, caller: &str) -> SimResult<()>
	{
		let status = self.components.get(id).status;
		match status {
			Status::Data => Err(SimError::InvalidTransition(format!("cannot {} a data component", caller))),
			Status::Interrupted => Err(SimError::InvalidTransition(format!("cannot {} an interrupted component (resume it first)", caller))),
			_ => Ok(()),
		}
	}

	fn check_model_queue(&self, queue: QueueID) -> SimResult<()>
	{
		if self.queue(queue).internal {
			Err(SimError::InvalidTransition(format!("{} is maintained by the kernel", self.queue(queue).name)))
		} else {
			Ok(())
		}
	}

	fn activation_time(&self, activation: &Activation) -> SimResult<Time>
	{
		let base = match activation.at {
			Some(at) => self.secs_to_time(at),
			None => self.now_ticks,
		};
		Ok(self.add_secs(base, activation.delay))
	}

	fn apply_hold(&mut self, id: ComponentID, hold: Hold) -> SimResult<()>
	{
		let time = match (hold.duration, hold.till) {
			(Some(_), Some(_)) => return Err(SimError::InvalidTransition("both duration and till specified".to_string())),
			(Some(duration), None) => self.add_secs(self.now_ticks, duration),
			(None, Some(till)) => self.secs_to_time(till),
			(None, None) => self.now_ticks,
		};
		self.reschedule(id, time, hold.urgent, hold.priority, "hold")
	}

	fn apply_passivate(&mut self, id: ComponentID) -> SimResult<()>
	{
		self.components.get_mut(id).scheduled_time = TIME_NEVER;
		self.set_status(id, Status::Passive);
		self.trace(id, "passivate");
		Ok(())
	}

	fn apply_standby(&mut self, id: ComponentID) -> SimResult<()>
	{
		if id == self.main_id {
			return Err(SimError::InvalidTransition("main cannot standby".to_string()));
		}
		let now = self.now_ticks;
		self.components.get_mut(id).scheduled_time = now;
		self.set_status(id, Status::Standby);
		self.standby.push(id);
		self.trace(id, "standby");
		Ok(())
	}

	fn apply_request(&mut self, id: ComponentID, request: Request) -> SimResult<()>
	{
		if request.specs.is_empty() {
			return Err(SimError::InvalidTransition("request needs at least one resource".to_string()));
		}
		for spec in request.specs.iter() {
			let resource = &self.resources[spec.resource.0];
			if spec.quantity == 0.0 {
				return Err(SimError::InvalidTransition(format!("cannot request 0 from {}", resource.name)));
			}
			if spec.quantity < 0.0 && !resource.anonymous {
				return Err(SimError::InvalidTransition(format!("cannot request a negative quantity from {} (it is not anonymous)", resource.name)));
			}
			if resource.preemptive && request.specs.len() > 1 {
				return Err(SimError::InvalidTransition(format!("a request for preemptive {} cannot include other resources", resource.name)));
			}
		}
		let deadline = self.deadline(request.fail_at, request.fail_delay)?;

		// If the same resource is specified more than once the
		// quantities are summed.
		let mut merged: Vec<(ResourceID, f64, Option<Priority>)> = Vec::new();
		for spec in request.specs.iter() {
			match merged.iter().position(|entry| entry.0 == spec.resource) {
				Some(index) => {
					merged[index].1 += spec.quantity;
					if merged[index].2.is_none() {
						merged[index].2 = spec.priority;
					}
				},
				None => merged.push((spec.resource, spec.quantity, spec.priority)),
			}
		}

		{
			let component = self.components.get_mut(id);
			component.failed = false;
			component.oneof = request.oneof;
		}

		let mut entries = Vec::with_capacity(merged.len());
		for (resource, quantity, priority) in merged {
			let requesters = self.resources[resource.0].requesters;
			match priority {
				Some(priority) => self.do_enter_sorted(requesters, id, priority)?,
				None => self.do_enter_tail(requesters, id)?,
			}
			let priority = self.queues[requesters.0].priority_of(id).unwrap();
			let message = format!("request {} from {}", quantity, self.resources[resource.0].name);
			self.trace(id, &message);
			entries.push(RequestEntry{resource, quantity, priority});
		}
		self.components.get_mut(id).requests = entries;

		let honored = self.try_request(id)?;
		if !honored {
			let (preemptive, resource) = {
				let component = self.components.get(id);
				let resource = component.requests[0].resource;
				(self.resources[resource.0].preemptive && component.requests.len() == 1, resource)
			};
			if preemptive && self.try_bump(id, resource)? {
				self.try_request(id)?;
			}
		}

		if !self.components.get(id).requests.is_empty() {
			self.block(id, Status::Requesting, deadline)?;
		}
		Ok(())
	}

	/// Honors the component's outstanding requests if every AND member
	/// (or one OR member) is satisfiable right now; otherwise leaves it
	/// pending. Honoring atomically moves the quantities from available
	/// to claimed, moves the component from requesters to claimers
	/// preserving its priority, and reschedules it for the current time.
	fn try_request(&mut self, id: ComponentID) -> SimResult<bool>
	{
		let honored: Option<Vec<usize>> = {
			let component = self.components.get(id);
			if component.requests.is_empty() {
				return Ok(false);
			}
			if component.oneof {
				component.requests.iter()
					.position(|request| request.quantity <= self.resources[request.resource.0].available_quantity() + 1e-8)
					.map(|index| vec![index])
			} else {
				let ok = component.requests.iter()
					.all(|request| request.quantity <= self.resources[request.resource.0].available_quantity() + 1e-8);
				if ok {Some((0..component.requests.len()).collect())} else {None}
			}
		};
		let honored = match honored {
			Some(honored) => honored,
			None => return Ok(false),
		};

		let claims: Vec<(ResourceID, f64, Priority)> = {
			let component = self.components.get(id);
			honored.iter().map(|&index| {
				let request = &component.requests[index];
				(request.resource, request.quantity, request.priority)
			}).collect()
		};
		let requested: Vec<ResourceID> = self.components.get(id).requests.iter().map(|request| request.resource).collect();

		for (resource, quantity, priority) in claims {
			let old = self.resources[resource.0].claimed_quantity;
			self.resources[resource.0].claimed_quantity = old + quantity;
			self.notify_resource_claim(resource, old, old + quantity);

			if !self.resources[resource.0].anonymous {
				let claimers = self.resources[resource.0].claimers;
				let merged = {
					let component = self.components.get_mut(id);
					match component.claims.iter().position(|claim| claim.0 == resource) {
						Some(index) => {
							component.claims[index].1 += quantity;
							true
						},
						None => {
							component.claims.push((resource, quantity));
							false
						},
					}
				};
				if !merged {
					self.do_enter_sorted(claimers, id, priority)?;
				}
			}
			let message = format!("claim {} from {}", quantity, self.resources[resource.0].name);
			self.trace(id, &message);
		}

		for resource in requested {
			let requesters = self.resources[resource.0].requesters;
			self.do_leave(requesters, id)?;
		}
		{
			let component = self.components.get_mut(id);
			component.requests.clear();
			component.oneof = false;
		}

		self.unschedule(id);
		let now = self.now_ticks;
		self.reschedule(id, now, false, 0, "request honor")?;
		Ok(true)
	}

	/// The honor algorithm, invoked whenever capacity, requester order,
	/// or requester content changes: scan the requesters in queue order,
	/// honoring every requester whose whole spec is satisfiable.
	fn try_honor_resource(&mut self, resource: ResourceID) -> SimResult<()>
	{
		let requesters = self.resources[resource.0].requesters;
		let only_first = self.resources[resource.0].honor_only_first;
		let only_highest = self.resources[resource.0].honor_only_highest_priority;

		let snapshot = self.queues[requesters.0].components();
		if snapshot.is_empty() {
			return Ok(());
		}
		let head_priority = self.queues[requesters.0].entries()[0].priority;

		for id in snapshot {
			if !self.queues[requesters.0].contains(id) {
				continue;	// honored via another resource of its spec, or abandoned
			}
			if only_highest && self.queues[requesters.0].priority_of(id) != Some(head_priority) {
				break;	// the queue is priority ordered so nothing further is eligible
			}
			let honored = self.try_request(id)?;
			if !honored && only_first {
				break;
			}
		}
		Ok(())
	}

	/// Preemption: frees enough capacity for the requester by bumping
	/// claims with strictly lower priority, worst priority first. All or
	/// nothing: when the bumpable claims cannot cover the request no
	/// claim is touched. Bumped claimers lose their claim and become
	/// interrupted.
	fn try_bump(&mut self, id: ComponentID, resource: ResourceID) -> SimResult<bool>
	{
		let requesters = self.resources[resource.0].requesters;
		let claimers = self.resources[resource.0].claimers;
		let my_priority = self.queues[requesters.0].priority_of(id).unwrap_or(0);
		let needed = self.components.get(id).requests[0].quantity;
		let available = self.resources[resource.0].available_quantity();

		let mut bumped: Vec<ComponentID> = Vec::new();
		let mut freed = 0.0;
		for entry in self.queues[claimers.0].entries().iter().rev() {
			if available + freed + 1e-8 >= needed {
				break;
			}
			if entry.priority <= my_priority {
				break;	// priority ordered: everything nearer the head is at least as urgent
			}
			match self.components.get(entry.component).status {
				Status::Scheduled | Status::Passive | Status::Waiting | Status::Requesting | Status::Interrupted => (),
				_ => continue,	// not bumpable
			}
			freed += self.components.get(entry.component).claimed_quantity(resource);
			bumped.push(entry.component);
		}

		if available + freed + 1e-8 < needed {
			return Ok(false);
		}

		for claimer in bumped {
			let quantity = self.components.get(claimer).claimed_quantity(resource);
			let old = self.resources[resource.0].claimed_quantity;
			self.resources[resource.0].claimed_quantity = old - quantity;
			self.notify_resource_claim(resource, old, old - quantity);

			let index = self.components.get(claimer).claims.iter().position(|claim| claim.0 == resource).unwrap();
			self.components.get_mut(claimer).claims.remove(index);
			self.do_leave(claimers, claimer)?;

			let message = format!("bumped from {}", self.resources[resource.0].name);
			self.trace(claimer, &message);
			self.interrupt(claimer)?;
		}
		Ok(true)
	}

	fn apply_wait(&mut self, id: ComponentID, wait: Wait) -> SimResult<()>
	{
		if wait.conds.is_empty() {
			return Err(SimError::InvalidTransition("wait needs at least one condition".to_string()));
		}
		let deadline = self.deadline(wait.fail_at, wait.fail_delay)?;

		{
			let component = self.components.get_mut(id);
			component.failed = false;
			component.wait_all = wait.all;
		}

		let mut conds = Vec::with_capacity(wait.conds.len());
		for spec in wait.conds {
			let waiters = self.states[spec.state.0].waiters;
			// It is allowed to wait for more than one value of a state:
			// the component enters the waiters queue only once.
			if !self.queues[waiters.0].contains(id) {
				match spec.priority {
					Some(priority) => self.do_enter_sorted(waiters, id, priority)?,
					None => self.do_enter_tail(waiters, id)?,
				}
			}
			let message = format!("wait for {}", self.states[spec.state.0].name);
			self.trace(id, &message);
			conds.push(WaitCond{state: spec.state, test: spec.test});
		}
		self.components.get_mut(id).waits = conds;

		let honored = self.try_wait(id)?;
		if !honored {
			self.block(id, Status::Waiting, deadline)?;
		}
		Ok(())
	}

	/// Honors the component's wait if its conditions hold right now.
	fn try_wait(&mut self, id: ComponentID) -> SimResult<bool>
	{
		let honored = {
			let component = self.components.get(id);
			if component.waits.is_empty() {
				return Ok(false);
			}
			if component.wait_all {
				component.waits.iter().all(|wait| wait.test.holds(&self.states[wait.state.0].value))
			} else {
				component.waits.iter().any(|wait| wait.test.holds(&self.states[wait.state.0].value))
			}
		};
		if !honored {
			return Ok(false);
		}

		let mut states: Vec<StateID> = Vec::new();
		for wait in self.components.get(id).waits.iter() {
			if !states.contains(&wait.state) {
				states.push(wait.state);
			}
		}
		for state in states {
			let waiters = self.states[state.0].waiters;
			self.do_leave(waiters, id)?;
		}
		self.components.get_mut(id).waits.clear();

		self.unschedule(id);
		let now = self.now_ticks;
		self.reschedule(id, now, false, 0, "wait honor")?;
		Ok(true)
	}

	fn write_state(&mut self, state: StateID, value: StateValue)
	{
		let old = mem::replace(&mut self.states[state.0].value, value);
		self.states[state.0].value_time = self.now_ticks;

		let new = self.states[state.0].value.clone();
		let message = format!("set to {}", new);
		let name = self.states[state.0].name.clone();
		self.log_named(&LogLevel::Debug, &name, &message);
		self.notify_state(state, &old, &new);
	}

	/// Wakes waiters whose condition now holds, in queue order, up to an
	/// optional limit. One mutation may release many waiters.
	fn scan_waiters(&mut self, state: StateID, limit: Option<usize>) -> SimResult<()>
	{
		let waiters = self.states[state.0].waiters;
		let snapshot = self.queues[waiters.0].components();
		let mut honored = 0;
		for id in snapshot {
			if !self.queues[waiters.0].contains(id) {
				continue;
			}
			if self.try_wait(id)? {
				honored += 1;
				if limit == Some(honored) {
					break;
				}
			}
		}
		Ok(())
	}

	fn apply_to_store(&mut self, id: ComponentID, put: ToStore) -> SimResult<()>
	{
		if put.item == id {
			return Err(SimError::InvalidTransition("a component cannot store itself".to_string()));
		}
		let deadline = self.deadline(put.fail_at, put.fail_delay)?;
		self.components.get_mut(id).failed = false;

		let contents = self.stores[put.store.0].contents;
		if self.has_room(contents) {
			self.do_enter_tail(contents, put.item)?;
			let message = format!("stores {} into {}", self.components.get(put.item).name, self.stores[put.store.0].name);
			self.trace(id, &message);

			let now = self.now_ticks;
			self.reschedule(id, now, false, 0, "to_store honor")?;
			self.store_rescan(put.store)
		} else {
			let to_requesters = self.stores[put.store.0].to_requesters;
			match put.priority {
				Some(priority) => self.do_enter_sorted(to_requesters, id, priority)?,
				None => self.do_enter_tail(to_requesters, id)?,
			}
			self.components.get_mut(id).putting = Some(PendingPut{store: put.store, item: put.item});
			let message = format!("to_store {} (full)", self.stores[put.store.0].name);
			self.trace(id, &message);
			self.block(id, Status::Requesting, deadline)
		}
	}

	fn apply_from_store(&mut self, id: ComponentID, get: FromStore) -> SimResult<()>
	{
		let deadline = self.deadline(get.fail_at, get.fail_delay)?;
		{
			let component = self.components.get_mut(id);
			component.failed = false;
			component.retrieved = None;
		}

		match self.find_store_match(get.store, &get.filter, &get.key) {
			Some(item) => {
				let contents = self.stores[get.store.0].contents;
				self.do_leave(contents, item)?;
				self.components.get_mut(id).retrieved = Some(item);
				let message = format!("takes {} from {}", self.components.get(item).name, self.stores[get.store.0].name);
				self.trace(id, &message);

				let now = self.now_ticks;
				self.reschedule(id, now, false, 0, "from_store honor")?;
				self.store_rescan(get.store)
			},
			None => {
				let from_requesters = self.stores[get.store.0].from_requesters;
				match get.priority {
					Some(priority) => self.do_enter_sorted(from_requesters, id, priority)?,
					None => self.do_enter_tail(from_requesters, id)?,
				}
				self.components.get_mut(id).getting = Some(PendingGet{store: get.store, filter: get.filter, key: get.key});
				let message = format!("from_store {} (no match)", self.stores[get.store.0].name);
				self.trace(id, &message);
				self.block(id, Status::Requesting, deadline)
			},
		}
	}

	/// Scans the store's contents for entries matching the filter; among
	/// matches the one with the minimal key wins, ties broken by store
	/// order.
	fn find_store_match(&self, store: StoreID, filter: &Option<Box<Fn(&Component) -> bool>>, key: &Option<Box<Fn(&Component) -> i64>>) -> Option<ComponentID>
	{
		let contents = self.stores[store.0].contents;
		let mut best: Option<(i64, ComponentID)> = None;
		for entry in self.queues[contents.0].entries() {
			let component = self.components.get(entry.component);
			let matched = match filter {
				&Some(ref filter) => filter(component),
				&None => true,
			};
			if matched {
				match key {
					&Some(ref key) => {
						let value = key(component);
						let better = match best {
							Some((best_value, _)) => value < best_value,
							None => true,
						};
						if better {
							best = Some((value, entry.component));
						}
					},
					&None => return Some(entry.component),
				}
			}
		}
		best.map(|(_, id)| id)
	}

	/// Every store mutation triggers a rescan that attempts to honor
	/// pending takers and depositors until nothing more can be honored.
	fn store_rescan(&mut self, store: StoreID) -> SimResult<()>
	{
		loop {
			let mut progress = false;

			let from_requesters = self.stores[store.0].from_requesters;
			let takers = self.queues[from_requesters.0].components();
			for id in takers {
				if !self.queues[from_requesters.0].contains(id) {
					continue;
				}
				let item = {
					let component = self.components.get(id);
					let getting = component.getting.as_ref().unwrap();
					self.find_store_match(store, &getting.filter, &getting.key)
				};
				if let Some(item) = item {
					let contents = self.stores[store.0].contents;
					self.do_leave(contents, item)?;
					{
						let component = self.components.get_mut(id);
						component.getting = None;
						component.retrieved = Some(item);
					}
					self.do_leave(from_requesters, id)?;
					self.unschedule(id);
					let now = self.now_ticks;
					self.reschedule(id, now, false, 0, "from_store honor")?;
					progress = true;
				}
			}

			let to_requesters = self.stores[store.0].to_requesters;
			let givers = self.queues[to_requesters.0].components();
			for id in givers {
				if !self.queues[to_requesters.0].contains(id) {
					continue;
				}
				let contents = self.stores[store.0].contents;
				if !self.has_room(contents) {
					break;
				}
				let item = self.components.get(id).putting.as_ref().unwrap().item;
				self.do_enter_tail(contents, item)?;
				self.components.get_mut(id).putting = None;
				self.do_leave(to_requesters, id)?;
				self.unschedule(id);
				let now = self.now_ticks;
				self.reschedule(id, now, false, 0, "to_store honor")?;
				progress = true;
			}

			if !progress {
				return Ok(());
			}
		}
	}

	fn has_room(&self, contents: QueueID) -> bool
	{
		match self.queues[contents.0].capacity {
			Some(capacity) => self.queues[contents.0].len() < capacity,
			None => true,
		}
	}

	/// Abandons any pending request/wait/store rendezvous, setting the
	/// failed flag. Used when a deadline elapses and when another
	/// component forcibly reschedules this one.
	fn check_fail(&mut self, id: ComponentID) -> SimResult<()>
	{
		let requested: Vec<ResourceID> = {
			let component = self.components.get(id);
			component.requests.iter().map(|request| request.resource).collect()
		};
		if !requested.is_empty() {
			for resource in requested.iter() {
				let requesters = self.resources[resource.0].requesters;
				self.do_leave(requesters, id)?;
			}
			{
				let component = self.components.get_mut(id);
				component.requests.clear();
				component.oneof = false;
				component.failed = true;
			}
			self.trace(id, "request failed");
			for resource in requested {
				self.try_honor_resource(resource)?;	// requester content changed
			}
		}

		let waited: Vec<StateID> = {
			let component = self.components.get(id);
			let mut states = Vec::new();
			for wait in component.waits.iter() {
				if !states.contains(&wait.state) {
					states.push(wait.state);
				}
			}
			states
		};
		if !waited.is_empty() {
			for state in waited {
				let waiters = self.states[state.0].waiters;
				self.do_leave(waiters, id)?;
			}
			{
				let component = self.components.get_mut(id);
				component.waits.clear();
				component.failed = true;
			}
			self.trace(id, "wait failed");
		}

		if self.components.get(id).putting.is_some() {
			let store = self.components.get(id).putting.as_ref().unwrap().store;
			let to_requesters = self.stores[store.0].to_requesters;
			self.do_leave(to_requesters, id)?;
			{
				let component = self.components.get_mut(id);
				component.putting = None;
				component.failed = true;
			}
			self.trace(id, "to_store failed");
		}

		if self.components.get(id).getting.is_some() {
			let store = self.components.get(id).getting.as_ref().unwrap().store;
			let from_requesters = self.stores[store.0].from_requesters;
			self.do_leave(from_requesters, id)?;
			{
				let component = self.components.get_mut(id);
				component.getting = None;
				component.failed = true;
			}
			self.trace(id, "from_store failed");
		}
		Ok(())
	}

	/// Files the component on the event list with a wakeup time and makes
	/// it scheduled. Times before now raise OrderingViolation unless
	/// `Config::cap_now` clamps them.
	fn reschedule(&mut self, id: ComponentID, time: Time, urgent: bool, priority: Priority, caller: &str) -> SimResult<()>
	{
		let time = self.check_time(time)?;
		self.unschedule(id);
		{
			let component = self.components.get_mut(id);
			component.scheduled_time = time;
			component.saved_priority = priority;
			component.saved_urgent = urgent;
		}
		if !time.is_never() {
			let key = self.events.schedule(id, time, priority, urgent);
			self.components.get_mut(id).event_key = Some(key);
		}
		self.set_status(id, Status::Scheduled);

		let message = if time.is_never() {
			format!("{} scheduled for never", caller)
		} else {
			format!("{} scheduled for {:.2$}", caller, self.time_to_secs(time), self.precision)
		};
		self.trace(id, &message);
		Ok(())
	}

	/// Parks the component as requesting/waiting, filing the deadline on
	/// the event list when there is one.
	fn block(&mut self, id: ComponentID, status: Status, deadline: Time) -> SimResult<()>
	{
		let deadline = self.check_time(deadline)?;
		self.unschedule(id);
		{
			let component = self.components.get_mut(id);
			component.scheduled_time = deadline;
			component.saved_priority = 0;
			component.saved_urgent = false;
		}
		if !deadline.is_never() {
			let key = self.events.schedule(id, deadline, 0, false);
			self.components.get_mut(id).event_key = Some(key);
		}
		self.set_status(id, status);
		Ok(())
	}

	fn unschedule(&mut self, id: ComponentID)
	{
		if let Some(key) = self.components.get_mut(id).event_key.take() {
			self.events.unschedule(&key);
		}
	}

	fn check_time(&self, time: Time) -> SimResult<Time>
	{
		if time < self.now_ticks {
			if self.config.cap_now {
				Ok(self.now_ticks)
			} else {
				Err(SimError::OrderingViolation{scheduled: self.time_to_secs(time), now: self.now()})
			}
		} else {
			Ok(time)
		}
	}

	fn deadline(&self, fail_at: Option<f64>, fail_delay: Option<f64>) -> SimResult<Time>
	{
		match (fail_at, fail_delay) {
			(Some(_), Some(_)) => Err(SimError::InvalidTransition("both fail_at and fail_delay specified".to_string())),
			(Some(at), None) => Ok(self.secs_to_time(at)),
			(None, Some(delay)) => Ok(self.add_secs(self.now_ticks, delay)),
			(None, None) => Ok(TIME_NEVER),
		}
	}

	fn set_status(&mut self, id: ComponentID, new: Status)
	{
		let old = self.components.get(id).status;
		if old != new {
			self.components.get_mut(id).status = new;
			self.notify_status(id, old, new);
		}
	}

	// --- queue internals -------------------------------------------------------

	fn do_enter_tail(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		let now = self.now_ticks;
		let old_len = self.queues[queue.0].len();
		self.queues[queue.0].push_tail(id, now)?;
		self.entered(queue, id, old_len);
		Ok(())
	}

	fn do_enter_head(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		let now = self.now_ticks;
		let old_len = self.queues[queue.0].len();
		self.queues[queue.0].push_head(id, now)?;
		self.entered(queue, id, old_len);
		Ok(())
	}

	fn do_enter_sorted(&mut self, queue: QueueID, id: ComponentID, priority: Priority) -> SimResult<()>
	{
		let now = self.now_ticks;
		let old_len = self.queues[queue.0].len();
		self.queues[queue.0].insert_sorted(id, priority, now)?;
		self.entered(queue, id, old_len);
		Ok(())
	}

	fn entered(&mut self, queue: QueueID, id: ComponentID, old_len: usize)
	{
		self.components.get_mut(id).queues.push(queue);
		let message = format!("enter {}", self.queues[queue.0].name);
		self.trace(id, &message);
		self.notify_queue_length(queue, old_len, old_len + 1);
	}

	fn do_leave(&mut self, queue: QueueID, id: ComponentID) -> SimResult<()>
	{
		let old_len = self.queues[queue.0].len();
		let entry = match self.queues[queue.0].remove(id) {
			Some(entry) => entry,
			None => return Err(SimError::InvalidTransition(format!("{} is not in {}", self.components.get(id).name, self.queues[queue.0].name))),
		};
		{
			let component = self.components.get_mut(id);
			let index = component.queues.iter().position(|&q| q == queue).unwrap();
			component.queues.remove(index);
		}
		let message = format!("leave {}", self.queues[queue.0].name);
		self.trace(id, &message);

		let stay = self.time_to_secs(self.now_ticks) - self.time_to_secs(entry.enter_time);
		self.notify_queue_stay(queue, id, stay);
		self.notify_queue_length(queue, old_len, old_len - 1);
		Ok(())
	}

	fn collect_queue(&mut self, members: Vec<ComponentID>, name: &str) -> SimResult<QueueID>
	{
		let queue = self.add_queue(name, None);
		for id in members {
			self.do_enter_tail(queue, id)?;
		}
		Ok(queue)
	}

	fn make_queue(&mut self, name: &str, capacity: Option<usize>, internal: bool) -> QueueID
	{
		let (name, base_name, sequence_number) = self.serialize_name(name);
		let id = QueueID(self.queues.len());
		self.max_name_len = self.max_name_len.max(name.len());
		self.queues.push(Queue::new(name, base_name, sequence_number, capacity, internal));
		id
	}

	fn serialize_name(&mut self, raw: &str) -> (String, String, usize)
	{
		assert!(!raw.is_empty(), "name should not be empty");

		if raw.ends_with('.') {
			let base = raw[..raw.len()-1].to_string();
			let counter = self.counters.entry(base.clone()).or_insert(0);
			*counter += 1;
			(format!("{}.{}", base, *counter), base, *counter)
		} else {
			(raw.to_string(), raw.to_string(), 0)
		}
	}

	fn note_name(&mut self, id: ComponentID)
	{
		let len = self.components.get(id).name.len();
		self.max_name_len = self.max_name_len.max(len);
	}

	// --- time ------------------------------------------------------------------

	fn secs_to_time(&self, secs: f64) -> Time
	{
		if secs.is_infinite() {
			TIME_NEVER
		} else {
			Time(self.origin.0 + (secs*self.config.time_units).round() as i64)
		}
	}

	fn time_to_secs(&self, time: Time) -> f64
	{
		if time.is_never() {
			std::f64::INFINITY
		} else {
			((time.0 - self.origin.0) as f64)/self.config.time_units
		}
	}

	fn add_secs(&self, base: Time, secs: f64) -> Time
	{
		if secs.is_infinite() || base.is_never() {
			TIME_NEVER
		} else {
			Time(base.0 + (secs*self.config.time_units).round() as i64)
		}
	}

	// --- monitors --------------------------------------------------------------

	fn notify_status(&mut self, id: ComponentID, old: Status, new: Status)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.components.get(id).name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.component_status_changed(id, &name, old, new, time);
		}
		self.monitors = monitors;
	}

	fn notify_queue_length(&mut self, queue: QueueID, old_len: usize, new_len: usize)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.queues[queue.0].name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.queue_length_changed(queue, &name, old_len, new_len, time);
		}
		self.monitors = monitors;
	}

	fn notify_queue_stay(&mut self, queue: QueueID, id: ComponentID, stay: f64)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.queues[queue.0].name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.queue_stay(queue, &name, id, stay, time);
		}
		self.monitors = monitors;
	}

	fn notify_resource_claim(&mut self, resource: ResourceID, old: f64, new: f64)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.resources[resource.0].name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.resource_claim_changed(resource, &name, old, new, time);
		}
		self.monitors = monitors;
	}

	fn notify_resource_capacity(&mut self, resource: ResourceID, old: f64, new: f64)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.resources[resource.0].name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.resource_capacity_changed(resource, &name, old, new, time);
		}
		self.monitors = monitors;
	}

	fn notify_state(&mut self, state: StateID, old: &StateValue, new: &StateValue)
	{
		if self.monitors.is_empty() {
			return;
		}
		let name = self.states[state.0].name.clone();
		let time = self.now();
		let mut monitors = mem::replace(&mut self.monitors, Vec::new());
		for monitor in monitors.iter_mut() {
			monitor.state_value_changed(state, &name, old, new, time);
		}
		self.monitors = monitors;
	}

	// --- logging internals -----------------------------------------------------

	fn trace(&self, id: ComponentID, message: &str)
	{
		self.log_component(&LogLevel::Debug, id, message);
	}

	fn log_named(&self, level: &LogLevel, name: &str, message: &str)
	{
		if self.should_log(level, name) {
			let t = self.now();
			let name = self.logged_name(name);
			if self.config.colorize {
				let begin_escape = match level {
					&LogLevel::Error	=> &self.config.error_escape_code,
					&LogLevel::Warning	=> &self.config.warning_escape_code,
					&LogLevel::Info		=> &self.config.info_escape_code,
					&LogLevel::Debug	=> &self.config.debug_escape_code,
					&LogLevel::Excessive=> &self.config.excessive_escape_code,
				};
				print!("{0}{1:.2$}   {3} {4}{5}\n", begin_escape, t, self.precision, name, message, end_escape());
			} else {
				let prefix = match level {
					&LogLevel::Error	=> "Error",
					&LogLevel::Warning	=> "Warn ",
					&LogLevel::Info		=> "Info ",
					&LogLevel::Debug	=> "Debug",
					&LogLevel::Excessive=> "Exces",
				};
				print!("{0:.1$}  {2} {3}  {4}\n", t, self.precision, prefix, name, message);
			}
		}
	}

	fn logged_name(&self, name: &str) -> String
	{
		let mut name = name.to_string();
		if self.config.max_log_name > 0 && self.max_name_len > self.config.max_log_name {
			let len = name.len();
			if len > self.config.max_log_name {
				format!("…{}", name.split_off(len - self.config.max_log_name))
			} else {
				format!("{0:<1$}", name, self.config.max_log_name)
			}
		} else {
			format!("{0:<1$}", name, self.max_name_len)
		}
	}

	fn should_log(&self, level: &LogLevel, name: &str) -> bool
	{
		if !self.config.log_levels.is_empty() {	// short circuit some work if we have no overrides
			for (pattern, clevel) in self.config.log_levels.iter() {
				if pattern.matches(name) {
					return *level <= *clevel;
				}
			}
		}

		*level <= self.config.log_level
	}
}

fn end_escape() -> &'static str
{
	"\x1b[0m"
}

// We care about speed much more than we care about a cryptographic RNG so
// XorShiftRng should be plenty good enough.
fn new_rng(seed: u32, offset: u32) -> XorShiftRng
{
	let seed = if seed != 0 {seed} else {get_time().nsec as u32};
	XorShiftRng::from_seed([seed + offset; 4])
}
