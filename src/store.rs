use queue::*;
use std;
use std::fmt;

/// A put/get rendezvous buffer between producer and consumer components.
/// The contents queue holds the stored components themselves; depositors
/// block only when the store is at capacity and takers block until an
/// item matching their filter shows up.
pub struct Store
{
	pub name: String,
	pub base_name: String,
	pub sequence_number: usize,

	/// The stored items, in deposit order. The queue's capacity is the
	/// store's size limit.
	pub contents: QueueID,

	/// Components blocked taking an item (empty store or no match).
	pub from_requesters: QueueID,

	/// Components blocked depositing an item (store at capacity).
	pub to_requesters: QueueID,
}

/// Explicit construction arguments for a `Store`.
pub struct StoreConfig
{
	pub name: String,

	/// None means unbounded.
	pub capacity: Option<usize>,
}

impl StoreConfig
{
	pub fn new(name: &str) -> StoreConfig
	{
		assert!(!name.is_empty(), "name should not be empty");
		StoreConfig{name: name.to_string(), capacity: None}
	}

	pub fn capacity(mut self, capacity: usize) -> StoreConfig
	{
		self.capacity = Some(capacity);
		self
	}
}

/// Stores are referenced using a small integer, like components.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreID(pub usize);

pub const NO_STORE: StoreID = StoreID(std::usize::MAX);

impl fmt::Display for StoreID
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "{}", self.0)
	}
}

#[cfg(test)]
mod tests
{
	use component::*;
	use config::*;
	use errors::*;
	use logging::*;
	use process::*;
	use simulation::*;
	use super::*;
	use std::cell::RefCell;
	use std::rc::Rc;

	fn quiet_config() -> Config
	{
		let mut config = Config::new();
		config.colorize = false;
		config.log_level = LogLevel::Error;
		config.time_units = 1_000.0;
		config
	}

	#[test]
	fn config_defaults()
	{
		let config = StoreConfig::new("dock");
		assert_eq!(config.capacity, None);

		let config = StoreConfig::new("dock").capacity(4);
		assert_eq!(config.capacity, Some(4));
	}

	#[test]
	fn takers_block_until_an_item_arrives()
	{
		let mut sim = Simulation::new(quiet_config());
		let shelf = sim.add_store(StoreConfig::new("shelf"));
		let taken = Rc::new(RefCell::new(None));

		let log = taken.clone();
		let mut phase = 0;
		sim.add_component("consumer", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::FromStore(FromStore::new(shelf))),
				_ => {
					*log.borrow_mut() = Some((ctx.retrieved(), ctx.now()));
					Ok(Transition::Terminate)
				},
			}
		})).unwrap();

		let mut phase = 0;
		let mut item = NO_COMPONENT;
		let producer = sim.add_component("producer", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::hold(5.0)),
				2 => {
					item = ctx.sim.add_data_component("loaf");
					Ok(Transition::ToStore(ToStore::new(shelf, item)))
				},
				_ => Ok(Transition::Terminate),
			}
		})).unwrap();

		sim.run().unwrap();
		let taken = taken.borrow();
		let (retrieved, when) = taken.unwrap();
		assert_eq!(when, 5.0);
		assert!(retrieved.is_some());
		assert_eq!(sim.component(retrieved.unwrap()).name, "loaf");
		assert!(sim.store_items(shelf).is_empty());
		let _ = producer;
	}

	#[test]
	fn putters_block_while_the_store_is_full()
	{
		let mut sim = Simulation::new(quiet_config());
		let shelf = sim.add_store(StoreConfig::new("shelf").capacity(1));
		let stored = Rc::new(RefCell::new(Vec::new()));

		let log = stored.clone();
		let mut phase = 0;
		sim.add_component("producer", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 | 2 => {
					let item = ctx.sim.add_data_component("loaf.");
					Ok(Transition::ToStore(ToStore::new(shelf, item)))
				},
				_ => {
					log.borrow_mut().push(("stored both", ctx.now()));
					Ok(Transition::Terminate)
				},
			}
		})).unwrap();

		let log = stored.clone();
		let mut phase = 0;
		sim.add_component("consumer", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::hold(7.0)),
				2 => Ok(Transition::FromStore(FromStore::new(shelf))),
				_ => {
					log.borrow_mut().push(("took one", ctx.now()));
					Ok(Transition::Terminate)
				},
			}
		})).unwrap();

		sim.run_until(3.0).unwrap();
		{
			let producer_id = ComponentID(1);
			assert_eq!(sim.component(producer_id).status, Status::Requesting);	// second loaf is blocked
			assert_eq!(sim.store_items(shelf).len(), 1);
		}

		sim.run().unwrap();
		// The take at t=7 frees a slot which admits the pending loaf.
		assert_eq!(*stored.borrow(), vec![("took one", 7.0), ("stored both", 7.0)]);
		assert_eq!(sim.store_items(shelf).len(), 1);
	}

	#[test]
	fn filters_and_keys_select_items()
	{
		let mut sim = Simulation::new(quiet_config());
		let yard = sim.add_store(StoreConfig::new("yard"));
		let picked = Rc::new(RefCell::new(Vec::new()));

		let heavy = sim.add_data_component("heavy");
		let light = sim.add_data_component("light");
		let medium = sim.add_data_component("medium");

		let mut phase = 0;
		sim.add_component("loader", Box::new(move |_: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::ToStore(ToStore::new(yard, heavy))),
				2 => Ok(Transition::ToStore(ToStore::new(yard, light))),
				3 => Ok(Transition::ToStore(ToStore::new(yard, medium))),
				_ => Ok(Transition::Terminate),
			}
		})).unwrap();

		let log = picked.clone();
		let mut phase = 0;
		sim.add_component_with("picker", Activation::new().delay(1.0), Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => {
					// Shortest name first: "heavy" (5), "light" (5),
					// "medium" (6). Ties break on store order.
					Ok(Transition::FromStore(FromStore::new(yard)
						.key(Box::new(|item: &Component| item.name.len() as i64))))
				},
				2 => {
					log.borrow_mut().push(ctx.retrieved().unwrap());
					// Only items whose name starts with "m".
					Ok(Transition::FromStore(FromStore::new(yard)
						.filter(Box::new(|item: &Component| item.name.starts_with('m')))))
				},
				_ => {
					log.borrow_mut().push(ctx.retrieved().unwrap());
					Ok(Transition::Terminate)
				},
			}
		})).unwrap();

		sim.run().unwrap();
		assert_eq!(*picked.borrow(), vec![heavy, medium]);
		assert_eq!(sim.store_items(yard), vec![light]);
	}

	#[test]
	fn unmatched_filters_wait_for_a_matching_item()
	{
		let mut sim = Simulation::new(quiet_config());
		let yard = sim.add_store(StoreConfig::new("yard"));
		let picked = Rc::new(RefCell::new(None));

		let plain = sim.add_data_component("plain");
		let special = sim.add_data_component("special");

		let log = picked.clone();
		let mut phase = 0;
		sim.add_component("picker", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::FromStore(FromStore::new(yard)
					.filter(Box::new(|item: &Component| item.name == "special")))),
				_ => {
					*log.borrow_mut() = Some((ctx.retrieved().unwrap(), ctx.now()));
					Ok(Transition::Terminate)
				},
			}
		})).unwrap();

		let mut phase = 0;
		sim.add_component("loader", Box::new(move |_: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::ToStore(ToStore::new(yard, plain))),
				2 => Ok(Transition::hold(6.0)),
				3 => Ok(Transition::ToStore(ToStore::new(yard, special))),
				_ => Ok(Transition::Terminate),
			}
		})).unwrap();

		sim.run().unwrap();
		// The plain item at t=0 doesn't match; the special one at t=6 does.
		assert_eq!(*picked.borrow(), Some((special, 6.0)));
		assert_eq!(sim.store_items(yard), vec![plain]);
	}

	#[test]
	fn growing_the_store_admits_pending_putters()
	{
		let mut sim = Simulation::new(quiet_config());
		let shelf = sim.add_store(StoreConfig::new("shelf").capacity(1));

		let first = sim.add_data_component("first");
		let second = sim.add_data_component("second");

		let mut phase = 0;
		let producer = sim.add_component("producer", Box::new(move |_: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::ToStore(ToStore::new(shelf, first))),
				2 => Ok(Transition::ToStore(ToStore::new(shelf, second))),
				_ => Ok(Transition::Terminate),
			}
		})).unwrap();

		sim.run().unwrap();
		assert_eq!(sim.component(producer).status, Status::Requesting);
		assert_eq!(sim.store_items(shelf), vec![first]);

		sim.set_store_capacity(shelf, Some(2)).unwrap();
		assert_eq!(sim.store_items(shelf), vec![first, second]);
		assert_eq!(sim.component(producer).status, Status::Scheduled);

		sim.run().unwrap();
		assert_eq!(sim.component(producer).status, Status::Data);
	}
}
