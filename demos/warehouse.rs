//! A warehouse dock: a packer deposits crates onto a dock with limited
//! room, and trucks haul them away. The dock gate is only open part of
//! the day, so trucks wait on a state before loading.
#[macro_use]
extern crate clap;
extern crate rand;
#[macro_use]
extern crate desk;

use clap::{App, ArgMatches};
use desk::*;
use rand::Rng;
use std::cell::RefCell;
use std::fmt::Display;
use std::io::{Write, stderr};
use std::process;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Clone)]
struct LocalConfig
{
	num_trucks: u32,
	dock_room: usize,
	pack_time: f64,
	haul_time: f64,
	open_time: f64,
	closed_time: f64,
}

impl LocalConfig
{
	fn new() -> LocalConfig
	{
		LocalConfig {
			num_trucks: 2,
			dock_room: 4,
			pack_time: 6.0,
			haul_time: 25.0,
			open_time: 60.0,
			closed_time: 30.0,
		}
	}
}

fn fatal_err(message: &str) -> !
{
	let _ = writeln!(&mut stderr(), "{}", message);
	process::exit(1);
}

// Min and max are inclusive.
fn match_num<T>(matches: &ArgMatches, name: &str, min: T, max: T) -> T
		where T: Copy + Display + FromStr + PartialOrd
{
	match value_t!(matches.value_of(name), T) {
		Ok(value) if value < min => fatal_err(&format!("--{} should be greater than {}", name, min)),
		Ok(value) if value > max => fatal_err(&format!("--{} should be less than {}", name, max)),
		Ok(value) => value,
		_ => fatal_err(&format!("--{} should be a number", name)),
	}
}

fn create_sim(local: LocalConfig, config: Config) -> (Simulation, StoreID, Rc<RefCell<usize>>)
{
	let mut sim = Simulation::new(config);
	let dock = sim.add_store(StoreConfig::new("dock").capacity(local.dock_room));
	let gate = sim.add_state("gate", true);

	// The packer boxes a crate every pack_time and blocks when the dock
	// is out of room.
	let pack_time = local.pack_time;
	let mut packing = true;
	sim.add_component("packer", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		packing = !packing;
		if packing {
			let jitter = ctx.rng().gen_range(0.8, 1.2);
			Ok(Transition::hold(pack_time*jitter))
		} else {
			let crate_id = ctx.sim.add_data_component("crate.");
			Ok(Transition::ToStore(ToStore::new(dock, crate_id)))
		}
	})).unwrap();

	// The gate swings between open and closed all day.
	let open_time = local.open_time;
	let closed_time = local.closed_time;
	let mut open = false;
	sim.add_component("gatekeeper", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		if open {
			open = false;
			ctx.sim.set_state(gate, false)?;
			Ok(Transition::hold(closed_time))
		} else {
			open = true;
			ctx.sim.set_state(gate, true)?;
			Ok(Transition::hold(open_time))
		}
	})).unwrap();

	let hauled = Rc::new(RefCell::new(0));
	let haul_time = local.haul_time;
	for _ in 0..local.num_trucks {
		let count = hauled.clone();
		let mut phase = 0;
		sim.add_component("truck.", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
			phase += 1;
			match phase {
				1 => Ok(Transition::Wait(Wait::for_any(vec![WaitSpec::equals(gate, true)]))),
				2 => {
					// Oldest crate first.
					Ok(Transition::FromStore(FromStore::new(dock)
						.key(Box::new(|item: &Component| item.sequence_number as i64))))
				},
				_ => {
					let crate_id = ctx.retrieved().unwrap();
					*count.borrow_mut() += 1;
					log_info!(ctx, "hauls {} away", ctx.sim.component(crate_id).name);

					phase = 0;
					Ok(Transition::hold(haul_time))
				},
			}
		})).unwrap();
	}

	(sim, dock, hauled)
}

fn parse_options() -> (LocalConfig, Config)
{
	let mut local = LocalConfig::new();
	let mut config = Config::new();
	config.max_secs = 1_000.0;
	config.time_units = 1_000.0;

	let usage = format!(
		"--log=[LEVEL:GLOB]... 'Overrides --log-level, glob is used to match component names'
		--log-level=[LEVEL] 'Default log level: {log_levels} [{default_level}]'
		--max-time=[TIME] 'Maximum time to run the simulation, use {time_suffixes} suffixes [{default_time}]'
		--no-colors 'Don't color code console output'
		--room=[N] 'Crates the dock can hold [{default_room}]'
		--seed=[N] 'Random number generator seed [random]'
		--trucks=[N] 'Number of trucks hauling crates [{default_trucks}]'",
		default_level = format!("{:?}", config.log_level).to_lowercase(),
		default_room = local.dock_room,
		default_time = config.max_secs,
		default_trucks = local.num_trucks,
		log_levels = log_levels(),
		time_suffixes = time_suffixes());

	let matches = App::new("warehouse")
		.version("1.0")
		.about("Simulates trucks hauling crates from a warehouse dock.")
		.args_from_usage(&usage)
	.get_matches();

	if matches.is_present("trucks") {
		local.num_trucks = match_num(&matches, "trucks", 1, 50);
	}

	if matches.is_present("room") {
		local.dock_room = match_num(&matches, "room", 1, 1_000);
	}

	if matches.is_present("seed") {
		config.seed = match_num(&matches, "seed", 1, u32::max_value());
	}

	if matches.is_present("log-level") {
		if let Some(e) = config.parse_log_level(matches.value_of("log-level").unwrap()) {
			fatal_err(&e);
		}
	}

	if matches.is_present("log") {
		if let Some(e) = config.parse_log_levels(matches.values_of("log").unwrap().collect()) {
			fatal_err(&e);
		}
	}

	let max_secs = matches.value_of("max-time").unwrap_or("");
	if !max_secs.is_empty() {
		if let Some(e) = config.parse_max_secs(max_secs) {
			fatal_err(&e);
		}
	}

	config.colorize = !matches.is_present("no-colors");

	(local, config)
}

fn main()
{
	let (local, config) = parse_options();

	let (mut sim, dock, hauled) = create_sim(local, config);
	match sim.run() {
		Ok(()) => {
			log_info!(sim, "trucks hauled {} crates", *hauled.borrow());
			log_info!(sim, "{} crates left on the dock", sim.store_items(dock).len());
		},
		Err(err) => fatal_err(&format!("{}", err)),
	}
}
