//! An M/M/c style bank: customers arrive at random intervals, queue for
//! one of a handful of clerks, are served, and leave. It's a small model
//! but structured the way larger resource-contention models are.
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
	num_clerks: u32,
	mean_service: f64,
	min_arrival: f64,
	max_arrival: f64,
}

impl LocalConfig
{
	fn new() -> LocalConfig
	{
		// These are the defaults: all of them can be overriden using command line options.
		LocalConfig {
			num_clerks: 3,
			mean_service: 30.0,
			min_arrival: 5.0,
			max_arrival: 15.0,
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

/// Tracks how long the waiting line got and how many customers finished.
struct BankStats
{
	max_waiting: Rc<RefCell<usize>>,
	served: Rc<RefCell<usize>>,
}

impl Monitor for BankStats
{
	fn queue_length_changed(&mut self, _: QueueID, name: &str, _: usize, new_length: usize, _: f64)
	{
		if name.starts_with("requesters") && new_length > *self.max_waiting.borrow() {
			*self.max_waiting.borrow_mut() = new_length;
		}
	}

	fn component_status_changed(&mut self, _: ComponentID, name: &str, _: Status, new: Status, _: f64)
	{
		if new == Status::Data && name.starts_with("customer") {
			*self.served.borrow_mut() += 1;
		}
	}
}

fn add_customer(sim: &mut Simulation, clerks: ResourceID, service: f64) -> SimResult<ComponentID>
{
	let mut phase = 0;
	sim.add_component("customer.", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		phase += 1;
		match phase {
			1 => Ok(Transition::Request(Request::one(clerks))),
			2 => {
				log_info!(ctx, "being served for {:.1}", service);
				Ok(Transition::hold(service))
			},
			_ => {
				let me = ctx.id;
				ctx.sim.release(me, clerks, None)?;
				Ok(Transition::Terminate)
			},
		}
	}))
}

fn create_sim(local: LocalConfig, config: Config) -> (Simulation, Rc<RefCell<usize>>, Rc<RefCell<usize>>)
{
	let mut sim = Simulation::new(config);
	let clerks = sim.add_resource(ResourceConfig::new("clerks").capacity(local.num_clerks as f64));

	let max_waiting = Rc::new(RefCell::new(0));
	let served = Rc::new(RefCell::new(0));
	sim.add_monitor(Box::new(BankStats{max_waiting: max_waiting.clone(), served: served.clone()}));

	let generator = move |ctx: &mut Context| -> SimResult<Transition> {
		// One customer per activation, then sleep until the next arrival.
		let service = exp_sample(ctx.rng(), local.mean_service);
		add_customer(ctx.sim, clerks, service)?;

		let arrival = ctx.rng().gen_range(local.min_arrival, local.max_arrival);
		Ok(Transition::hold(arrival))
	};
	sim.add_component("generator", Box::new(generator)).unwrap();

	(sim, max_waiting, served)
}

fn exp_sample(rng: &mut rand::XorShiftRng, mean: f64) -> f64
{
	let u: f64 = rng.next_f64();
	-mean*(1.0 - u).ln()
}

fn parse_options() -> (LocalConfig, Config)
{
	let mut local = LocalConfig::new();
	let mut config = Config::new();
	config.max_secs = 500.0;
	config.time_units = 1_000.0;	// milli-second resolution is plenty for minutes-scale service times

	// see https://docs.rs/clap/2.24.2/clap/struct.Arg.html#method.from_usage for syntax
	let usage = format!(
		"--clerks=[N] 'Number of clerks serving customers [{default_clerks}]'
		--log=[LEVEL:GLOB]... 'Overrides --log-level, glob is used to match component names'
		--log-level=[LEVEL] 'Default log level: {log_levels} [{default_level}]'
		--max-time=[TIME] 'Maximum time to run the simulation, use {time_suffixes} suffixes [{default_time}]'
		--no-colors 'Don't color code console output'
		--seed=[N] 'Random number generator seed [random]'
		--service=[T] 'Mean service time [{default_service}]'",
		default_clerks = local.num_clerks,
		default_level = format!("{:?}", config.log_level).to_lowercase(),
		default_service = local.mean_service,
		default_time = config.max_secs,
		log_levels = log_levels(),
		time_suffixes = time_suffixes());

	let matches = App::new("bank")
		.version("1.0")
		.about("Simulates customers queueing for bank clerks.")
		.args_from_usage(&usage)
	.get_matches();

	if matches.is_present("clerks") {
		local.num_clerks = match_num(&matches, "clerks", 1, 100);
	}

	if matches.is_present("service") {
		local.mean_service = match_num(&matches, "service", 0.1, 10_000.0);
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

	let (mut sim, max_waiting, served) = create_sim(local, config);
	match sim.run() {
		Ok(()) => {
			log_info!(sim, "served {} customers", *served.borrow());
			log_info!(sim, "longest waiting line was {}", *max_waiting.borrow());
		},
		Err(err) => fatal_err(&format!("{}", err)),
	}
}
