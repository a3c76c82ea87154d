//! A machine shop: machines turn out parts until they break down, and a
//! single repairman fixes them. Repairs preempt the repairman's other
//! chores, and a broken machine is interrupted mid-part so the work it
//! already did is not lost.
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
	num_machines: u32,
	part_time: f64,
	mean_ttf: f64,		// mean time to failure
	repair_time: f64,
}

impl LocalConfig
{
	fn new() -> LocalConfig
	{
		LocalConfig {
			num_machines: 4,
			part_time: 10.0,
			mean_ttf: 300.0,
			repair_time: 30.0,
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

fn exp_sample(rng: &mut rand::XorShiftRng, mean: f64) -> f64
{
	let u: f64 = rng.next_f64();
	-mean*(1.0 - u).ln()
}

fn add_machine(sim: &mut Simulation, index: usize, local: &LocalConfig, repairman: ResourceID, chores: ComponentID, parts: Rc<RefCell<Vec<usize>>>)
{
	let part_time = local.part_time;
	let mut making = false;
	let machine = sim.add_component("machine.", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		if making {
			parts.borrow_mut()[index] += 1;
			log_info!(ctx, "finished part {}", parts.borrow()[index]);
		}
		making = true;
		Ok(Transition::hold(part_time))
	})).unwrap();

	// The breaker models the machine's failures: it interrupts the
	// machine, queues for the repairman (urgent: repairs outrank the
	// chores), and resumes the machine once it's fixed.
	let mean_ttf = local.mean_ttf;
	let repair_time = local.repair_time;
	let mut phase = 0;
	sim.add_component("breaker.", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		phase += 1;
		match phase {
			1 => {
				let ttf = exp_sample(ctx.rng(), mean_ttf);
				Ok(Transition::hold(ttf))
			},
			2 => {
				log_info!(ctx, "machine {} broke down", index + 1);
				ctx.sim.interrupt(machine)?;
				Ok(Transition::Request(Request::new(vec![RequestSpec::new(repairman, 1.0).priority(0)])))
			},
			3 => Ok(Transition::hold(repair_time)),
			_ => {
				let me = ctx.id;
				ctx.sim.release(me, repairman, None)?;
				ctx.sim.resume(machine, false)?;
				log_info!(ctx, "machine {} repaired", index + 1);

				// A chore bumped by this repair starts over.
				if ctx.sim.component(chores).status == Status::Interrupted {
					ctx.sim.resume(chores, true)?;
				}

				phase = 1;
				let ttf = exp_sample(ctx.rng(), mean_ttf);
				Ok(Transition::hold(ttf))
			},
		}
	})).unwrap();
}

fn add_chores(sim: &mut Simulation, repairman: ResourceID, count: Rc<RefCell<usize>>) -> ComponentID
{
	// Low priority busy-work that gets bumped whenever a machine breaks.
	// A bumped chore loses its claim, so when its hold finally finishes
	// the work doesn't count and it queues up again.
	let mut phase = 0;
	sim.add_component("chores", Box::new(move |ctx: &mut Context| -> SimResult<Transition> {
		phase += 1;
		match phase {
			1 => Ok(Transition::Request(Request::new(vec![RequestSpec::new(repairman, 1.0).priority(10)]))),
			2 => Ok(Transition::hold(15.0)),
			_ => {
				let me = ctx.id;
				if ctx.sim.component(me).claimed_quantity(repairman) > 0.0 {
					ctx.sim.release(me, repairman, None)?;
					*count.borrow_mut() += 1;
					log_info!(ctx, "finished chore {}", count.borrow());
				}
				phase = 0;
				Ok(Transition::Hold(Hold::now()))
			},
		}
	})).unwrap()
}

fn create_sim(local: LocalConfig, config: Config) -> (Simulation, Rc<RefCell<Vec<usize>>>, Rc<RefCell<usize>>)
{
	let mut sim = Simulation::new(config);
	let repairman = sim.add_resource(ResourceConfig::new("repairman").preemptive());

	let count = Rc::new(RefCell::new(0));
	let chores = add_chores(&mut sim, repairman, count.clone());

	let parts = Rc::new(RefCell::new(vec![0; local.num_machines as usize]));
	for index in 0..local.num_machines as usize {
		add_machine(&mut sim, index, &local, repairman, chores, parts.clone());
	}

	(sim, parts, count)
}

fn parse_options() -> (LocalConfig, Config)
{
	let mut local = LocalConfig::new();
	let mut config = Config::new();
	config.max_secs = 2_000.0;
	config.time_units = 1_000.0;

	let usage = format!(
		"--log=[LEVEL:GLOB]... 'Overrides --log-level, glob is used to match component names'
		--log-level=[LEVEL] 'Default log level: {log_levels} [{default_level}]'
		--machines=[N] 'Number of machines making parts [{default_machines}]'
		--max-time=[TIME] 'Maximum time to run the simulation, use {time_suffixes} suffixes [{default_time}]'
		--no-colors 'Don't color code console output'
		--repair=[T] 'Time to repair a broken machine [{default_repair}]'
		--seed=[N] 'Random number generator seed [random]'
		--ttf=[T] 'Mean time to failure for a machine [{default_ttf}]'",
		default_level = format!("{:?}", config.log_level).to_lowercase(),
		default_machines = local.num_machines,
		default_repair = local.repair_time,
		default_time = config.max_secs,
		default_ttf = local.mean_ttf,
		log_levels = log_levels(),
		time_suffixes = time_suffixes());

	let matches = App::new("machine_shop")
		.version("1.0")
		.about("Simulates machines with breakdowns sharing one repairman.")
		.args_from_usage(&usage)
	.get_matches();

	if matches.is_present("machines") {
		local.num_machines = match_num(&matches, "machines", 1, 100);
	}

	if matches.is_present("repair") {
		local.repair_time = match_num(&matches, "repair", 0.1, 10_000.0);
	}

	if matches.is_present("ttf") {
		local.mean_ttf = match_num(&matches, "ttf", 0.1, 100_000.0);
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

	let (mut sim, parts, chores) = create_sim(local, config);
	match sim.run() {
		Ok(()) => {
			for (index, count) in parts.borrow().iter().enumerate() {
				log_info!(sim, "machine {} made {} parts", index + 1, count);
			}
			log_info!(sim, "the repairman finished {} chores", *chores.borrow());
		},
		Err(err) => fatal_err(&format!("{}", err)),
	}
}
