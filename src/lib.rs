extern crate glob;
extern crate rand;
extern crate time;

#[macro_use]
pub mod logging;

pub mod component;
pub mod components;
pub mod config;
pub mod errors;
pub mod event;
pub mod monitor;
pub mod process;
pub mod queue;
pub mod resource;
pub mod sim_time;
pub mod simulation;
pub mod state;
pub mod store;

pub use component::*;
pub use components::*;
pub use config::*;
pub use errors::*;
pub use event::*;
pub use logging::*;
pub use monitor::*;
pub use process::*;
pub use queue::*;
pub use resource::*;
pub use sim_time::*;
pub use simulation::*;
pub use state::*;
pub use store::*;
