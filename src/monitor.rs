use component::*;
use queue::*;
use resource::*;
use state::*;

/// Notification points an external statistics collector can subscribe to
/// with `Simulation::add_monitor`. Each mutation reports the old and new
/// value together with the (seconds) time of the change; the kernel does
/// not format or store history itself.
///
/// All methods have empty default implementations so collectors only
/// override what they care about.
pub trait Monitor
{
	fn component_status_changed(&mut self, _component: ComponentID, _name: &str, _old: Status, _new: Status, _time: f64)
	{
	}

	fn queue_length_changed(&mut self, _queue: QueueID, _name: &str, _old_length: usize, _new_length: usize, _time: f64)
	{
	}

	/// Reported when a component leaves a queue: how long it was a member.
	fn queue_stay(&mut self, _queue: QueueID, _name: &str, _component: ComponentID, _stay: f64, _time: f64)
	{
	}

	fn resource_claim_changed(&mut self, _resource: ResourceID, _name: &str, _old_claimed: f64, _new_claimed: f64, _time: f64)
	{
	}

	fn resource_capacity_changed(&mut self, _resource: ResourceID, _name: &str, _old_capacity: f64, _new_capacity: f64, _time: f64)
	{
	}

	fn state_value_changed(&mut self, _state: StateID, _name: &str, _old: &StateValue, _new: &StateValue, _time: f64)
	{
	}
}
