use component::*;
use process::*;
use sim_time::*;
use std::collections::HashMap;

/// Contains all the `Component`s used within the `Simulation`.
pub struct Components
{
	components: Vec<Component>,
	counters: HashMap<String, usize>,
}

impl Components
{
	pub fn new() -> Components
	{
		Components{components: Vec::new(), counters: HashMap::new()}
	}

	/// Appends a new component. Names ending in a period auto-serialize:
	/// "customer." becomes "customer.1", "customer.2", etc.
	pub fn add(&mut self, name: &str, time: Time, process: Option<Box<Process>>) -> ComponentID
	{
		assert!(!name.is_empty(), "name should not be empty");

		let id = ComponentID(self.components.len());
		let (name, base_name, sequence_number) = self.serialize_name(name);
		self.components.push(Component::new(name, base_name, sequence_number, time, process));
		id
	}

	pub fn get(&self, id: ComponentID) -> &Component
	{
		assert!(id != NO_COMPONENT);
		self.components.get(id.0).unwrap()
	}

	pub fn get_mut(&mut self, id: ComponentID) -> &mut Component
	{
		assert!(id != NO_COMPONENT);
		self.components.get_mut(id.0).unwrap()
	}

	/// Temporarily moves the body out so the kernel can invoke it while
	/// the component record stays borrowable.
	pub fn take_process(&mut self, id: ComponentID) -> Option<Box<Process>>
	{
		self.get_mut(id).process.take()
	}

	pub fn put_process(&mut self, id: ComponentID, process: Box<Process>)
	{
		let component = self.get_mut(id);
		assert!(component.process.is_none());
		component.process = Some(process);
	}

	pub fn len(&self) -> usize
	{
		self.components.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.components.is_empty()
	}

	/// Iterates over all the components.
	pub fn iter<'a>(&'a self) -> Box<Iterator<Item=(ComponentID, &'a Component)> + 'a>
	{
		Box::new(self.components.iter().enumerate().map(|(i, c)| (ComponentID(i), c)))
	}

	fn serialize_name(&mut self, raw: &str) -> (String, String, usize)
	{
		if raw.ends_with('.') {
			let base = raw[..raw.len()-1].to_string();
			let counter = self.counters.entry(base.clone()).or_insert(0);
			*counter += 1;
			(format!("{}.{}", base, *counter), base, *counter)
		} else {
			(raw.to_string(), raw.to_string(), 0)
		}
	}
}

#[cfg(test)]
mod tests
{
	use sim_time::*;
	use super::*;

	#[test]
	fn serializes_names()
	{
		let mut components = Components::new();
		let c1 = components.add("customer.", Time(0), None);
		let c2 = components.add("customer.", Time(0), None);
		let c3 = components.add("teller", Time(0), None);

		assert_eq!(components.get(c1).name, "customer.1");
		assert_eq!(components.get(c2).name, "customer.2");
		assert_eq!(components.get(c2).base_name, "customer");
		assert_eq!(components.get(c2).sequence_number, 2);
		assert_eq!(components.get(c3).name, "teller");
		assert_eq!(components.get(c3).sequence_number, 0);
	}

	#[test]
	fn iterates_in_id_order()
	{
		let mut components = Components::new();
		components.add("a", Time(0), None);
		components.add("b", Time(0), None);

		let names: Vec<String> = components.iter().map(|(_, c)| c.name.clone()).collect();
		assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
	}
}
