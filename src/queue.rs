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
use component::*;
use errors::*;
use event::*;
use sim_time::*;
use std;
use std::fmt;

/// An ordered, priority aware membership container. Queues are the
/// substrate for resource requesters/claimers, store contents and state
/// waiter lists, and are directly usable by models (e.g. a waiting line).
/// A queue never owns its components' lifetime.
pub struct Queue
{
	pub name: String,
	pub base_name: String,
	pub sequence_number: usize,

	/// Insertion beyond the capacity fails with CapacityExceeded; it is
	/// never silently dropped and never blocks.
	pub capacity: Option<usize>,

	/// Internal queues (requesters, claimers, waiters, store contents)
	/// may only be mutated by the kernel.
	pub internal: bool,

	entries: Vec<QueueEntry>,
}

#[derive(Clone, Copy, Debug)]
pub struct QueueEntry
{
	pub component: ComponentID,
	pub priority: Priority,
	pub enter_time: Time,
}

/// Queues are referenced using a small integer, like components.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QueueID(pub usize);

pub const NO_QUEUE: QueueID = QueueID(std::usize::MAX);

impl fmt::Display for QueueID
{
	fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter, "{}", self.0)
	}
}

impl Queue
{
	pub fn new(name: String, base_name: String, sequence_number: usize, capacity: Option<usize>, internal: bool) -> Queue
	{
		Queue{name, base_name, sequence_number, capacity, internal, entries: Vec::new()}
	}

	pub fn len(&self) -> usize
	{
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}

	pub fn contains(&self, component: ComponentID) -> bool
	{
		self.index_of(component).is_some()
	}

	pub fn index_of(&self, component: ComponentID) -> Option<usize>
	{
		self.entries.iter().position(|entry| entry.component == component)
	}

	pub fn head(&self) -> Option<ComponentID>
	{
		self.entries.first().map(|entry| entry.component)
	}

	pub fn tail(&self) -> Option<ComponentID>
	{
		self.entries.last().map(|entry| entry.component)
	}

	pub fn entry(&self, component: ComponentID) -> Option<&QueueEntry>
	{
		self.entries.iter().find(|entry| entry.component == component)
	}

	pub fn priority_of(&self, component: ComponentID) -> Option<Priority>
	{
		self.entry(component).map(|entry| entry.priority)
	}

	pub fn entries(&self) -> &[QueueEntry]
	{
		&self.entries
	}

	/// Snapshot of the membership in queue order. Kernel honor scans and
	/// model iteration both use snapshots so the live queue can be
	/// mutated while walking: callers re-validate membership per step.
	pub fn components(&self) -> Vec<ComponentID>
	{
		self.entries.iter().map(|entry| entry.component).collect()
	}

	/// Adds to the tail, taking over the tail's priority (or 0 for an
	/// empty queue).
	pub fn push_tail(&mut self, component: ComponentID, time: Time) -> SimResult<()>
	{
		let priority = self.entries.last().map_or(0, |entry| entry.priority);
		self.check_insertion(component)?;
		self.entries.push(QueueEntry{component, priority, enter_time: time});
		Ok(())
	}

	/// Adds to the head, taking over the head's priority (or 0 for an
	/// empty queue).
	pub fn push_head(&mut self, component: ComponentID, time: Time) -> SimResult<()>
	{
		let priority = self.entries.first().map_or(0, |entry| entry.priority);
		self.check_insertion(component)?;
		self.entries.insert(0, QueueEntry{component, priority, enter_time: time});
		Ok(())
	}

	/// Inserts by priority, scanning from the tail. Stable: an entry with
	/// a priority equal to existing entries lands after them.
	pub fn insert_sorted(&mut self, component: ComponentID, priority: Priority, time: Time) -> SimResult<()>
	{
		self.check_insertion(component)?;

		let mut index = self.entries.len();
		while index > 0 && self.entries[index-1].priority > priority {
			index -= 1;
		}
		self.entries.insert(index, QueueEntry{component, priority, enter_time: time});
		Ok(())
	}

	pub fn remove(&mut self, component: ComponentID) -> Option<QueueEntry>
	{
		match self.index_of(component) {
			Some(index) => Some(self.entries.remove(index)),
			None => None,
		}
	}

	/// Re-files the component under a new priority. The enter time is
	/// kept; the order among equal priorities stays stable (the moved
	/// entry lands after existing entries of the same priority).
	pub fn change_priority(&mut self, component: ComponentID, priority: Priority) -> SimResult<()>
	{
		match self.index_of(component) {
			Some(index) => {
				if self.entries[index].priority != priority {
					let mut entry = self.entries.remove(index);
					entry.priority = priority;

					let mut index = self.entries.len();
					while index > 0 && self.entries[index-1].priority > priority {
						index -= 1;
					}
					self.entries.insert(index, entry);
				}
				Ok(())
			},
			None => Err(SimError::InvalidTransition(format!("component is not in {}", self.name))),
		}
	}

	fn check_insertion(&self, component: ComponentID) -> SimResult<()>
	{
		if self.contains(component) {
			return Err(SimError::InvalidTransition(format!("component is already in {}", self.name)));
		}
		if let Some(capacity) = self.capacity {
			if self.entries.len() >= capacity {
				return Err(SimError::CapacityExceeded{name: self.name.clone(), capacity});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use component::*;
	use errors::*;
	use event::*;
	use sim_time::*;
	use super::*;

	fn new_queue(capacity: Option<usize>) -> Queue
	{
		Queue::new("line".to_string(), "line".to_string(), 0, capacity, false)
	}

	#[test]
	fn sorted_insertions_are_stable()
	{
		// enter_sorted with priorities [2, 1, 2, 0] yields [0, 1, 2, 2]
		// with the equal-priority entries in arrival order.
		let mut q = new_queue(None);
		q.insert_sorted(ComponentID(10), 2, Time(0)).unwrap();
		q.insert_sorted(ComponentID(11), 1, Time(0)).unwrap();
		q.insert_sorted(ComponentID(12), 2, Time(0)).unwrap();
		q.insert_sorted(ComponentID(13), 0, Time(0)).unwrap();

		let order = q.components();
		assert_eq!(order, vec![ComponentID(13), ComponentID(11), ComponentID(10), ComponentID(12)]);
	}

	#[test]
	fn matches_a_forward_insertion_sort()
	{
		let priorities = vec![5, 3, 5, 1, 4, 3, 3, 2, 5, 1];

		let mut q = new_queue(None);
		for (i, &p) in priorities.iter().enumerate() {
			q.insert_sorted(ComponentID(i), p, Time(0)).unwrap();
		}

		// Stable sort of (priority, arrival index) is the reference order.
		let mut expected: Vec<(Priority, usize)> = priorities.iter().enumerate().map(|(i, &p)| (p, i)).collect();
		expected.sort();
		let expected: Vec<ComponentID> = expected.iter().map(|&(_, i)| ComponentID(i)).collect();
		assert_eq!(q.components(), expected);
	}

	#[test]
	fn tail_enter_inherits_tail_priority()
	{
		let mut q = new_queue(None);
		q.insert_sorted(ComponentID(1), 7, Time(0)).unwrap();
		q.push_tail(ComponentID(2), Time(0)).unwrap();
		assert_eq!(q.priority_of(ComponentID(2)), Some(7));

		q.push_head(ComponentID(3), Time(0)).unwrap();
		assert_eq!(q.priority_of(ComponentID(3)), Some(7));
		assert_eq!(q.head(), Some(ComponentID(3)));
	}

	#[test]
	fn membership_is_a_set()
	{
		let mut q = new_queue(None);
		q.push_tail(ComponentID(1), Time(0)).unwrap();
		assert!(q.push_tail(ComponentID(1), Time(0)).is_err());
		assert!(q.insert_sorted(ComponentID(1), 3, Time(0)).is_err());
		assert_eq!(q.len(), 1);
	}

	#[test]
	fn capacity_violations_are_raised()
	{
		// Capacity 2: A and B enter, C is rejected; after A leaves C
		// enters and the final order is [B, C].
		let mut q = new_queue(Some(2));
		q.push_tail(ComponentID(1), Time(0)).unwrap();
		q.push_tail(ComponentID(2), Time(0)).unwrap();

		match q.push_tail(ComponentID(3), Time(0)) {
			Err(SimError::CapacityExceeded{capacity, ..}) => assert_eq!(capacity, 2),
			_ => panic!("expected CapacityExceeded"),
		}

		q.remove(ComponentID(1)).unwrap();
		q.push_tail(ComponentID(3), Time(0)).unwrap();
		assert_eq!(q.components(), vec![ComponentID(2), ComponentID(3)]);
	}

	#[test]
	fn change_priority_is_stable()
	{
		let mut q = new_queue(None);
		q.insert_sorted(ComponentID(1), 1, Time(0)).unwrap();
		q.insert_sorted(ComponentID(2), 2, Time(0)).unwrap();
		q.insert_sorted(ComponentID(3), 3, Time(0)).unwrap();

		q.change_priority(ComponentID(1), 2).unwrap();
		assert_eq!(q.components(), vec![ComponentID(2), ComponentID(1), ComponentID(3)]);
	}
}
