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
use sim_time::*;
use std;
use std::collections::BTreeMap;

/// Scheduling priority: lower values are more urgent. Scheduling calls
/// default to 0.
pub type Priority = i64;

/// Used for the implicit end-of-run wakeup of the main component so that
/// all other events at the same time are processed first.
pub const LEAST_URGENT: Priority = std::i64::MAX;

/// The sole sort criterion of the event list: no component is ever
/// scheduled by name. Entries order by time, then priority (lower value
/// first), then urgency (urgent entries in front), and remaining ties
/// break on the monotonically increasing schedule sequence number.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct EventKey
{
	pub time: Time,
	pub priority: Priority,
	slot: u8,	// 0 for urgent, 1 for normal, field order matters for the derived Ord
	pub seq: u64,
}

impl EventKey
{
	pub fn urgent(&self) -> bool
	{
		self.slot == 0
	}
}

/// Time ordered structure holding every component scheduled for a future
/// (or current) activation. Unlike a binary heap this supports removing
/// arbitrary entries which the kernel needs for cancel and interrupt.
pub struct EventList
{
	entries: BTreeMap<EventKey, ComponentID>,
	next_seq: u64,
}

impl EventList
{
	pub fn new() -> EventList
	{
		EventList{entries: BTreeMap::new(), next_seq: 0}
	}

	/// Adds an entry and returns the key under which it was filed. The
	/// caller is responsible for ensuring a component has at most one
	/// entry at a time.
	pub fn schedule(&mut self, to: ComponentID, time: Time, priority: Priority, urgent: bool) -> EventKey
	{
		assert!(to != NO_COMPONENT);
		assert!(!time.is_never(), "never-times should not be placed on the event list");

		self.next_seq += 1;
		let key = EventKey{time, priority, slot: if urgent {0} else {1}, seq: self.next_seq};
		let old = self.entries.insert(key, to);
		assert!(old.is_none());	// seq is unique so keys can't collide
		key
	}

	pub fn unschedule(&mut self, key: &EventKey)
	{
		let old = self.entries.remove(key);
		assert!(old.is_some(), "unscheduled an entry that wasn't on the event list");
	}

	pub fn pop_earliest(&mut self) -> Option<(EventKey, ComponentID)>
	{
		match self.peek_earliest() {
			Some((key, id)) => {
				self.entries.remove(&key);
				Some((key, id))
			},
			None => None,
		}
	}

	pub fn peek_earliest(&self) -> Option<(EventKey, ComponentID)>
	{
		self.entries.iter().next().map(|(key, id)| (*key, *id))
	}

	pub fn len(&self) -> usize
	{
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}
}
