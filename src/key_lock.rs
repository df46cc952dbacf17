// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Parity.

// Parity is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity.  If not, see <http://www.gnu.org/licenses/>.

//! Per-key write mutex. Two writers touching disjoint keys proceed fully
//! in parallel; readers never take these locks (spec §5/§9). Entries are
//! reaped once nobody else holds them, so a long-running node doesn't
//! accumulate one mutex per ever-seen address.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

pub struct KeyLockTable {
	table: Mutex<HashMap<Vec<u8>, Arc<Mutex<()>>>>,
}

impl KeyLockTable {
	pub fn new() -> Self {
		KeyLockTable { table: Mutex::new(HashMap::new()) }
	}

	/// Runs `f` with exclusive access to `key`'s open TEMP segment.
	pub fn with_lock<T>(&self, key: &[u8], f: impl FnOnce() -> Result<T>) -> Result<T> {
		let entry = {
			let mut table = self.table.lock();
			table.entry(key.to_vec()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
		};

		let result = {
			let _guard = entry.lock();
			f()
		};

		// Opportunistic reap: if only the table and our local handle still
		// reference this mutex, nobody else is waiting on it - drop it.
		{
			let mut table = self.table.lock();
			if Arc::strong_count(&entry) == 2 {
				if let Some(current) = table.get(key) {
					if Arc::ptr_eq(current, &entry) {
						table.remove(key);
					}
				}
			}
		}

		result
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.table.lock().len()
	}
}

impl Default for KeyLockTable {
	fn default() -> Self {
		KeyLockTable::new()
	}
}
