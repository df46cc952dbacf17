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

//! The ordered key-value store is an external collaborator (spec §1): this
//! engine never assumes a concrete backend, only that `prefix_iter` returns
//! entries in ascending lexicographic key order. `MemKv` is the reference
//! backend - a `BTreeMap` per column guarded by `parking_lot::RwLock` - used
//! by default, by the admin tool, and by the test suite. A real node would
//! supply its own `KvBackend` over whatever sorted store it already runs.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::Result;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Column {
	Addresses,
	Topics,
	Default,
}

pub trait KvBackend: Send + Sync {
	fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>>;
	fn put(&self, column: Column, key: &[u8], value: Vec<u8>) -> Result<()>;
	fn delete(&self, column: Column, key: &[u8]) -> Result<()>;
	/// Ascending entries whose key starts with `prefix`.
	fn prefix_iter(&self, column: Column, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

#[derive(Default)]
pub struct MemKv {
	addresses: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
	topics: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
	default: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemKv {
	pub fn new() -> MemKv {
		MemKv::default()
	}

	fn map(&self, column: Column) -> &RwLock<BTreeMap<Vec<u8>, Vec<u8>>> {
		match column {
			Column::Addresses => &self.addresses,
			Column::Topics => &self.topics,
			Column::Default => &self.default,
		}
	}
}

impl KvBackend for MemKv {
	fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>> {
		Ok(self.map(column).read().get(key).cloned())
	}

	fn put(&self, column: Column, key: &[u8], value: Vec<u8>) -> Result<()> {
		self.map(column).write().insert(key.to_vec(), value);
		Ok(())
	}

	fn delete(&self, column: Column, key: &[u8]) -> Result<()> {
		self.map(column).write().remove(key);
		Ok(())
	}

	fn prefix_iter(&self, column: Column, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
		let map = self.map(column).read();
		Ok(map
			.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
			.take_while(|(k, _)| k.starts_with(prefix))
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect())
	}
}
