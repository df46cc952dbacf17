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

//! A persistent stack of reusable temp-file page offsets, stored in the KV
//! store's `Default` column under the reserved key `"freePages"`, packed as
//! a little-endian `u32[]`. Plays the role `ValueTable`'s in-file
//! `last_removed` linked list plays for value slots (`table.rs`
//! `next_free`/`clear_slot`), but lives in the KV store rather than the
//! page file itself since the free list must survive independently of any
//! single page's contents - closer to `QuiverDB`'s `FreeList::push`/`pop`.

use std::convert::TryInto;

use parking_lot::Mutex;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::kv::{Column, KvBackend};
use crate::page_file::PageFile;

const FREE_PAGES_KEY: &[u8] = b"freePages";

pub struct FreePageAllocator<K: KvBackend> {
	kv: Arc<K>,
	// Single global lock: serializes list pop/push and, when the list is
	// empty, the fallback page-file growth (spec §5).
	lock: Mutex<()>,
}

impl<K: KvBackend> FreePageAllocator<K> {
	pub fn new(kv: Arc<K>) -> Self {
		FreePageAllocator { kv, lock: Mutex::new(()) }
	}

	fn load(&self) -> Result<Vec<u32>> {
		match self.kv.get(Column::Default, FREE_PAGES_KEY)? {
			Some(bytes) => Ok(bytes.chunks_exact(4).map(|c| u32::from_le_bytes(c.try_into().unwrap())).collect()),
			None => Ok(Vec::new()),
		}
	}

	fn store(&self, list: &[u32]) -> Result<()> {
		let mut bytes = Vec::with_capacity(list.len() * 4);
		for offset in list {
			bytes.extend_from_slice(&offset.to_le_bytes());
		}
		self.kv.put(Column::Default, FREE_PAGES_KEY, bytes)
	}

	/// Pops a reused page offset if one is free, otherwise grows
	/// `page_file` by one page. Never returns an offset without the page
	/// being either already allocated (reused) or freshly allocated.
	pub fn acquire_or_grow(&self, page_file: &PageFile) -> Result<u64> {
		let _guard = self.lock.lock();
		let mut list = self.load()?;
		if let Some(offset) = list.pop() {
			self.store(&list)?;
			log::trace!(target: "block-log-index", "Reused free page at offset {}", offset);
			return Ok(offset as u64);
		}
		page_file.allocate_page()
	}

	/// Returns a promoted TEMP page's offset to the free list.
	pub fn release(&self, offset: u64) -> Result<()> {
		let _guard = self.lock.lock();
		let offset: u32 = offset
			.try_into()
			.map_err(|_| Error::Corruption(format!("page offset {} out of range for free list", offset)))?;
		let mut list = self.load()?;
		list.push(offset);
		self.store(&list)
	}

	pub fn len(&self) -> Result<usize> {
		let _guard = self.lock.lock();
		Ok(self.load()?.len())
	}
}
