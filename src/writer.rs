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

//! Routes one `(key, block_number)` pair into its key's open TEMP segment,
//! promoting to FINAL when the page fills. Plays the role `Column::write_plan`
//! plays in `column.rs` (tier dispatch there, TEMP/FINAL dispatch here).

use crate::append_file::AppendFile;
use crate::codec::CompressionType;
use crate::error::{Error, Result};
use crate::free_list::FreePageAllocator;
use crate::key_lock::KeyLockTable;
use crate::meta_store::{Descriptor, IndexMetaStore, SegmentKind};
use crate::page_file::{PageFile, ENTRIES_PER_PAGE};
use crate::kv::KvBackend;

pub struct Writer<'a, K: KvBackend> {
	pub page_file: &'a PageFile,
	pub append_file: &'a AppendFile,
	pub free_list: &'a FreePageAllocator<K>,
	pub meta: &'a IndexMetaStore<K>,
	pub key_lock: &'a KeyLockTable,
	pub compression: CompressionType,
}

impl<'a, K: KvBackend> Writer<'a, K> {
	/// Ingests one already-deduplicated key for `block_number`. Idempotent:
	/// re-ingesting a block already indexed for this key is a silent no-op.
	pub fn ingest_key(&self, block_number: u32, key: &[u8]) -> Result<()> {
		self.key_lock.with_lock(key, || self.ingest_key_locked(block_number, key))
	}

	fn ingest_key_locked(&self, block_number: u32, key: &[u8]) -> Result<()> {
		match self.meta.open_temp(key)? {
			Some((first_block, descriptor)) => self.append_to_existing(key, first_block, descriptor, block_number),
			None => self.append_to_new(key, block_number),
		}
	}

	fn append_to_existing(&self, key: &[u8], first_block: u32, descriptor: Descriptor, block_number: u32) -> Result<()> {
		if block_number <= descriptor.last_block {
			// Idempotent replay of an already-indexed block (reorg/backward sync).
			return Ok(());
		}
		if descriptor.length as usize > ENTRIES_PER_PAGE {
			return Err(Error::Corruption(format!(
				"temp segment for key {} has length {} exceeding page capacity",
				crate::display::hex(key),
				descriptor.length
			)));
		}
		let entry_index = descriptor.length as usize;
		self.page_file.write_entry(descriptor.offset, entry_index, block_number)?;
		let new_length = descriptor.length + 1;

		if new_length as usize == ENTRIES_PER_PAGE {
			self.promote(key, first_block, descriptor.offset, block_number)
		} else {
			self.meta.put(
				key,
				first_block,
				Descriptor { kind: SegmentKind::Temp, offset: descriptor.offset, length: new_length, last_block: block_number },
			)
		}
	}

	fn append_to_new(&self, key: &[u8], block_number: u32) -> Result<()> {
		let offset = self.free_list.acquire_or_grow(self.page_file)?;
		self.page_file.write_entry(offset, 0, block_number)?;
		// A freshly allocated page has exactly one entry, never a full one
		// (ENTRIES_PER_PAGE is always > 1), so promotion can't trigger here.
		self.meta.put(
			key,
			block_number,
			Descriptor { kind: SegmentKind::Temp, offset, length: 1, last_block: block_number },
		)
	}

	fn promote(&self, key: &[u8], first_block: u32, offset: u64, last_block: u32) -> Result<()> {
		let blocks = self.page_file.read_entries(offset, ENTRIES_PER_PAGE)?;
		debug_assert_eq!(blocks.first().copied(), Some(first_block));
		let compressed = self.compression.compress(&blocks);
		let final_offset = self.append_file.append(&compressed)?;

		log::debug!(
			target: "block-log-index",
			"Promoted key {} segment [{}..{}] to final at offset {} ({} bytes)",
			crate::display::hex(key), first_block, last_block, final_offset, compressed.len(),
		);

		// Reuses the TEMP row's composite key in place (open question #3).
		self.meta.put(
			key,
			first_block,
			Descriptor { kind: SegmentKind::Final, offset: final_offset, length: compressed.len() as u32, last_block },
		)?;
		self.free_list.release(offset)
	}
}
