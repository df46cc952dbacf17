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

//! `block-log-index`: a persistent inverted index mapping a blockchain log's
//! address or topic to the ascending block numbers in which it appears,
//! queryable over a caller-supplied range. See [`Db`] for the entry point.

pub mod append_file;
pub mod codec;
pub mod display;
pub mod error;
pub mod free_list;
pub mod key_lock;
pub mod kv;
pub mod meta_store;
pub mod namespace;
pub mod options;
pub mod page_file;
pub mod reader;
pub mod receipts;
pub mod writer;

use std::collections::BTreeSet;
use std::fs::File;
use std::sync::Arc;

use fs2::FileExt;

use append_file::AppendFile;
use codec::CompressionType;
use error::Result;
use key_lock::KeyLockTable;
use kv::{KvBackend, MemKv};
use meta_store::IndexMetaStore;
use namespace::Namespace;
use options::Options;
use page_file::PageFile;
use reader::Reader;
use receipts::Receipt;
use writer::Writer;

/// The index over one blockchain node's logs.
///
/// Owns the two on-disk files (`temp_index.bin`, `finalized_index.bin`), the
/// free-page allocator, and a per-namespace [`meta_store::IndexMetaStore`]/
/// [`key_lock::KeyLockTable`] pair for addresses and topics. All state that
/// must outlive a single `set_receipts`/`get_block_numbers` call is held as
/// an owned `Arc<K>` clone rather than a borrow, since `Db` itself is the
/// thing callers hold onto for the lifetime of the process.
pub struct Db<K: KvBackend> {
	page_file: PageFile,
	append_file: AppendFile,
	free_list: free_list::FreePageAllocator<K>,
	addresses: IndexMetaStore<K>,
	topics: IndexMetaStore<K>,
	address_locks: KeyLockTable,
	topic_locks: KeyLockTable,
	compression: CompressionType,
	_lock_file: File,
}

impl Db<MemKv> {
	/// Opens (creating if necessary) an index at `options.path`, backed by
	/// the in-memory reference [`MemKv`]. Real deployments that already run
	/// a sorted KV store should use [`Db::with_backend`] instead.
	pub fn open(options: Options) -> Result<Db<MemKv>> {
		Db::with_backend(options, MemKv::new())
	}
}

impl<K: KvBackend> Db<K> {
	/// Opens (creating if necessary) an index at `options.path`, backed by
	/// a caller-supplied [`KvBackend`].
	pub fn with_backend(options: Options, backend: K) -> Result<Db<K>> {
		std::fs::create_dir_all(&options.path)?;

		let lock_file = File::create(options.path.join(options::LOCK_FILE_NAME))?;
		lock_file.try_lock_exclusive().map_err(|e| {
			error::Error::Corruption(format!("index at {} is already open by another process: {}", options.path.display(), e))
		})?;

		let page_file = PageFile::open(&options.path.join(options::TEMP_FILE_NAME))?;
		let append_file = AppendFile::open(&options.path.join(options::FINAL_FILE_NAME))?;
		let kv = Arc::new(backend);
		let free_list = free_list::FreePageAllocator::new(kv.clone());
		let addresses = IndexMetaStore::new(kv.clone(), Namespace::Addresses);
		let topics = IndexMetaStore::new(kv, Namespace::Topics);

		log::info!(target: "block-log-index", "Opened index at {}", options.path.display());

		Ok(Db {
			page_file,
			append_file,
			free_list,
			addresses,
			topics,
			address_locks: KeyLockTable::new(),
			topic_locks: KeyLockTable::new(),
			compression: options.compression,
			_lock_file: lock_file,
		})
	}

	fn writer<'a>(&'a self, meta: &'a IndexMetaStore<K>, locks: &'a KeyLockTable) -> Writer<'a, K> {
		Writer {
			page_file: &self.page_file,
			append_file: &self.append_file,
			free_list: &self.free_list,
			meta,
			key_lock: locks,
			compression: self.compression,
		}
	}

	fn reader<'a>(&'a self, meta: &'a IndexMetaStore<K>) -> Reader<'a, K> {
		Reader { page_file: &self.page_file, append_file: &self.append_file, meta, compression: self.compression }
	}

	/// Ingests every log emitted by `block_number`, updating the address and
	/// topic indices. Keys repeated across logs or receipts within the same
	/// call are deduplicated before hitting the per-key lock (spec §4.7
	/// step 1). `is_backward_sync` is accepted for interface compatibility
	/// with upstream replay tooling; the idempotent `block <= last_block`
	/// drop in [`writer::Writer`] already makes out-of-order re-ingestion
	/// safe without it.
	pub fn set_receipts(&self, block_number: u32, receipts: &[Receipt], _is_backward_sync: bool) -> Result<()> {
		let mut addresses = BTreeSet::new();
		let mut topics = BTreeSet::new();
		for receipt in receipts {
			for log in &receipt.logs {
				addresses.insert(log.address);
				for topic in &log.topics {
					topics.insert(*topic);
				}
			}
		}

		let address_writer = self.writer(&self.addresses, &self.address_locks);
		for key in &addresses {
			address_writer.ingest_key(block_number, key)?;
		}

		let topic_writer = self.writer(&self.topics, &self.topic_locks);
		for key in &topics {
			topic_writer.ingest_key(block_number, key)?;
		}

		Ok(())
	}

	/// A lazy, ascending sequence of block numbers in `[from, to]` at which
	/// `key` (an address or topic, matched by byte length against
	/// [`Namespace::key_width`]) appears. Empty for an unknown key.
	/// Single-pass: restart by calling `get_block_numbers` again.
	pub fn get_block_numbers(&self, key: &[u8], from: u32, to: u32) -> Result<reader::RangeScan<'_>> {
		let meta = if key.len() == namespace::ADDRESS_KEY_LEN { &self.addresses } else { &self.topics };
		self.reader(meta).range_scan(key, from, to)
	}

	/// Flushes both files to durable storage and releases the index's file
	/// handles (via ordinary `Drop` once `self` goes out of scope). Plain
	/// `Drop` alone would close the handles but silently swallow any
	/// `fsync` error; calling `close` explicitly surfaces one.
	pub fn close(self) -> Result<()> {
		self.page_file.flush()?;
		self.append_file.flush()?;
		Ok(())
	}

	/// Segments recorded for `key`, ascending by `first_block`. Exposed for
	/// introspection tooling; not needed for ordinary ingest/query use.
	pub fn segments(&self, key: &[u8]) -> Result<Vec<(u32, meta_store::Descriptor)>> {
		let meta = if key.len() == namespace::ADDRESS_KEY_LEN { &self.addresses } else { &self.topics };
		meta.segments(key)
	}

	/// Number of temp-file pages currently sitting in the free list.
	pub fn free_page_count(&self) -> Result<usize> {
		self.free_list.len()
	}

	/// Total page count of the temp file (allocated plus free).
	pub fn temp_page_count(&self) -> u64 {
		self.page_file.page_count()
	}
}
