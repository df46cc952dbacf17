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

//! `range_scan`: walks a key's segments in ascending `first_block` order
//! and stitches the overlapping ones into a single ascending block-number
//! sequence. Readers never take the per-key write lock (spec §5) - they
//! only ever see segments as already published by a completed KV `put`.
//!
//! The sequence is lazy and single-pass: segment bytes are loaded and
//! decompressed one segment at a time, only as the caller pulls the next
//! item, so a wide scan over a popular key never buffers more than one
//! segment's contents at once and a caller can stop early without paying
//! for the rest.

use crate::append_file::AppendFile;
use crate::error::Result;
use crate::kv::KvBackend;
use crate::meta_store::{Descriptor, IndexMetaStore, SegmentKind};
use crate::page_file::PageFile;
use crate::codec::CompressionType;

pub struct Reader<'a, K: KvBackend> {
	pub page_file: &'a PageFile,
	pub append_file: &'a AppendFile,
	pub meta: &'a IndexMetaStore<K>,
	pub compression: CompressionType,
}

impl<'a, K: KvBackend> Reader<'a, K> {
	/// A lazy, ascending sequence of block numbers for `key` within
	/// `[from, to]`. Segment metadata is resolved up front (one KV prefix
	/// scan); segment *contents* are only read and decompressed as the
	/// iterator is driven.
	pub fn range_scan(&self, key: &[u8], from: u32, to: u32) -> Result<RangeScan<'a>> {
		let segments = self.meta.segments(key)?;
		Ok(RangeScan {
			page_file: self.page_file,
			append_file: self.append_file,
			compression: self.compression,
			segments,
			index: 0,
			from,
			to,
			current: None,
			done: from > to,
		})
	}
}

/// Single-pass iterator over one `range_scan` call. Restartable only by
/// issuing a fresh `range_scan` (spec §9).
pub struct RangeScan<'a> {
	page_file: &'a PageFile,
	append_file: &'a AppendFile,
	compression: CompressionType,
	segments: Vec<(u32, Descriptor)>,
	index: usize,
	from: u32,
	to: u32,
	// The currently loaded segment's decompressed blocks plus a cursor into
	// them; at most one of these buffers is live at a time.
	current: Option<(Vec<u32>, usize)>,
	done: bool,
}

impl<'a> RangeScan<'a> {
	fn load_segment(&self, descriptor: &Descriptor) -> Result<Vec<u32>> {
		match descriptor.kind {
			SegmentKind::Temp => self.page_file.read_entries(descriptor.offset, descriptor.length as usize),
			SegmentKind::Final => {
				let bytes = self.append_file.read(descriptor.offset, descriptor.length)?;
				self.compression.decompress(&bytes)
			}
		}
	}

	/// Advances past non-overlapping segments and loads the next
	/// overlapping one into `current`. Returns `false` once the segment
	/// list is exhausted.
	fn advance_segment(&mut self) -> Result<bool> {
		while self.index < self.segments.len() {
			let (first_block, descriptor) = self.segments[self.index];
			let next_first_block = self.segments.get(self.index + 1).map(|(fb, _)| *fb);
			self.index += 1;

			// A segment overlaps [from,to] iff its first_block is within
			// range, or `from` falls strictly before the next segment's
			// first_block (using the next one's first_block as an upper
			// fence avoids reading this segment's contents just to reject
			// it - spec §4.8 step 3).
			let overlaps = first_block <= self.to && next_first_block.map_or(true, |n| n > self.from);
			if !overlaps {
				continue;
			}

			let blocks = self.load_segment(&descriptor)?;
			let start = blocks.partition_point(|b| *b < self.from);
			self.current = Some((blocks, start));
			return Ok(true);
		}
		Ok(false)
	}
}

impl<'a> Iterator for RangeScan<'a> {
	type Item = Result<u32>;

	fn next(&mut self) -> Option<Result<u32>> {
		if self.done {
			return None;
		}
		loop {
			if let Some((blocks, pos)) = &mut self.current {
				if *pos < blocks.len() {
					let b = blocks[*pos];
					*pos += 1;
					if b > self.to {
						// Segments are strictly increasing in block range,
						// so every later segment can only hold larger
						// blocks too - halt the whole scan.
						self.done = true;
						self.current = None;
						return None;
					}
					return Some(Ok(b));
				}
				self.current = None;
				continue;
			}

			match self.advance_segment() {
				Ok(true) => continue,
				Ok(false) => {
					self.done = true;
					return None;
				}
				Err(e) => {
					self.done = true;
					return Some(Err(e));
				}
			}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::error::Result;
	use crate::kv::MemKv;
	use crate::namespace::Namespace;

	fn descriptor(kind: SegmentKind, offset: u64, length: u32, last_block: u32) -> Descriptor {
		Descriptor { kind, offset, length, last_block }
	}

	fn collect(scan: RangeScan<'_>) -> Vec<u32> {
		scan.collect::<Result<Vec<u32>>>().unwrap()
	}

	struct Fixture {
		_dir: std::path::PathBuf,
		page_file: PageFile,
		append_file: AppendFile,
		kv: std::sync::Arc<MemKv>,
	}

	impl Fixture {
		fn new(name: &'static str) -> Self {
			env_logger::try_init().ok();
			let mut dir = std::env::temp_dir();
			dir.push("block-log-index-test");
			dir.push("reader");
			dir.push(name);
			let _ = std::fs::remove_dir_all(&dir);
			std::fs::create_dir_all(&dir).unwrap();
			let page_file = PageFile::open(&dir.join("temp_index.bin")).unwrap();
			let append_file = AppendFile::open(&dir.join("finalized_index.bin")).unwrap();
			Fixture { _dir: dir, page_file, append_file, kv: std::sync::Arc::new(MemKv::new()) }
		}
	}

	#[test]
	fn single_temp_segment_range_queries() {
		let fx = Fixture::new("single_temp_segment");
		let meta = IndexMetaStore::new(fx.kv.clone(), Namespace::Addresses);
		let reader = Reader { page_file: &fx.page_file, append_file: &fx.append_file, meta: &meta, compression: CompressionType::Lz4 };

		let key = [0x11u8; 20];
		let offset = fx.page_file.allocate_page().unwrap();
		for (i, b) in [10u32, 20, 30, 40, 50].iter().enumerate() {
			fx.page_file.write_entry(offset, i, *b).unwrap();
		}
		meta.put(&key, 10, descriptor(SegmentKind::Temp, offset, 5, 50)).unwrap();

		assert_eq!(collect(reader.range_scan(&key, 15, 45).unwrap()), vec![20, 30, 40]);
		assert_eq!(collect(reader.range_scan(&key, 0, 5).unwrap()), Vec::<u32>::new());
		assert_eq!(collect(reader.range_scan(&key, 30, 30).unwrap()), vec![30]);
	}

	#[test]
	fn unknown_key_is_empty() {
		let fx = Fixture::new("unknown_key");
		let meta = IndexMetaStore::new(fx.kv.clone(), Namespace::Addresses);
		let reader = Reader { page_file: &fx.page_file, append_file: &fx.append_file, meta: &meta, compression: CompressionType::Lz4 };
		assert_eq!(collect(reader.range_scan(&[0x99u8; 20], 0, 100).unwrap()), Vec::<u32>::new());
	}

	#[test]
	fn stitches_final_and_temp_segments() {
		let fx = Fixture::new("stitches_final_and_temp");
		let meta = IndexMetaStore::new(fx.kv.clone(), Namespace::Addresses);
		let reader = Reader { page_file: &fx.page_file, append_file: &fx.append_file, meta: &meta, compression: CompressionType::Lz4 };
		let key = [0x22u8; 20];

		let final_blocks: Vec<u32> = (0..1024u32).collect();
		let compressed = CompressionType::Lz4.compress(&final_blocks);
		let final_offset = fx.append_file.append(&compressed).unwrap();
		meta.put(&key, 0, descriptor(SegmentKind::Final, final_offset, compressed.len() as u32, 1023)).unwrap();

		let temp_offset = fx.page_file.allocate_page().unwrap();
		for (i, b) in (1024u32..=1100u32).enumerate() {
			fx.page_file.write_entry(temp_offset, i, b).unwrap();
		}
		meta.put(&key, 1024, descriptor(SegmentKind::Temp, temp_offset, 77, 1100)).unwrap();

		assert_eq!(collect(reader.range_scan(&key, 1000, 1100).unwrap()), (1000..=1100).collect::<Vec<_>>());
		assert_eq!(collect(reader.range_scan(&key, 500, 500).unwrap()), vec![500]);
	}

	#[test]
	fn halts_scan_once_upper_bound_exceeded() {
		let fx = Fixture::new("halts_scan");
		let meta = IndexMetaStore::new(fx.kv.clone(), Namespace::Addresses);
		let reader = Reader { page_file: &fx.page_file, append_file: &fx.append_file, meta: &meta, compression: CompressionType::Lz4 };
		let key = [0x33u8; 20];

		let offset = fx.page_file.allocate_page().unwrap();
		for (i, b) in [5u32, 15, 25].iter().enumerate() {
			fx.page_file.write_entry(offset, i, *b).unwrap();
		}
		meta.put(&key, 5, descriptor(SegmentKind::Temp, offset, 3, 25)).unwrap();

		assert_eq!(collect(reader.range_scan(&key, 0, 15).unwrap()), vec![5, 15]);
	}

	#[test]
	fn scan_is_lazy_and_stops_pulling_after_the_first_segment() {
		let fx = Fixture::new("lazy_stops_early");
		let meta = IndexMetaStore::new(fx.kv.clone(), Namespace::Addresses);
		let reader = Reader { page_file: &fx.page_file, append_file: &fx.append_file, meta: &meta, compression: CompressionType::Lz4 };
		let key = [0x44u8; 20];

		let offset = fx.page_file.allocate_page().unwrap();
		for (i, b) in [1u32, 2, 3].iter().enumerate() {
			fx.page_file.write_entry(offset, i, *b).unwrap();
		}
		meta.put(&key, 1, descriptor(SegmentKind::Temp, offset, 3, 3)).unwrap();
		// A descriptor pointing at a page that was never written; reading it
		// would panic on a short read. A lazy scan that only takes the
		// first item must never touch this second segment.
		meta.put(&key, 1_000_000, descriptor(SegmentKind::Temp, 9_999_999_999, 1, 1_000_000)).unwrap();

		let mut scan = reader.range_scan(&key, 0, 2_000_000).unwrap();
		assert_eq!(scan.next().unwrap().unwrap(), 1);
	}
}
