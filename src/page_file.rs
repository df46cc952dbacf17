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

// On-disk layout: `temp_index.bin` is a flat sequence of fixed 4096-byte
// pages. Each page holds up to PAGE/4 raw little-endian u32 block numbers,
// written in ascending entry order starting at entry 0. No headers, no
// magic - the owning TEMP segment's KV row is the only thing that gives a
// page offset meaning.

use std::convert::TryInto;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

pub const PAGE: usize = 4096;
pub const ENTRIES_PER_PAGE: usize = PAGE / 4;

pub struct PageFile {
	file: std::fs::File,
	len: AtomicU64,
}

impl PageFile {
	pub fn open(path: &std::path::Path) -> Result<PageFile> {
		let file = std::fs::OpenOptions::new().create(true).read(true).write(true).open(path)?;
		let len = file.metadata()?.len();
		debug_assert_eq!(len as usize % PAGE, 0, "temp index file length must be a multiple of PAGE");
		log::debug!(target: "block-log-index", "Opened temp page file {} with {} pages", path.display(), len as usize / PAGE);
		Ok(PageFile { file, len: AtomicU64::new(len) })
	}

	/// Number of whole pages currently allocated.
	pub fn page_count(&self) -> u64 {
		self.len.load(Ordering::Relaxed) / PAGE as u64
	}

	/// Grows the file by one PAGE and returns the offset of the new page
	/// (the old end-of-file offset).
	pub fn allocate_page(&self) -> Result<u64> {
		let offset = self.len.fetch_add(PAGE as u64, Ordering::Relaxed);
		self.file.set_len(offset + PAGE as u64)?;
		Ok(offset)
	}

	/// Random read of up to PAGE bytes starting at `offset`.
	pub fn read_page(&self, offset: u64, n_bytes: usize) -> Result<Vec<u8>> {
		assert!(n_bytes <= PAGE);
		let mut buf = vec![0u8; n_bytes];
		self.read_at(&mut buf, offset)?;
		Ok(buf)
	}

	/// Writes a single 4-byte little-endian block number at entry
	/// `entry_index` within the page at `offset`.
	pub fn write_entry(&self, offset: u64, entry_index: usize, value: u32) -> Result<()> {
		assert!(entry_index < ENTRIES_PER_PAGE, "entry index {} out of bounds for page", entry_index);
		self.write_at(&value.to_le_bytes(), offset + (4 * entry_index) as u64)
	}

	/// Reads the raw page contents back out as a sequence of u32 block
	/// numbers, `length` entries long.
	pub fn read_entries(&self, offset: u64, length: usize) -> Result<Vec<u32>> {
		let bytes = self.read_page(offset, length * 4)?;
		Ok(bytes.chunks_exact(4).map(|c| u32::from_le_bytes(c.try_into().unwrap())).collect())
	}

	#[cfg(unix)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt;
		Ok(self.file.read_exact_at(buf, offset)?)
	}

	#[cfg(unix)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::unix::fs::FileExt;
		Ok(self.file.write_all_at(buf, offset)?)
	}

	#[cfg(windows)]
	fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt;
		let mut total = 0;
		while total < buf.len() {
			let n = self.file.seek_read(&mut buf[total..], offset + total as u64)?;
			total += n;
		}
		Ok(())
	}

	#[cfg(windows)]
	fn write_at(&self, buf: &[u8], offset: u64) -> Result<()> {
		use std::os::windows::fs::FileExt;
		let mut total = 0;
		while total < buf.len() {
			let n = self.file.seek_write(&buf[total..], offset + total as u64)?;
			total += n;
		}
		Ok(())
	}

	pub fn flush(&self) -> Result<()> {
		Ok(self.file.sync_data()?)
	}
}
