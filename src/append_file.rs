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

//! `finalized_index.bin`: a monotonically growing file of concatenated
//! compressed runs, each referenced from a FINAL KV row by `(offset,
//! length)`. Append-only; nothing is ever rewritten or truncated.

use parking_lot::Mutex;

use crate::error::Result;

pub struct AppendFile {
	file: std::fs::File,
	// Serializes appends so the offsets handed back are monotonic and
	// non-overlapping, the same role parity-db gives a single writer lock
	// around its log append path.
	write_lock: Mutex<u64>,
}

impl AppendFile {
	pub fn open(path: &std::path::Path) -> Result<AppendFile> {
		let file = std::fs::OpenOptions::new().create(true).read(true).write(true).open(path)?;
		let len = file.metadata()?.len();
		log::debug!(target: "block-log-index", "Opened final append file {} at {} bytes", path.display(), len);
		Ok(AppendFile { file, write_lock: Mutex::new(len) })
	}

	/// Appends `bytes` and returns the offset they were written at.
	pub fn append(&self, bytes: &[u8]) -> Result<u64> {
		let mut end = self.write_lock.lock();
		let offset = *end;
		self.write_at(bytes, offset)?;
		*end = offset + bytes.len() as u64;
		Ok(offset)
	}

	pub fn read(&self, offset: u64, length: u32) -> Result<Vec<u8>> {
		let mut buf = vec![0u8; length as usize];
		self.read_at(&mut buf, offset)?;
		Ok(buf)
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

#[cfg(test)]
mod test {
	use super::*;

	struct TempDir(std::path::PathBuf);
	impl TempDir {
		fn new(name: &'static str) -> TempDir {
			env_logger::try_init().ok();
			let mut path = std::env::temp_dir();
			path.push("block-log-index-test");
			path.push("append-file");
			path.push(name);
			let _ = std::fs::remove_dir_all(&path);
			std::fs::create_dir_all(&path).unwrap();
			TempDir(path)
		}
	}
	impl Drop for TempDir {
		fn drop(&mut self) {
			let _ = std::fs::remove_dir_all(&self.0);
		}
	}

	#[test]
	fn append_is_monotonic_and_readable() {
		let dir = TempDir::new("append_is_monotonic_and_readable");
		let af = AppendFile::open(&dir.0.join("finalized_index.bin")).unwrap();
		let o1 = af.append(b"hello").unwrap();
		let o2 = af.append(b"world!").unwrap();
		assert_eq!(o1, 0);
		assert_eq!(o2, 5);
		assert_eq!(af.read(o1, 5).unwrap(), b"hello");
		assert_eq!(af.read(o2, 6).unwrap(), b"world!");
	}
}
