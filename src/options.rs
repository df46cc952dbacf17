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

use std::path::{Path, PathBuf};

use crate::codec::CompressionType;

pub const TEMP_FILE_NAME: &str = "temp_index.bin";
pub const FINAL_FILE_NAME: &str = "finalized_index.bin";
pub const LOCK_FILE_NAME: &str = ".lock";

#[derive(Clone, Debug)]
pub struct Options {
	pub path: PathBuf,
	pub compression: CompressionType,
}

impl Options {
	pub fn with_path(path: impl AsRef<Path>) -> Options {
		Options { path: path.as_ref().to_path_buf(), compression: CompressionType::default() }
	}

	pub fn compression(mut self, compression: CompressionType) -> Options {
		self.compression = compression;
		self
	}
}
