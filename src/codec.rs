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

//! Compresses a packed little-endian `u32[]` of ascending block numbers to
//! an opaque byte run and back. Deterministic, stateless; any of the
//! general-purpose byte compressors parity-db already links against
//! (`lz4`, `zstd`, `snap`) satisfies the contract.

use crate::error::{Error, Result};

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CompressionType {
	NoCompression,
	Lz4,
	Zstd,
	Snappy,
}

impl Default for CompressionType {
	fn default() -> Self {
		CompressionType::Lz4
	}
}

impl CompressionType {
	pub fn compress(&self, blocks: &[u32]) -> Vec<u8> {
		let packed = pack(blocks);
		match self {
			CompressionType::NoCompression => packed,
			CompressionType::Lz4 => lz4::block::compress(&packed, None, false)
				.expect("lz4 compression of in-memory buffer cannot fail"),
			CompressionType::Zstd => zstd::bulk::compress(&packed, 0)
				.expect("zstd compression of in-memory buffer cannot fail"),
			CompressionType::Snappy => {
				let mut encoder = snap::raw::Encoder::new();
				encoder.compress_vec(&packed).expect("snap compression of in-memory buffer cannot fail")
			}
		}
	}

	pub fn decompress(&self, bytes: &[u8]) -> Result<Vec<u32>> {
		let packed = match self {
			CompressionType::NoCompression => bytes.to_vec(),
			CompressionType::Lz4 => {
				// Runs never exceed one page (1024 entries, 4096 bytes).
				lz4::block::decompress(bytes, Some(crate::page_file::PAGE as i32))
					.map_err(|e| Error::Corruption(format!("lz4 decompress failed: {}", e)))?
			}
			CompressionType::Zstd => zstd::bulk::decompress(bytes, crate::page_file::PAGE)
				.map_err(|e| Error::Corruption(format!("zstd decompress failed: {}", e)))?,
			CompressionType::Snappy => {
				let mut decoder = snap::raw::Decoder::new();
				decoder
					.decompress_vec(bytes)
					.map_err(|e| Error::Corruption(format!("snappy decompress failed: {}", e)))?
			}
		};
		Ok(unpack(&packed))
	}
}

fn pack(blocks: &[u32]) -> Vec<u8> {
	let mut out = Vec::with_capacity(blocks.len() * 4);
	for b in blocks {
		out.extend_from_slice(&b.to_le_bytes());
	}
	out
}

fn unpack(bytes: &[u8]) -> Vec<u32> {
	bytes.chunks_exact(4).map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

#[cfg(test)]
mod test {
	use super::CompressionType;

	fn roundtrip(kind: CompressionType) {
		let blocks: Vec<u32> = (0..1024u32).map(|i| i * 3).collect();
		let compressed = kind.compress(&blocks);
		let decompressed = kind.decompress(&compressed).unwrap();
		assert_eq!(blocks, decompressed);
	}

	#[test]
	fn roundtrip_none() {
		roundtrip(CompressionType::NoCompression);
	}

	#[test]
	fn roundtrip_lz4() {
		roundtrip(CompressionType::Lz4);
	}

	#[test]
	fn roundtrip_zstd() {
		roundtrip(CompressionType::Zstd);
	}

	#[test]
	fn roundtrip_snappy() {
		roundtrip(CompressionType::Snappy);
	}

	#[test]
	fn roundtrip_empty() {
		let blocks: Vec<u32> = Vec::new();
		for kind in [CompressionType::NoCompression, CompressionType::Lz4, CompressionType::Zstd, CompressionType::Snappy] {
			let compressed = kind.compress(&blocks);
			assert_eq!(kind.decompress(&compressed).unwrap(), blocks);
		}
	}
}
