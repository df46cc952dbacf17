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

// KV key: `user_key || first_block_be_u32`. Big-endian is load-bearing -
// it is what makes lexicographic KV order equal numeric block order for a
// fixed user_key (spec's corrected behavior; the original source used
// host-endian, which breaks ordering on little-endian hosts).
//
// KV value (descriptor, 17 bytes): `kind:u8 || offset:u64_le ||
// length:u32_le || last_block:u32_le`.

use std::convert::TryInto;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::kv::{Column, KvBackend};
use crate::namespace::Namespace;

pub const DESCRIPTOR_LEN: usize = 17;

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum SegmentKind {
	Temp,
	Final,
}

impl SegmentKind {
	fn to_u8(self) -> u8 {
		match self {
			SegmentKind::Temp => 0x01,
			SegmentKind::Final => 0x02,
		}
	}

	fn from_u8(b: u8) -> Result<SegmentKind> {
		match b {
			0x01 => Ok(SegmentKind::Temp),
			0x02 => Ok(SegmentKind::Final),
			other => Err(Error::Corruption(format!("unknown segment kind byte {:#x}", other))),
		}
	}
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct Descriptor {
	pub kind: SegmentKind,
	pub offset: u64,
	pub length: u32,
	pub last_block: u32,
}

impl Descriptor {
	fn encode(&self) -> [u8; DESCRIPTOR_LEN] {
		let mut buf = [0u8; DESCRIPTOR_LEN];
		buf[0] = self.kind.to_u8();
		buf[1..9].copy_from_slice(&self.offset.to_le_bytes());
		buf[9..13].copy_from_slice(&self.length.to_le_bytes());
		buf[13..17].copy_from_slice(&self.last_block.to_le_bytes());
		buf
	}

	fn decode(bytes: &[u8]) -> Result<Descriptor> {
		if bytes.len() != DESCRIPTOR_LEN {
			return Err(Error::Corruption(format!("descriptor has wrong length {}", bytes.len())));
		}
		Ok(Descriptor {
			kind: SegmentKind::from_u8(bytes[0])?,
			offset: u64::from_le_bytes(bytes[1..9].try_into().unwrap()),
			length: u32::from_le_bytes(bytes[9..13].try_into().unwrap()),
			last_block: u32::from_le_bytes(bytes[13..17].try_into().unwrap()),
		})
	}
}

pub struct IndexMetaStore<K: KvBackend> {
	kv: Arc<K>,
	namespace: Namespace,
}

fn kv_key(user_key: &[u8], first_block: u32) -> Vec<u8> {
	let mut key = Vec::with_capacity(user_key.len() + 4);
	key.extend_from_slice(user_key);
	key.extend_from_slice(&first_block.to_be_bytes());
	key
}

impl<K: KvBackend> IndexMetaStore<K> {
	pub fn new(kv: Arc<K>, namespace: Namespace) -> Self {
		IndexMetaStore { kv, namespace }
	}

	fn column(&self) -> Column {
		self.namespace.column()
	}

	pub fn put(&self, user_key: &[u8], first_block: u32, descriptor: Descriptor) -> Result<()> {
		self.kv.put(self.column(), &kv_key(user_key, first_block), descriptor.encode().to_vec())
	}

	pub fn delete(&self, user_key: &[u8], first_block: u32) -> Result<()> {
		self.kv.delete(self.column(), &kv_key(user_key, first_block))
	}

	/// Segments belonging to `user_key`, ascending by `first_block`.
	pub fn segments(&self, user_key: &[u8]) -> Result<Vec<(u32, Descriptor)>> {
		let raw = self.kv.prefix_iter(self.column(), user_key)?;
		let mut out = Vec::with_capacity(raw.len());
		for (k, v) in raw {
			let suffix = &k[user_key.len()..];
			let first_block = u32::from_be_bytes(suffix.try_into().map_err(|_| {
				Error::Corruption(format!("malformed index key suffix for {}", crate::display::hex(user_key)))
			})?);
			out.push((first_block, Descriptor::decode(&v)?));
		}
		Ok(out)
	}

	/// The open TEMP segment for `user_key`, if any. At most one exists and
	/// it is always the highest `first_block` row, so a single reverse scan
	/// that stops at the first non-TEMP row suffices (open question #2).
	pub fn open_temp(&self, user_key: &[u8]) -> Result<Option<(u32, Descriptor)>> {
		let segments = self.segments(user_key)?;
		for (first_block, descriptor) in segments.into_iter().rev() {
			if descriptor.kind == SegmentKind::Temp {
				return Ok(Some((first_block, descriptor)));
			}
		}
		Ok(None)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::kv::MemKv;
	use std::sync::Arc;

	#[test]
	fn descriptor_roundtrips_through_kv() {
		let kv = Arc::new(MemKv::new());
		let store = IndexMetaStore::new(kv, Namespace::Addresses);
		let key = [0x11u8; 20];
		let d = Descriptor { kind: SegmentKind::Temp, offset: 4096, length: 3, last_block: 30 };
		store.put(&key, 10, d).unwrap();

		let segments = store.segments(&key).unwrap();
		assert_eq!(segments, vec![(10, d)]);
	}

	#[test]
	fn big_endian_suffix_preserves_numeric_order() {
		let kv = Arc::new(MemKv::new());
		let store = IndexMetaStore::new(kv, Namespace::Addresses);
		let key = [0x22u8; 20];
		let d1 = Descriptor { kind: SegmentKind::Final, offset: 0, length: 10, last_block: 300 };
		let d2 = Descriptor { kind: SegmentKind::Temp, offset: 4096, length: 1, last_block: 257 };
		// 257 crosses a byte boundary (0x00ff -> 0x0101); big-endian keeps it ordered after 0.
		store.put(&key, 257, d2).unwrap();
		store.put(&key, 0, d1).unwrap();

		let segments = store.segments(&key).unwrap();
		assert_eq!(segments.iter().map(|(b, _)| *b).collect::<Vec<_>>(), vec![0, 257]);
	}

	#[test]
	fn open_temp_finds_the_last_temp_row() {
		let kv = Arc::new(MemKv::new());
		let store = IndexMetaStore::new(kv, Namespace::Addresses);
		let key = [0x33u8; 20];
		store
			.put(&key, 0, Descriptor { kind: SegmentKind::Final, offset: 0, length: 10, last_block: 1023 })
			.unwrap();
		store
			.put(&key, 1024, Descriptor { kind: SegmentKind::Temp, offset: 4096, length: 5, last_block: 1028 })
			.unwrap();

		let (first_block, descriptor) = store.open_temp(&key).unwrap().unwrap();
		assert_eq!(first_block, 1024);
		assert_eq!(descriptor.last_block, 1028);
	}
}
