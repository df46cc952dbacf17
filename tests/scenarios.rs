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

//! Black-box scenario tests (S1-S6) against the public `Db` API.

use std::sync::Arc;
use std::thread;

use block_log_index::{
	namespace::ADDRESS_KEY_LEN,
	options::Options,
	receipts::{Log, Receipt},
	Db,
};

fn fresh(name: &'static str) -> Options {
	env_logger::try_init().ok();
	let mut dir = std::env::temp_dir();
	dir.push("block-log-index-test");
	dir.push("scenarios");
	dir.push(name);
	let _ = std::fs::remove_dir_all(&dir);
	Options::with_path(dir)
}

fn ingest_one(db: &Db<impl block_log_index::kv::KvBackend>, block: u32, address: [u8; ADDRESS_KEY_LEN]) {
	let receipt = Receipt { logs: vec![Log { address, topics: vec![] }] };
	db.set_receipts(block, &[receipt], false).unwrap();
}

fn query(db: &Db<impl block_log_index::kv::KvBackend>, key: &[u8], from: u32, to: u32) -> Vec<u32> {
	db.get_block_numbers(key, from, to).unwrap().collect::<block_log_index::error::Result<Vec<u32>>>().unwrap()
}

#[test]
fn s1_single_segment_single_query() {
	let db = Db::open(fresh("s1")).unwrap();
	let key = [0x11u8; ADDRESS_KEY_LEN];
	for block in [10u32, 20, 30, 40, 50] {
		ingest_one(&db, block, key);
	}

	assert_eq!(query(&db, &key, 15, 45), vec![20, 30, 40]);
	assert_eq!(query(&db, &key, 0, 5), Vec::<u32>::new());
	assert_eq!(query(&db, &key, 30, 30), vec![30]);
}

#[test]
fn s2_promotion_boundary() {
	let db = Db::open(fresh("s2")).unwrap();
	let key = [0x22u8; ADDRESS_KEY_LEN];
	for block in 0..1024u32 {
		ingest_one(&db, block, key);
	}

	assert_eq!(query(&db, &key, 500, 500), vec![500]);
	assert_eq!(query(&db, &key, 0, 1023), (0..1024u32).collect::<Vec<_>>());
}

#[test]
fn s3_two_segments() {
	let db = Db::open(fresh("s3")).unwrap();
	let key = [0x33u8; ADDRESS_KEY_LEN];
	for block in 0..=1500u32 {
		ingest_one(&db, block, key);
	}

	assert_eq!(query(&db, &key, 1000, 1100), (1000..=1100u32).collect::<Vec<_>>());
}

#[test]
fn s4_duplicate_backward_replay() {
	let db = Db::open(fresh("s4")).unwrap();
	let key = [0x44u8; ADDRESS_KEY_LEN];
	for block in [10u32, 20, 30, 40, 50] {
		ingest_one(&db, block, key);
	}
	ingest_one(&db, 30, key);

	assert_eq!(query(&db, &key, 15, 45), vec![20, 30, 40]);
}

#[test]
fn s5_two_keys_concurrent_ingest() {
	let db = Arc::new(Db::open(fresh("s5")).unwrap());
	let k1 = [0x55u8; ADDRESS_KEY_LEN];
	let k2 = [0x66u8; ADDRESS_KEY_LEN];

	let db1 = db.clone();
	let t1 = thread::spawn(move || {
		for block in 0..500u32 {
			ingest_one(&db1, block, k1);
		}
	});
	let db2 = db.clone();
	let t2 = thread::spawn(move || {
		for block in 0..500u32 {
			ingest_one(&db2, block, k2);
		}
	});
	t1.join().unwrap();
	t2.join().unwrap();

	assert_eq!(query(&db, &k1, 0, 499), (0..500u32).collect::<Vec<_>>());
	assert_eq!(query(&db, &k2, 0, 499), (0..500u32).collect::<Vec<_>>());
}

#[test]
fn s6_unknown_key_is_empty() {
	let db = Db::open(fresh("s6")).unwrap();
	assert_eq!(query(&db, &[0x77u8; ADDRESS_KEY_LEN], 0, 1_000_000), Vec::<u32>::new());
}
