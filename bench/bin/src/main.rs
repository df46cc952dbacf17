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

//! Soak-tests `Db` with a synthetic workload: ingests a run of blocks, then
//! issues random range queries against the result, reporting throughput for
//! both phases. Not a correctness test (see `tests/scenarios.rs` for that) -
//! this is for eyeballing regressions in ingest/query latency.

use std::path::PathBuf;
use std::time::Instant;

use structopt::StructOpt;

use block_log_index::{options::Options, Db};
use db_bench::Workload;

#[cfg(all(not(windows), not(target_env = "musl")))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(StructOpt)]
#[structopt(name = "stress", about = "Soak-test the log index")]
struct Args {
	#[structopt(long, parse(from_os_str))]
	path: PathBuf,
	#[structopt(long, default_value = "100000")]
	blocks: u32,
	#[structopt(long, default_value = "1000")]
	addresses: usize,
	#[structopt(long, default_value = "200")]
	topics: usize,
	#[structopt(long, default_value = "8")]
	logs_per_block: usize,
	#[structopt(long, default_value = "1000")]
	queries: u32,
	#[structopt(long, default_value = "1")]
	seed: u64,
}

fn main() {
	env_logger::init();
	let args = Args::from_args();

	let db = Db::open(Options::with_path(&args.path)).expect("failed to open index");
	let mut workload = Workload::new(args.seed, args.addresses, args.topics, args.logs_per_block);

	let ingest_start = Instant::now();
	for block in 0..args.blocks {
		let receipt = workload.next_receipt();
		db.set_receipts(block, &[receipt], false).expect("ingest failed");
	}
	let ingest_elapsed = ingest_start.elapsed();
	println!(
		"ingested {} blocks in {:?} ({:.0} blocks/s)",
		args.blocks,
		ingest_elapsed,
		args.blocks as f64 / ingest_elapsed.as_secs_f64(),
	);

	let query_start = Instant::now();
	let mut total_hits = 0usize;
	for _ in 0..args.queries {
		let key = workload.sample_address();
		for block in db.get_block_numbers(&key, 0, args.blocks).expect("query failed") {
			block.expect("query failed");
			total_hits += 1;
		}
	}
	let query_elapsed = query_start.elapsed();
	println!(
		"ran {} queries ({} total hits) in {:?} ({:.0} queries/s)",
		args.queries,
		total_hits,
		query_elapsed,
		args.queries as f64 / query_elapsed.as_secs_f64(),
	);

	db.close().expect("close failed");
}
