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

use std::path::PathBuf;

use structopt::StructOpt;

use block_log_index::{options::Options, Db};

#[cfg(all(not(windows), not(target_env = "musl")))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[derive(StructOpt)]
#[structopt(name = "block-log-index-admin", about = "Inspect an on-disk log index")]
struct Args {
	/// Path to the index directory.
	#[structopt(long, parse(from_os_str))]
	path: PathBuf,

	#[structopt(subcommand)]
	command: Command,
}

#[derive(StructOpt)]
enum Command {
	/// Print page and free-list counts.
	Stat,
	/// Print every segment recorded for a key.
	Segments {
		/// Key, hex-encoded (20 bytes for an address, 32 for a topic).
		#[structopt(long)]
		key: String,
	},
}

fn main() {
	if let Err(e) = fdlimit::raise_fd_limit() {
		log::warn!(target: "block-log-index", "Failed to raise file descriptor limit: {:?}", e);
	}
	env_logger::init();

	let args = Args::from_args();
	if let Err(e) = run(args) {
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
}

fn run(args: Args) -> block_log_index::error::Result<()> {
	let db = Db::open(Options::with_path(&args.path))?;

	match args.command {
		Command::Stat => {
			println!("temp pages: {}", db.temp_page_count());
			println!("free pages: {}", db.free_page_count()?);
		}
		Command::Segments { key } => {
			let key = hex::decode(key.trim_start_matches("0x"))
				.map_err(|e| block_log_index::error::Error::Corruption(format!("invalid hex key: {}", e)))?;
			for (first_block, descriptor) in db.segments(&key)? {
				println!(
					"first_block={} kind={:?} offset={} length={} last_block={}",
					first_block, descriptor.kind, descriptor.offset, descriptor.length, descriptor.last_block,
				);
			}
		}
	}

	db.close()
}
