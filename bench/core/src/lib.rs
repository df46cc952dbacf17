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

//! Synthetic workload generation shared by the `stress` binary.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use block_log_index::namespace::{ADDRESS_KEY_LEN, TOPIC_KEY_LEN};
use block_log_index::receipts::{Address, Log, Receipt, Topic};

/// A workload with a fixed universe of addresses/topics, so repeated blocks
/// hit the same keys the way a real chain's frequent emitters would.
pub struct Workload {
	rng: SmallRng,
	addresses: Vec<Address>,
	topics: Vec<Topic>,
	logs_per_block: usize,
}

impl Workload {
	pub fn new(seed: u64, address_universe: usize, topic_universe: usize, logs_per_block: usize) -> Workload {
		let mut rng = SmallRng::seed_from_u64(seed);
		let addresses = (0..address_universe).map(|_| random_bytes::<ADDRESS_KEY_LEN>(&mut rng)).collect();
		let topics = (0..topic_universe).map(|_| random_bytes::<TOPIC_KEY_LEN>(&mut rng)).collect();
		Workload { rng, addresses, topics, logs_per_block }
	}

	/// A receipt containing `logs_per_block` logs drawn from the fixed
	/// address/topic universe, each with zero to three topics.
	pub fn next_receipt(&mut self) -> Receipt {
		let logs = (0..self.logs_per_block)
			.map(|_| {
				let address = self.addresses[self.rng.gen_range(0..self.addresses.len())];
				let topic_count = self.rng.gen_range(0..=3);
				let topics =
					(0..topic_count).map(|_| self.topics[self.rng.gen_range(0..self.topics.len())]).collect();
				Log { address, topics }
			})
			.collect();
		Receipt { logs }
	}

	pub fn sample_address(&mut self) -> Address {
		self.addresses[self.rng.gen_range(0..self.addresses.len())]
	}
}

fn random_bytes<const N: usize>(rng: &mut SmallRng) -> [u8; N] {
	let mut out = [0u8; N];
	rng.fill(&mut out[..]);
	out
}
