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

//! The receipt/log data source is an external collaborator (spec §1): the
//! engine only needs the address and topics one log emits, not anything
//! about how the upstream block processor produced them.

use crate::namespace::{ADDRESS_KEY_LEN, TOPIC_KEY_LEN};

pub type Address = [u8; ADDRESS_KEY_LEN];
pub type Topic = [u8; TOPIC_KEY_LEN];

#[derive(Clone, Debug)]
pub struct Log {
	pub address: Address,
	pub topics: Vec<Topic>,
}

#[derive(Clone, Debug, Default)]
pub struct Receipt {
	pub logs: Vec<Log>,
}
