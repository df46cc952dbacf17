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

//! Addresses and topics share all engine code; the only thing that differs
//! between them is key width and which KV column their rows live in. That
//! distinction is carried as a value (`Namespace`) rather than via two
//! near-identical types, the way `column.rs` carries tier/column id as a
//! plain `ColId` rather than via per-tier types.

pub const ADDRESS_KEY_LEN: usize = 20;
pub const TOPIC_KEY_LEN: usize = 32;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Namespace {
	Addresses,
	Topics,
}

impl Namespace {
	pub fn key_width(&self) -> usize {
		match self {
			Namespace::Addresses => ADDRESS_KEY_LEN,
			Namespace::Topics => TOPIC_KEY_LEN,
		}
	}

	pub fn column(&self) -> super::kv::Column {
		match self {
			Namespace::Addresses => super::kv::Column::Addresses,
			Namespace::Topics => super::kv::Column::Topics,
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Namespace::Addresses => "addresses",
			Namespace::Topics => "topics",
		}
	}
}

impl std::fmt::Display for Namespace {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}
