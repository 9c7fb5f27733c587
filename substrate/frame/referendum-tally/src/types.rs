// This file is part of Substrate.

// Copyright (C) Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: Apache-2.0

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Miscellaneous additional datatypes.

use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_arithmetic::traits::Saturating;

/// A proposal index.
pub type PropIndex = u32;

/// A referendum index.
pub type ReferendumIndex = u32;

/// A vote on a referendum, weighted by the balance behind it.
#[derive(Encode, MaxEncodedLen, Decode, Copy, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub struct Vote<Balance> {
	/// `true` to enact the proposal, `false` to keep the status quo.
	pub aye: bool,
	pub balance: Balance,
}

/// Info regarding an ongoing referendum.
#[derive(Encode, MaxEncodedLen, Decode, Default, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub struct Tally<Balance> {
	/// The number of aye votes.
	pub ayes: Balance,
	/// The number of nay votes.
	pub nays: Balance,
	/// The amount of funds currently expressing its opinion.
	pub turnout: Balance,
}

impl<Balance: Saturating + Copy + PartialOrd> Tally<Balance> {
	/// Add an account's vote into the tally.
	pub fn add(&mut self, vote: Vote<Balance>) {
		self.turnout = self.turnout.saturating_add(vote.balance);
		if vote.aye {
			self.ayes = self.ayes.saturating_add(vote.balance);
		} else {
			self.nays = self.nays.saturating_add(vote.balance);
		}
	}

	/// Remove an account's vote from the tally.
	pub fn remove(&mut self, vote: Vote<Balance>) {
		self.turnout = self.turnout.saturating_sub(vote.balance);
		if vote.aye {
			self.ayes = self.ayes.saturating_sub(vote.balance);
		} else {
			self.nays = self.nays.saturating_sub(vote.balance);
		}
	}

	/// Simple majority; a tie keeps the status quo.
	pub fn approved(&self) -> bool {
		self.ayes > self.nays
	}
}

/// Info regarding an ongoing referendum.
#[derive(Encode, Decode, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub struct ReferendumStatus<BlockNumber, Proposal, Balance> {
	/// When voting on this referendum will end.
	pub end: BlockNumber,
	/// The proposal being voted on.
	pub proposal: Proposal,
	/// The current tally of votes in this referendum.
	pub tally: Tally<Balance>,
}

/// Info regarding a referendum, present or past.
#[derive(Encode, Decode, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub enum ReferendumInfo<BlockNumber, Proposal, Balance> {
	/// Referendum is happening, the arg is the block number at which it will end.
	Ongoing(ReferendumStatus<BlockNumber, Proposal, Balance>),
	/// Referendum finished at `end`, and has been `approved` or rejected.
	Finished { approved: bool, end: BlockNumber },
}

impl<BlockNumber, Proposal, Balance: Default> ReferendumInfo<BlockNumber, Proposal, Balance> {
	/// Create a new instance.
	pub fn new(end: BlockNumber, proposal: Proposal) -> Self {
		ReferendumInfo::Ongoing(ReferendumStatus { end, proposal, tally: Tally::default() })
	}
}
