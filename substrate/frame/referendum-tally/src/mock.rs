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

//! Test utilities

use super::*;
use frame_block_system::InMemoryStorage;
use sp_hook_weights::{CostModel, RuntimeDbWeight, WeightTable};

pub struct Test;
impl Config for Test {
	type AccountId = u64;
	type Proposal = u32;
	type Balance = u64;
	type WeightInfo = TableWeights;
}

pub type ReferendumTally = Pallet<Test>;

pub const LAUNCH_PERIOD: BlockNumber = 3;
pub const VOTING_PERIOD: BlockNumber = 2;
pub const ENACTMENT_PERIOD: BlockNumber = 2;
pub const MAX_REFERENDA: u32 = 4;

pub fn weight_table() -> WeightTable {
	WeightTable::new(1, RuntimeDbWeight { read: 0, write: 0 })
		.with(weights::ON_INITIALIZE_BASE, CostModel::constant(Weight::from_parts(5, 2)))
		.with(
			weights::LAUNCH_NEXT,
			CostModel::constant(Weight::from_parts(40, 20))
				.with_component("r", Weight::from_parts(7, 3))
				.with_component("p", Weight::from_parts(5, 2)),
		)
		.with(
			weights::BAKE_REFERENDA,
			CostModel::constant(Weight::from_parts(30, 10))
				.with_component("k", Weight::from_parts(11, 4)),
		)
		.with(weights::PROPOSE, CostModel::constant(Weight::from_parts(25, 10)))
		.with(weights::VOTE, CostModel::constant(Weight::from_parts(20, 8)))
}

pub fn config() -> ReferendumConfig<u64> {
	ReferendumConfig {
		launch_period: LAUNCH_PERIOD,
		voting_period: VOTING_PERIOD,
		enactment_period: ENACTMENT_PERIOD,
		minimum_deposit: 1,
		max_proposals: 3,
		max_referenda: MAX_REFERENDA,
	}
}

pub fn referenda() -> ReferendumTally {
	ReferendumTally::new(TableWeights::from_table(&weight_table()).unwrap(), config())
}

pub fn new_test_ext() -> InMemoryStorage {
	let _ = env_logger::builder().is_test(true).try_init();
	InMemoryStorage::new()
}

pub fn aye(balance: u64) -> Vote<u64> {
	Vote { aye: true, balance }
}

pub fn nay(balance: u64) -> Vote<u64> {
	Vote { aye: false, balance }
}
