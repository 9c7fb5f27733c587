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

//! A small runtime wiring both example hooks to one benchmarking artifact.

#![allow(dead_code)]

use frame_block_system::{
	BlockNumber, DispatchClass, DispatchInfo, InMemoryStorage, OnInitialize, Storage,
	StorageValue, Weight,
};
use pallet_referendum_tally::ReferendumConfig;
use pallet_session_rotation::{GenesisConfig, PeriodicSessions, SessionRotationConfig};
use sp_hook_weights::WeightTable;

pub struct Runtime;

impl pallet_session_rotation::Config for Runtime {
	type ValidatorId = u64;
	type Keys = u64;
	type SessionManager = ();
	type SessionHandler = ();
	type ShouldEndSession = PeriodicSessions;
	type WeightInfo = pallet_session_rotation::TableWeights;
}

impl pallet_referendum_tally::Config for Runtime {
	type AccountId = u64;
	type Proposal = u32;
	type Balance = u64;
	type WeightInfo = pallet_referendum_tally::TableWeights;
}

pub type Session = pallet_session_rotation::Pallet<Runtime>;
pub type Referenda = pallet_referendum_tally::Pallet<Runtime>;

pub const SESSION_PERIOD: BlockNumber = 10;
pub const LAUNCH_PERIOD: BlockNumber = 3;
pub const MAX_VALIDATORS: u32 = 400;

/// Reads cost one unit of reference time, writes two.
pub const ARTIFACT: &str = r#"{
	"version": 1,
	"dbWeight": { "read": 1, "write": 2 },
	"operations": {
		"pallet_session_rotation::should_end_session": {
			"baseWeight": { "refTime": 9, "proofSize": 5 },
			"baseReads": 1
		},
		"pallet_session_rotation::rotate_session": {
			"baseWeight": { "refTime": 93, "proofSize": 50 },
			"baseReads": 3,
			"baseWrites": 2,
			"components": [
				{ "name": "v", "weight": { "refTime": 2, "proofSize": 1 } },
				{ "name": "n", "weight": { "refTime": 0, "proofSize": 1 }, "reads": 1 },
				{ "name": "q", "weight": { "refTime": 0, "proofSize": 2 } },
				{ "name": "c", "weight": { "refTime": 3, "proofSize": 0 } }
			]
		},
		"pallet_session_rotation::set_keys": {
			"baseWeight": { "refTime": 20, "proofSize": 10 }
		},
		"pallet_session_rotation::purge_keys": {
			"baseWeight": { "refTime": 15, "proofSize": 10 }
		},
		"pallet_referendum_tally::on_initialize_base": {
			"baseWeight": { "refTime": 3, "proofSize": 2 },
			"baseReads": 2
		},
		"pallet_referendum_tally::launch_next": {
			"baseWeight": { "refTime": 40, "proofSize": 20 },
			"components": [
				{ "name": "r", "weight": { "refTime": 6, "proofSize": 3 }, "reads": 1 },
				{ "name": "p", "weight": { "refTime": 4, "proofSize": 2 }, "reads": 1 }
			]
		},
		"pallet_referendum_tally::bake_referenda": {
			"baseWeight": { "refTime": 30, "proofSize": 10 },
			"components": [
				{ "name": "k", "weight": { "refTime": 11, "proofSize": 4 } }
			]
		},
		"pallet_referendum_tally::propose": {
			"baseWeight": { "refTime": 25, "proofSize": 10 }
		},
		"pallet_referendum_tally::vote": {
			"baseWeight": { "refTime": 20, "proofSize": 8 }
		}
	}
}"#;

pub fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn weight_table() -> WeightTable {
	let table = WeightTable::from_json(ARTIFACT).unwrap();
	table.ensure_version(1).unwrap();
	table
}

pub fn session() -> Session {
	Session::new(
		PeriodicSessions { period: SESSION_PERIOD, offset: 0 },
		pallet_session_rotation::TableWeights::from_table(&weight_table()).unwrap(),
		SessionRotationConfig {
			max_validators: MAX_VALIDATORS,
			handler_weight_per_validator: Weight::from_parts(1, 0),
		},
	)
}

pub fn referenda() -> Referenda {
	Referenda::new(
		pallet_referendum_tally::TableWeights::from_table(&weight_table()).unwrap(),
		ReferendumConfig {
			launch_period: LAUNCH_PERIOD,
			voting_period: 2,
			enactment_period: 2,
			minimum_deposit: 1,
			max_proposals: 10,
			max_referenda: 4,
		},
	)
}

/// Chain state with `validators` validators, each with a session key.
pub fn genesis(validators: u64) -> InMemoryStorage {
	init_logger();
	let mut state = InMemoryStorage::new();
	let keys = (1..=validators).map(|v| (v, v)).collect();
	GenesisConfig::<Runtime> { keys }.build(&mut state);
	state
}

pub fn item(ref_time: u64, proof_size: u64, class: DispatchClass) -> DispatchInfo {
	DispatchInfo { weight: Weight::from_parts(ref_time, proof_size), class }
}

pub fn boxed(hook: impl OnInitialize + 'static) -> Box<dyn OnInitialize> {
	Box::new(hook)
}

pub const NOTHING: [DispatchInfo; 0] = [];

pub const FIXED_KEY: StorageValue<BlockNumber> = StorageValue::new(b":fixed:");

/// A hook that always reports the same weight and records the block it ran in.
pub struct Fixed(pub Weight);

impl OnInitialize for Fixed {
	fn name(&self) -> &'static str {
		"Fixed"
	}

	fn on_initialize(&self, now: BlockNumber, storage: &mut dyn Storage) -> Weight {
		FIXED_KEY.put(storage, &now);
		self.0
	}
}
