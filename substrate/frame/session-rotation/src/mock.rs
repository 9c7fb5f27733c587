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

//! Mock helpers for Session.

use super::*;
use frame_block_system::InMemoryStorage;
use sp_hook_weights::{CostModel, RuntimeDbWeight, WeightTable};
use std::cell::RefCell;

thread_local! {
	pub static VALIDATORS: RefCell<Vec<u64>> = RefCell::new(vec![1, 2, 3]);
	pub static NEXT_VALIDATORS: RefCell<Option<Vec<u64>>> = RefCell::new(None);
	pub static SESSION_CHANGED: RefCell<bool> = RefCell::new(false);
	pub static ENDED: RefCell<Vec<SessionIndex>> = RefCell::new(Vec::new());
	pub static STARTED: RefCell<Vec<SessionIndex>> = RefCell::new(Vec::new());
	pub static BEFORE_SESSION_END_CALLED: RefCell<bool> = RefCell::new(false);
}

pub struct TestSessionHandler;
impl SessionHandler<u64, u64> for TestSessionHandler {
	fn on_genesis_session(_validators: &[(u64, u64)]) {}
	fn on_new_session(changed: bool, validators: &[(u64, u64)], _queued: &[(u64, u64)]) {
		SESSION_CHANGED.with(|l| *l.borrow_mut() = changed);
		VALIDATORS.with(|l| *l.borrow_mut() = validators.iter().map(|(v, _)| *v).collect());
	}
	fn on_before_session_ending() {
		BEFORE_SESSION_END_CALLED.with(|b| *b.borrow_mut() = true);
	}
}

pub struct TestSessionManager;
impl SessionManager<u64> for TestSessionManager {
	fn new_session(_: SessionIndex) -> Option<Vec<u64>> {
		NEXT_VALIDATORS.with(|v| v.borrow_mut().take())
	}
	fn end_session(index: SessionIndex) {
		ENDED.with(|e| e.borrow_mut().push(index));
	}
	fn start_session(index: SessionIndex) {
		STARTED.with(|s| s.borrow_mut().push(index));
	}
}

pub fn set_next_validators(next: Vec<u64>) {
	NEXT_VALIDATORS.with(|v| *v.borrow_mut() = Some(next));
}

pub fn session_changed() -> bool {
	SESSION_CHANGED.with(|l| *l.borrow())
}

pub fn active_validators() -> Vec<u64> {
	VALIDATORS.with(|l| l.borrow().clone())
}

pub struct Test;
impl Config for Test {
	type ValidatorId = u64;
	type Keys = u64;
	type SessionManager = TestSessionManager;
	type SessionHandler = TestSessionHandler;
	type ShouldEndSession = PeriodicSessions;
	type WeightInfo = TableWeights;
}

pub type Session = Pallet<Test>;

pub const PERIOD: BlockNumber = 10;
pub const MAX_VALIDATORS: u32 = 400;

pub fn weight_table() -> WeightTable {
	WeightTable::new(1, RuntimeDbWeight { read: 0, write: 0 })
		.with(weights::SHOULD_END_SESSION, CostModel::constant(Weight::from_parts(10, 5)))
		.with(
			weights::ROTATE_SESSION,
			CostModel::constant(Weight::from_parts(100, 50))
				.with_component("v", Weight::from_parts(2, 1))
				.with_component("n", Weight::from_parts(1, 1))
				.with_component("q", Weight::from_parts(1, 2))
				.with_component("c", Weight::from_parts(3, 0)),
		)
		.with(weights::SET_KEYS, CostModel::constant(Weight::from_parts(20, 10)))
		.with(weights::PURGE_KEYS, CostModel::constant(Weight::from_parts(15, 10)))
}

pub fn session() -> Session {
	Session::new(
		PeriodicSessions { period: PERIOD, offset: 0 },
		TableWeights::from_table(&weight_table()).unwrap(),
		SessionRotationConfig {
			max_validators: MAX_VALIDATORS,
			handler_weight_per_validator: Weight::from_parts(1, 0),
		},
	)
}

/// Genesis with validators 1, 2 and 3, each holding the key equal to its id.
pub fn new_test_ext() -> InMemoryStorage {
	let _ = env_logger::builder().is_test(true).try_init();
	let mut storage = InMemoryStorage::new();
	GenesisConfig::<Test> { keys: vec![(1, 1), (2, 2), (3, 3)] }.build(&mut storage);
	storage
}
