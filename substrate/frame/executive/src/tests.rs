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

//! Test the `frame-block-executive` crate.

use super::*;

use assert_matches::assert_matches;
use frame_block_system::{
	ChargeSource, DispatchClass, DispatchInfo, Storage, StorageValue, Weight,
};
use sp_arithmetic::Perbill;
use std::cell::RefCell;

const TEST_KEY: StorageValue<u32> = StorageValue::new(b":test:key:");

thread_local! {
	static CALLS: RefCell<Vec<(&'static str, BlockNumber)>> = RefCell::new(Vec::new());
}

fn calls() -> Vec<(&'static str, BlockNumber)> {
	CALLS.with(|c| c.borrow().clone())
}

/// Writes the block number under [`TEST_KEY`] and reports a fixed weight.
struct Custom {
	name: &'static str,
	weight: Weight,
	idle: Weight,
}

impl Custom {
	fn boxed(name: &'static str, ref_time: u64, proof_size: u64) -> Box<dyn OnInitialize> {
		Box::new(Custom {
			name,
			weight: Weight::from_parts(ref_time, proof_size),
			idle: Weight::zero(),
		})
	}
}

impl OnInitialize for Custom {
	fn name(&self) -> &'static str {
		self.name
	}

	fn on_initialize(&self, now: BlockNumber, storage: &mut dyn Storage) -> Weight {
		CALLS.with(|c| c.borrow_mut().push((self.name, now)));
		TEST_KEY.put(storage, &now);
		self.weight
	}

	fn idle_weight(&self) -> Weight {
		self.idle
	}
}

fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn limits() -> BlockLimits {
	BlockLimits::builder()
		.max_block(Weight::from_parts(1_000, 1_000))
		.base_block(Weight::from_parts(20, 10))
		.for_class(DispatchClass::Normal, |c| c.ratio = Some(Perbill::from_percent(75)))
		.for_class(DispatchClass::Operational, |c| c.ratio = Some(Perbill::from_percent(25)))
		.build()
		.unwrap()
}

fn item(ref_time: u64, proof_size: u64, class: DispatchClass) -> DispatchInfo {
	DispatchInfo { weight: Weight::from_parts(ref_time, proof_size), class }
}

#[test]
fn block_import_works() {
	init_logger();
	let executive =
		Executive::new(limits(), vec![Custom::boxed("a", 100, 50), Custom::boxed("b", 30, 30)])
			.unwrap();
	let mut state = InMemoryStorage::new();

	let outcome = executive.execute_block(
		&mut state,
		1,
		&[item(40, 40, DispatchClass::Mandatory)],
		&[item(100, 100, DispatchClass::Normal)],
	);

	assert_eq!(outcome.verdict, Verdict::Valid);
	assert_eq!(outcome.snapshot.total, Weight::from_parts(290, 230));
	assert_eq!(
		*outcome.snapshot.consumed.get(DispatchClass::Mandatory),
		Weight::from_parts(190, 130)
	);
	assert!(outcome.deferred.is_empty());
	assert_eq!(TEST_KEY.get(&state), Some(1));
}

#[test]
fn base_block_is_charged_before_hooks_in_order() {
	init_logger();
	let executive =
		Executive::new(limits(), vec![Custom::boxed("first", 1, 1), Custom::boxed("second", 2, 2)])
			.unwrap();
	let mut state = InMemoryStorage::new();

	let block = executive.begin_block(&mut state, 7).initialize().unwrap();
	let block = block.execute_hooks(executive.hooks()).unwrap();

	let sources: Vec<_> = block.budget().charges().iter().map(|c| c.source).collect();
	assert_eq!(
		sources,
		vec![ChargeSource::BaseBlock, ChargeSource::Hook("first"), ChargeSource::Hook("second")]
	);
	assert!(block.budget().charges().iter().all(|c| c.class == DispatchClass::Mandatory));
	assert_eq!(calls(), vec![("first", 7), ("second", 7)]);
	// Hooks see their own writes, the backend does not yet.
	assert_eq!(TEST_KEY.get(block.storage()), Some(7));
}

#[test]
fn hook_overflow_invalidates_block_and_discards_changes() {
	init_logger();
	let hooks = vec![Custom::boxed("ok", 10, 10), Custom::boxed("heavy", 1_000, 1)];
	let executive = Executive::new(limits(), hooks).unwrap();
	let mut state = InMemoryStorage::new();
	TEST_KEY.put(&mut state, &0);

	let outcome = executive.execute_block::<DispatchInfo>(&mut state, 3, &[], &[]);

	assert_matches!(
		outcome.invalid_reason(),
		Some(InvalidBlock::MandatoryExhausted { charge: ChargeSource::Hook("heavy"), .. })
	);
	// Both hooks ran, but nothing of the block survives.
	assert_eq!(calls(), vec![("ok", 3), ("heavy", 3)]);
	assert_eq!(TEST_KEY.get(&state), Some(0));
	// The snapshot shows what was charged before the failure.
	assert_eq!(outcome.snapshot.total, Weight::from_parts(30, 20));
}

#[test]
fn idle_cost_is_checked_on_registration() {
	let heavy_idle: Box<dyn OnInitialize> = Box::new(Custom {
		name: "idle",
		weight: Weight::zero(),
		idle: Weight::from_parts(40, 40),
	});
	let light_idle: Box<dyn OnInitialize> = Box::new(Custom {
		name: "idle2",
		weight: Weight::zero(),
		idle: Weight::from_parts(11, 0),
	});
	assert_matches!(
		Executive::new(limits(), vec![heavy_idle, light_idle]).err(),
		Some(ConfigurationError::IdleCostTooHigh { idle, .. }) if idle == Weight::from_parts(51, 40)
	);
}

#[test]
fn inherent_reserve_violation_is_fatal() {
	init_logger();
	let limits = BlockLimits::builder()
		.max_block(Weight::from_parts(1_000, 1_000))
		.inherent_reserve(Weight::from_parts(200, 200))
		.build()
		.unwrap();
	let executive = Executive::new(limits, vec![Custom::boxed("greedy", 850, 10)]).unwrap();
	let mut state = InMemoryStorage::new();

	let outcome = executive.execute_block::<DispatchInfo>(&mut state, 1, &[], &[]);
	assert_matches!(
		outcome.invalid_reason(),
		Some(InvalidBlock::InherentReserveViolated { remaining, .. })
			if *remaining == Weight::from_parts(150, 990)
	);
	assert!(state.is_empty());
}

#[test]
fn inherents_may_use_the_reserve() {
	let limits = BlockLimits::builder()
		.max_block(Weight::from_parts(1_000, 1_000))
		.inherent_reserve(Weight::from_parts(200, 200))
		.build()
		.unwrap();
	let executive = Executive::new(limits, vec![Custom::boxed("hook", 800, 10)]).unwrap();
	let mut state = InMemoryStorage::new();

	let outcome = executive.execute_block(
		&mut state,
		1,
		&[item(200, 200, DispatchClass::Mandatory)],
		&[],
	);
	assert!(outcome.is_valid());
	assert_eq!(outcome.snapshot.total, Weight::from_parts(1_000, 210));
}

#[test]
fn mandatory_inherent_overflow_is_fatal() {
	init_logger();
	let executive = Executive::new(limits(), vec![Custom::boxed("hook", 500, 500)]).unwrap();
	let mut state = InMemoryStorage::new();

	let outcome = executive.execute_block(
		&mut state,
		1,
		&[item(100, 100, DispatchClass::Mandatory), item(400, 10, DispatchClass::Mandatory)],
		&[item(1, 1, DispatchClass::Normal)],
	);
	assert_matches!(
		outcome.invalid_reason(),
		Some(InvalidBlock::MandatoryExhausted { charge: ChargeSource::Inherent(1), .. })
	);
	assert!(state.is_empty());
}

#[test]
fn pool_is_filled_operational_first() {
	init_logger();
	let executive = Executive::new(limits(), vec![]).unwrap();
	let mut state = InMemoryStorage::new();

	let mut block = executive
		.begin_block(&mut state, 1)
		.initialize()
		.unwrap()
		.execute_hooks(executive.hooks())
		.unwrap()
		.apply_inherents::<DispatchInfo>(&[])
		.unwrap();

	let pool = [
		item(700, 10, DispatchClass::Normal),
		item(200, 10, DispatchClass::Operational),
		item(100, 10, DispatchClass::Normal),
		item(60, 10, DispatchClass::Operational),
		item(40, 10, DispatchClass::Normal),
	];
	let deferred = block.fill_from_pool(&pool);

	// Operational: 200 in, 60 over its 250 cap. Normal: 700 in, 100 over its 750 cap, 40 still
	// fits.
	assert_eq!(deferred, vec![3, 2]);
	let sources: Vec<_> = block.budget().charges().iter().map(|c| c.source).collect();
	assert_eq!(
		sources,
		vec![
			ChargeSource::BaseBlock,
			ChargeSource::Extrinsic(0),
			ChargeSource::Extrinsic(2),
			ChargeSource::Extrinsic(4),
		]
	);

	let outcome = block.close_extrinsics().finalize();
	assert!(outcome.is_valid());
	assert_eq!(outcome.deferred, vec![3, 2]);
	assert_eq!(outcome.snapshot.total, Weight::from_parts(960, 40));
}

#[test]
fn deferred_extrinsic_leaves_budget_untouched() {
	let executive = Executive::new(limits(), vec![]).unwrap();
	let mut state = InMemoryStorage::new();
	let mut block = executive
		.begin_block(&mut state, 1)
		.initialize()
		.unwrap()
		.execute_hooks(executive.hooks())
		.unwrap()
		.apply_inherents::<DispatchInfo>(&[])
		.unwrap();

	assert!(block.apply_extrinsic(&item(745, 0, DispatchClass::Normal)).is_included());
	let before = block.budget().snapshot();
	assert_matches!(
		block.apply_extrinsic(&item(10, 1, DispatchClass::Normal)),
		Decision::Deferred(DeferReason::Exhausted(_))
	);
	assert_eq!(block.budget().snapshot(), before);
	assert!(block.close_extrinsics().finalize().is_valid());
}

#[test]
fn rejected_mandatory_extrinsic_poisons_the_block() {
	init_logger();
	let executive = Executive::new(limits(), vec![Custom::boxed("hook", 900, 0)]).unwrap();
	let mut state = InMemoryStorage::new();
	let mut block = executive
		.begin_block(&mut state, 1)
		.initialize()
		.unwrap()
		.execute_hooks(executive.hooks())
		.unwrap()
		.apply_inherents::<DispatchInfo>(&[])
		.unwrap();

	assert_matches!(
		block.apply_extrinsic(&item(100, 0, DispatchClass::Mandatory)),
		Decision::Rejected(_)
	);
	assert_matches!(
		block.apply_extrinsic(&item(1, 0, DispatchClass::Normal)),
		Decision::Rejected(_)
	);

	let outcome = block.close_extrinsics().finalize();
	assert_matches!(
		outcome.invalid_reason(),
		Some(InvalidBlock::MandatoryExhausted { charge: ChargeSource::Extrinsic(0), .. })
	);
	assert!(state.is_empty());
}

#[test]
fn budget_does_not_leak_into_next_block() {
	let executive = Executive::new(limits(), vec![Custom::boxed("hook", 100, 100)]).unwrap();
	let mut state = InMemoryStorage::new();

	let first =
		executive.execute_block(&mut state, 1, &[], &[item(500, 500, DispatchClass::Normal)]);
	let second = executive.execute_block::<DispatchInfo>(&mut state, 2, &[], &[]);

	assert!(first.is_valid() && second.is_valid());
	assert_eq!(first.snapshot.total, Weight::from_parts(620, 610));
	assert_eq!(second.snapshot.total, Weight::from_parts(120, 110));
	assert_eq!(TEST_KEY.get(&state), Some(2));
}
