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

//! Admission ordering and the line between fatal and recoverable exhaustion.

mod common;

use common::*;
use frame_block_executive::{Decision, Executive};
use frame_block_system::{
	BlockLimits, ChargeSource, DispatchClass, DispatchInfo, InMemoryStorage, Weight,
};
use proptest::{collection::vec, prelude::*};
use sp_arithmetic::Perbill;

fn max_block() -> Weight {
	Weight::from_parts(1_000, 1_000)
}

fn limits() -> BlockLimits {
	BlockLimits::with_sensible_defaults(max_block(), Perbill::from_percent(75)).unwrap()
}

fn class_of(operational: bool) -> DispatchClass {
	if operational {
		DispatchClass::Operational
	} else {
		DispatchClass::Normal
	}
}

proptest! {
	#[test]
	fn operational_is_tried_before_normal(
		inherents in vec((0u64..100, 0u64..100), 0..5),
		pool in vec((any::<bool>(), 0u64..300, 0u64..300), 0..30),
	) {
		init_logger();
		let executive = Executive::new(limits(), vec![]).unwrap();
		let mut state = InMemoryStorage::new();
		let inherents: Vec<_> =
			inherents.into_iter().map(|(t, p)| item(t, p, DispatchClass::Mandatory)).collect();
		let pool: Vec<_> =
			pool.into_iter().map(|(op, t, p)| item(t, p, class_of(op))).collect();

		let block = executive.begin_block(&mut state, 1).initialize().unwrap();
		let block = block.execute_hooks(executive.hooks()).unwrap();
		let mut block = block.apply_inherents(&inherents).unwrap();
		let deferred = block.fill_from_pool(&pool);

		let charges = block.budget().charges();
		let included_inherents =
			charges.iter().filter(|c| matches!(c.source, ChargeSource::Inherent(_))).count();
		prop_assert_eq!(included_inherents, inherents.len());

		let classes: Vec<_> = charges
			.iter()
			.filter(|c| matches!(c.source, ChargeSource::Extrinsic(_)))
			.map(|c| c.class)
			.collect();
		prop_assert!(classes.windows(2).all(|w| w[0].priority() <= w[1].priority()));
		prop_assert_eq!(classes.len() + deferred.len(), pool.len());

		// Whatever the pool used, mandatory work may still take the rest of the block.
		let headroom = block.budget().remaining(DispatchClass::Mandatory);
		let filler = DispatchInfo { weight: headroom, class: DispatchClass::Mandatory };
		prop_assert_eq!(block.apply_extrinsic(&filler), Decision::Included);
		prop_assert!(block.close_extrinsics().finalize().is_valid());
	}

	#[test]
	fn mandatory_overflow_is_fatal(t in 0u64..2_000, p in 0u64..2_000) {
		let reported = Weight::from_parts(t, p);
		let executive = Executive::new(limits(), vec![boxed(Fixed(reported))]).unwrap();
		let mut state = InMemoryStorage::new();

		let outcome = executive.execute_block(&mut state, 1, &NOTHING, &NOTHING);

		let fits = reported.all_lte(max_block());
		prop_assert_eq!(outcome.is_valid(), fits);
		prop_assert_eq!(FIXED_KEY.get(&state), fits.then_some(1));
	}

	#[test]
	fn normal_overflow_is_recoverable(
		hook in (0u64..=1_000, 0u64..=1_000),
		extra in (0u64..2_000, 0u64..2_000),
	) {
		let hook = Weight::from_parts(hook.0, hook.1);
		let extra = Weight::from_parts(extra.0, extra.1);
		let executive = Executive::new(limits(), vec![boxed(Fixed(hook))]).unwrap();
		let mut state = InMemoryStorage::new();

		let outcome = executive.execute_block(
			&mut state,
			1,
			&NOTHING,
			&[DispatchInfo { weight: extra, class: DispatchClass::Normal }],
		);

		let room = max_block().saturating_sub(hook).min(Weight::from_parts(750, 750));
		prop_assert!(outcome.is_valid());
		prop_assert_eq!(outcome.deferred.is_empty(), extra.all_lte(room));
	}
}
