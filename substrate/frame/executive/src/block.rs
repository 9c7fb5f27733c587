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

//! The stages of a single block.
//!
//! A [`BlockBuilder`] is parametrized by its current stage, one of the types in [`states`].
//! Every transition consumes the builder and returns it in the next stage, so stages cannot be
//! skipped or revisited. Transitions that can invalidate the block return the final
//! [`BlockOutcome`] as their error.

use crate::{AdmissionControl, Decision, HookRunner, InvalidBlock, LOG_TARGET};
use core::marker::PhantomData;
use frame_block_system::{
	BlockBudget, BlockLimits, BlockNumber, BudgetSnapshot, ChargeSource, DispatchClass,
	GetDispatchInfo, InMemoryStorage, OverlayedStorage, Storage,
};

pub mod states {
	//! Stages of a [`BlockBuilder`](super::BlockBuilder).

	/// Nothing has been charged yet.
	pub enum Initializing {}
	/// The base block weight is charged; hooks are next.
	pub enum HooksExecuting {}
	/// All hooks have reported.
	pub enum AdmittingInherents {}
	/// All inherents are in.
	pub enum AdmittingExtrinsics {}
	/// No more items are accepted.
	pub enum Finalizing {}
}

/// Final verdict on a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
	Valid,
	Invalid(InvalidBlock),
}

/// The externally observable result of processing a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
	pub number: BlockNumber,
	pub verdict: Verdict,
	/// Budget at the point the block was finished or rejected.
	pub snapshot: BudgetSnapshot,
	/// Pool positions of the extrinsics left out of the block.
	pub deferred: Vec<usize>,
}

impl BlockOutcome {
	pub fn is_valid(&self) -> bool {
		matches!(self.verdict, Verdict::Valid)
	}

	pub fn invalid_reason(&self) -> Option<&InvalidBlock> {
		match &self.verdict {
			Verdict::Valid => None,
			Verdict::Invalid(reason) => Some(reason),
		}
	}
}

/// A block under construction (or import) in stage `State`.
pub struct BlockBuilder<'a, State> {
	_state: PhantomData<State>,
	now: BlockNumber,
	limits: &'a BlockLimits,
	budget: BlockBudget,
	overlay: OverlayedStorage<'a>,
	inherents: u32,
	extrinsics: u32,
	deferred: Vec<usize>,
	fatal: Option<InvalidBlock>,
}

impl<'a, State> BlockBuilder<'a, State> {
	fn into_stage<Next>(self) -> BlockBuilder<'a, Next> {
		BlockBuilder {
			_state: PhantomData,
			now: self.now,
			limits: self.limits,
			budget: self.budget,
			overlay: self.overlay,
			inherents: self.inherents,
			extrinsics: self.extrinsics,
			deferred: self.deferred,
			fatal: self.fatal,
		}
	}

	/// Throw away every change of this block and report it as invalid.
	fn reject(self, reason: InvalidBlock) -> BlockOutcome {
		log::error!(target: LOG_TARGET, "block {} is invalid: {}", self.now, reason);
		self.overlay.discard();
		BlockOutcome {
			number: self.now,
			verdict: Verdict::Invalid(reason),
			snapshot: self.budget.snapshot(),
			deferred: self.deferred,
		}
	}

	pub fn number(&self) -> BlockNumber {
		self.now
	}

	pub fn budget(&self) -> &BlockBudget {
		&self.budget
	}

	/// State as seen by this block, including its own uncommitted changes.
	pub fn storage(&self) -> &dyn Storage {
		&self.overlay
	}
}

impl<'a> BlockBuilder<'a, states::Initializing> {
	/// A new block on top of `state`, with an empty budget.
	pub fn new(limits: &'a BlockLimits, state: &'a mut InMemoryStorage, now: BlockNumber) -> Self {
		Self {
			_state: PhantomData,
			now,
			limits,
			budget: BlockBudget::new(limits),
			overlay: OverlayedStorage::new(state),
			inherents: 0,
			extrinsics: 0,
			deferred: Vec::new(),
			fatal: None,
		}
	}

	/// Charge the base block weight.
	pub fn initialize(mut self) -> Result<BlockBuilder<'a, states::HooksExecuting>, BlockOutcome> {
		log::debug!(target: LOG_TARGET, "initializing block {}", self.now);
		let base_block = self.limits.base_block();
		if let Err(error) =
			self.budget.reserve(DispatchClass::Mandatory, base_block, ChargeSource::BaseBlock)
		{
			return Err(self.reject(InvalidBlock::MandatoryExhausted {
				charge: ChargeSource::BaseBlock,
				error,
			}))
		}
		Ok(self.into_stage())
	}
}

impl<'a> BlockBuilder<'a, states::HooksExecuting> {
	/// Run all initialization hooks and check that they left the inherent reserve.
	pub fn execute_hooks(
		mut self,
		hooks: &HookRunner,
	) -> Result<BlockBuilder<'a, states::AdmittingInherents>, BlockOutcome> {
		let result = hooks.run(self.now, &mut self.overlay, &mut self.budget).and_then(|weight| {
			log::debug!(
				target: LOG_TARGET,
				"{} hooks of block {} reported {:?}",
				hooks.len(),
				self.now,
				weight,
			);
			AdmissionControl::new(self.limits).check_inherent_reserve(&self.budget)
		});
		match result {
			Ok(()) => Ok(self.into_stage()),
			Err(reason) => Err(self.reject(reason)),
		}
	}
}

impl<'a> BlockBuilder<'a, states::AdmittingInherents> {
	/// Admit all inherents, in order.
	///
	/// A mandatory inherent that does not fit invalidates the block. Non-mandatory inherents
	/// that do not fit are skipped.
	pub fn apply_inherents<I: GetDispatchInfo>(
		mut self,
		inherents: &[I],
	) -> Result<BlockBuilder<'a, states::AdmittingExtrinsics>, BlockOutcome> {
		let admission = AdmissionControl::new(self.limits);
		for inherent in inherents {
			let source = ChargeSource::Inherent(self.inherents);
			self.inherents += 1;
			match admission.admit(&mut self.budget, &inherent.get_dispatch_info(), source) {
				Decision::Included => {},
				Decision::Deferred(reason) => {
					log::warn!(target: LOG_TARGET, "skipping {:?}: {:?}", source, reason);
				},
				Decision::Rejected(error) => {
					let reason = InvalidBlock::MandatoryExhausted { charge: source, error };
					return Err(self.reject(reason))
				},
			}
		}
		log::debug!(
			target: LOG_TARGET,
			"block {}: {} inherents processed, {:?} left for extrinsics",
			self.now,
			self.inherents,
			self.budget.remaining(DispatchClass::Normal),
		);
		Ok(self.into_stage())
	}
}

impl<'a> BlockBuilder<'a, states::AdmittingExtrinsics> {
	/// Offer a single extrinsic.
	///
	/// Once a mandatory extrinsic has been rejected the block is bound to be invalid and every
	/// further extrinsic is rejected too.
	pub fn apply_extrinsic<I: GetDispatchInfo>(&mut self, extrinsic: &I) -> Decision {
		let info = extrinsic.get_dispatch_info();
		let source = ChargeSource::Extrinsic(self.extrinsics);
		if let Some(InvalidBlock::MandatoryExhausted { error, .. }) = &self.fatal {
			return Decision::Rejected(*error)
		}
		self.extrinsics += 1;

		let decision = AdmissionControl::new(self.limits).admit(&mut self.budget, &info, source);
		if let Decision::Rejected(error) = decision {
			self.fatal = Some(InvalidBlock::MandatoryExhausted { charge: source, error });
		}
		decision
	}

	/// Admit as much of `pool` as fits: operational items first, then normal ones, each class
	/// in pool order.
	///
	/// Items that do not fit are skipped, and smaller items after them are still tried. Returns
	/// the pool positions of the skipped items, in the order they were tried.
	pub fn fill_from_pool<I: GetDispatchInfo>(&mut self, pool: &[I]) -> Vec<usize> {
		let mut order: Vec<usize> = (0..pool.len()).collect();
		order.sort_by_key(|i| pool[*i].get_dispatch_info().class.priority());

		let mut deferred = Vec::new();
		for index in order {
			match self.apply_extrinsic(&pool[index]) {
				Decision::Included => {},
				Decision::Deferred(_) => deferred.push(index),
				Decision::Rejected(_) => break,
			}
		}
		self.deferred.extend_from_slice(&deferred);
		deferred
	}

	/// Stop accepting extrinsics.
	pub fn close_extrinsics(self) -> BlockBuilder<'a, states::Finalizing> {
		log::debug!(
			target: LOG_TARGET,
			"block {}: {} extrinsics offered, {} deferred",
			self.now,
			self.extrinsics,
			self.deferred.len(),
		);
		self.into_stage()
	}
}

impl<'a> BlockBuilder<'a, states::Finalizing> {
	/// Re-validate the whole block and commit its changes if it is valid.
	pub fn finalize(mut self) -> BlockOutcome {
		let verdict = match self.fatal.take() {
			Some(reason) => Err(reason),
			None => AdmissionControl::new(self.limits).validate_block(&self.budget),
		};
		if let Err(reason) = verdict {
			return self.reject(reason)
		}

		log::debug!(
			target: LOG_TARGET,
			"block {} is valid, consumed {:?} of {:?}",
			self.now,
			self.budget.total_consumed(),
			self.budget.max_block(),
		);
		self.overlay.commit();
		BlockOutcome {
			number: self.now,
			verdict: Verdict::Valid,
			snapshot: self.budget.snapshot(),
			deferred: self.deferred,
		}
	}
}
