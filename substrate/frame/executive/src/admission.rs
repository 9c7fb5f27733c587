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

//! Admission of inherents and extrinsics, and the final re-validation of a block.

use crate::{InvalidBlock, LOG_TARGET};
use frame_block_system::{
	BlockBudget, BlockLimits, BudgetExceeded, ChargeSource, DispatchClass, DispatchInfo,
	PerDispatchClass,
};
use sp_hook_weights::Weight;

/// Why an item was left out of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
	/// The item alone is heavier than a single item of its class may be.
	ExceedsMaxExtrinsic { charge: Weight, max: Weight },
	/// Not enough budget is left in this block.
	Exhausted(BudgetExceeded),
}

/// What happened to an item offered to [`AdmissionControl::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
	/// The item's weight has been charged and it is part of the block.
	Included,
	/// The item is left out of this block and may be retried in a later one. Nothing was
	/// charged.
	Deferred(DeferReason),
	/// A `Mandatory` item does not fit. The block is invalid.
	Rejected(BudgetExceeded),
}

impl Decision {
	pub fn is_included(&self) -> bool {
		matches!(self, Decision::Included)
	}
}

/// Gates inclusion of items into the current block.
pub struct AdmissionControl<'a> {
	limits: &'a BlockLimits,
}

impl<'a> AdmissionControl<'a> {
	pub fn new(limits: &'a BlockLimits) -> Self {
		Self { limits }
	}

	/// The weight charged for including an item: its own weight plus the base weight of its
	/// class.
	pub fn charge_of(&self, info: &DispatchInfo) -> Weight {
		info.weight.saturating_add(self.limits.get(info.class).base_extrinsic())
	}

	/// Try to include an item described by `info`.
	///
	/// Nothing is charged unless the decision is [`Decision::Included`].
	pub fn admit(
		&self,
		budget: &mut BlockBudget,
		info: &DispatchInfo,
		source: ChargeSource,
	) -> Decision {
		let class = info.class;
		let charge = self.charge_of(info);

		if class != DispatchClass::Mandatory {
			if let Some(max) = self.limits.get(class).max_extrinsic() {
				if !charge.all_lte(max) {
					log::warn!(
						target: LOG_TARGET,
						"{:?} deferred: {:?} exceeds the {:?} single item limit {:?}",
						source,
						charge,
						class,
						max,
					);
					return Decision::Deferred(DeferReason::ExceedsMaxExtrinsic { charge, max })
				}
			}
		}

		match budget.reserve(class, charge, source) {
			Ok(()) => {
				log::trace!(
					target: LOG_TARGET,
					"{:?} included as {:?}, charged {:?}",
					source,
					class,
					charge,
				);
				Decision::Included
			},
			Err(e) if class.is_fatal_on_exhaustion() => {
				log::error!(target: LOG_TARGET, "mandatory {:?} does not fit: {}", source, e);
				Decision::Rejected(e)
			},
			Err(e) => {
				log::debug!(target: LOG_TARGET, "{:?} deferred: {}", source, e);
				Decision::Deferred(DeferReason::Exhausted(e))
			},
		}
	}

	/// Check that what the hooks left for `Mandatory` work still covers the inherent reserve,
	/// if one is configured.
	pub fn check_inherent_reserve(&self, budget: &BlockBudget) -> Result<(), InvalidBlock> {
		let Some(reserve) = self.limits.inherent_reserve() else { return Ok(()) };
		let remaining = budget.remaining(DispatchClass::Mandatory);
		if reserve.all_lte(remaining) {
			Ok(())
		} else {
			log::error!(
				target: LOG_TARGET,
				"hooks left {:?} for inherents, below the reserve {:?}",
				remaining,
				reserve,
			);
			Err(InvalidBlock::InherentReserveViolated { reserve, remaining })
		}
	}

	/// See [`validate_block`].
	pub fn validate_block(&self, budget: &BlockBudget) -> Result<(), InvalidBlock> {
		validate_block(budget, self.limits)
	}
}

/// Re-derive the consumption of a finished block from its charge ledger and check it against
/// `limits` along both dimensions.
///
/// This does not trust the running totals of `budget`; it fails if they disagree with the
/// ledger, if the block is heavier than `max_block`, or if any class went over its cap.
pub fn validate_block(budget: &BlockBudget, limits: &BlockLimits) -> Result<(), InvalidBlock> {
	let mut derived = PerDispatchClass::<Weight>::default();
	for charge in budget.charges() {
		derived.accrue(charge.weight, charge.class);
	}

	for class in DispatchClass::all() {
		let recorded = budget.consumed(*class);
		let from_ledger = *derived.get(*class);
		if recorded != from_ledger {
			return Err(InvalidBlock::LedgerMismatch {
				class: Some(*class),
				recorded,
				derived: from_ledger,
			})
		}
	}

	let total = derived.total();
	if total != budget.total_consumed() {
		return Err(InvalidBlock::LedgerMismatch {
			class: None,
			recorded: budget.total_consumed(),
			derived: total,
		})
	}

	let max_block = limits.max_block();
	if !total.all_lte(max_block) {
		return Err(InvalidBlock::ExceedsMaxBlock { total, max_block })
	}

	for class in DispatchClass::all() {
		if let Some(limit) = limits.get(*class).max_total() {
			let consumed = *derived.get(*class);
			if !consumed.all_lte(limit) {
				return Err(InvalidBlock::ExceedsClassLimit { class: *class, consumed, limit })
			}
		}
	}

	Ok(())
}
