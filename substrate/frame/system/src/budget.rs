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

//! Block-scoped weight accounting.

use crate::{limits::BlockLimits, DispatchClass, PerDispatchClass, LOG_TARGET};
use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_hook_weights::Weight;

/// A reservation did not fit into the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{class:?} reservation of {requested:?} exceeds the remaining {remaining:?}")]
pub struct BudgetExceeded {
	pub class: DispatchClass,
	pub requested: Weight,
	pub remaining: Weight,
}

/// What a [`Charge`] was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeSource {
	/// The fixed cost of having a block at all.
	BaseBlock,
	/// An initialization hook, by name.
	Hook(&'static str),
	/// The n-th inherent of the block.
	Inherent(u32),
	/// The n-th extrinsic of the block.
	Extrinsic(u32),
}

/// One successful reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
	pub source: ChargeSource,
	pub class: DispatchClass,
	pub weight: Weight,
}

/// Encodable view of a [`BlockBudget`], handed out with the block outcome for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, MaxEncodedLen, TypeInfo)]
pub struct BudgetSnapshot {
	pub consumed: PerDispatchClass<Weight>,
	pub total: Weight,
	pub max_block: Weight,
}

/// Weight consumed so far in the block currently being built or imported.
///
/// A budget lives for exactly one block. It starts at zero and consumption only ever grows.
/// Every reservation is either committed in full or not at all.
#[derive(Debug, Clone)]
pub struct BlockBudget {
	max_block: Weight,
	class_caps: PerDispatchClass<Option<Weight>>,
	consumed: PerDispatchClass<Weight>,
	total: Weight,
	charges: Vec<Charge>,
}

impl BlockBudget {
	/// A fresh, empty budget for a new block.
	pub fn new(limits: &BlockLimits) -> Self {
		Self {
			max_block: limits.max_block(),
			class_caps: PerDispatchClass::new(|class| limits.get(class).max_total()),
			consumed: Default::default(),
			total: Weight::zero(),
			charges: Vec::new(),
		}
	}

	/// Try to add `amount` to the consumption of `class`.
	///
	/// Fails if the block's total would no longer fit into `max_block`, or if the class would
	/// exceed its own cap. On failure nothing is changed.
	pub fn reserve(
		&mut self,
		class: DispatchClass,
		amount: Weight,
		source: ChargeSource,
	) -> Result<(), BudgetExceeded> {
		let remaining = self.remaining(class);
		if !amount.all_lte(remaining) {
			log::trace!(
				target: LOG_TARGET,
				"refusing {:?} reservation of {:?} for {:?}: only {:?} left",
				class,
				amount,
				source,
				remaining,
			);
			return Err(BudgetExceeded { class, requested: amount, remaining })
		}

		self.consumed.accrue(amount, class);
		self.total.saturating_accrue(amount);
		self.charges.push(Charge { source, class, weight: amount });
		debug_assert!(self.total.all_lte(self.max_block), "checked above; qed");
		Ok(())
	}

	/// How much `class` may still reserve, looking both at the class cap and at the whole
	/// block.
	pub fn remaining(&self, class: DispatchClass) -> Weight {
		let block_left = self.max_block.saturating_sub(self.total);
		match self.class_caps.get(class) {
			Some(cap) => block_left.min(cap.saturating_sub(*self.consumed.get(class))),
			None => block_left,
		}
	}

	/// Weight consumed by `class` so far.
	pub fn consumed(&self, class: DispatchClass) -> Weight {
		*self.consumed.get(class)
	}

	/// Weight consumed by all classes so far.
	pub fn total_consumed(&self) -> Weight {
		self.total
	}

	pub fn max_block(&self) -> Weight {
		self.max_block
	}

	/// Every successful reservation, in order.
	pub fn charges(&self) -> &[Charge] {
		&self.charges
	}

	pub fn snapshot(&self) -> BudgetSnapshot {
		BudgetSnapshot {
			consumed: self.consumed.clone(),
			total: self.total,
			max_block: self.max_block,
		}
	}
}
