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

use crate::{InvalidBlock, LOG_TARGET};
use frame_block_system::{
	BlockBudget, BlockLimits, BlockNumber, ChargeSource, ConfigurationError, DispatchClass,
	OnInitialize, Storage,
};
use sp_hook_weights::Weight;

/// Owns the ordered list of initialization hooks and runs them once per block.
pub struct HookRunner {
	hooks: Vec<Box<dyn OnInitialize>>,
}

impl HookRunner {
	/// Register `hooks`, to be run in the given order.
	///
	/// Fails if the hooks together would already take up too much of a block in which none of
	/// them has anything to do.
	pub fn new(
		hooks: Vec<Box<dyn OnInitialize>>,
		limits: &BlockLimits,
	) -> Result<Self, ConfigurationError> {
		let runner = Self { hooks };
		let idle = runner.idle_weight();
		limits.check_idle_cost(idle).inspect_err(|_| {
			log::error!(
				target: LOG_TARGET,
				"idle cost {:?} of hooks {:?} is too high for max_block {:?}",
				idle,
				runner.names().collect::<Vec<_>>(),
				limits.max_block(),
			)
		})?;
		Ok(runner)
	}

	/// Names of the registered hooks, in execution order.
	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.hooks.iter().map(|h| h.name())
	}

	pub fn len(&self) -> usize {
		self.hooks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hooks.is_empty()
	}

	/// Summed cost of all hooks on a block where none of them has anything to do.
	pub fn idle_weight(&self) -> Weight {
		self.hooks.iter().map(|h| h.idle_weight()).fold(Weight::zero(), Weight::saturating_add)
	}

	/// Run every hook for block `now` and charge its reported weight as `Mandatory`.
	///
	/// Stops at the first hook whose weight does not fit; the block is invalid then. State
	/// changes already made by hooks are left to the caller to throw away.
	pub fn run(
		&self,
		now: BlockNumber,
		storage: &mut dyn Storage,
		budget: &mut BlockBudget,
	) -> Result<Weight, InvalidBlock> {
		let mut total = Weight::zero();
		for hook in &self.hooks {
			let name = hook.name();
			let weight = hook.on_initialize(now, storage);
			log::trace!(
				target: LOG_TARGET,
				"hook {} reported {:?} at block {}",
				name,
				weight,
				now,
			);

			let charge = ChargeSource::Hook(name);
			budget.reserve(DispatchClass::Mandatory, weight, charge).map_err(|error| {
				log::error!(
					target: LOG_TARGET,
					"hook {} at block {} reported {:?}, which does not fit: {}",
					name,
					now,
					weight,
					error,
				);
				InvalidBlock::MandatoryExhausted { charge, error }
			})?;
			total.saturating_accrue(weight);
		}
		Ok(total)
	}
}
