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

//! # Executive Module
//!
//! The Executive module acts as the orchestration layer for the block weight pipeline. It
//! dispatches incoming work to the stages of a block in a fixed order and produces the block's
//! verdict.
//!
//! ## Overview
//!
//! A block goes through the following stages, each of which closes the one before it:
//!
//! `Initializing → HooksExecuting → AdmittingInherents → AdmittingExtrinsics → Finalizing`
//!
//! and ends either `Valid` or `Invalid`. The stages are encoded in the type of the
//! [`BlockBuilder`], so that, for example, no extrinsic can be admitted before every
//! initialization hook has reported its weight.
//!
//! - During initialization the configured `base_block` weight is charged as `Mandatory`.
//! - The [`HookRunner`] runs every registered [`OnInitialize`] hook once, in registration
//!   order, and charges the weight each hook *reports* as `Mandatory`.
//! - [`AdmissionControl`] decides for every inherent and extrinsic whether it fits into what is
//!   left of the budget.
//! - On finalization the whole block is re-validated from the charge ledger.
//!
//! Any failure of `Mandatory` work makes the block invalid and every storage change it made is
//! dropped. Operational and normal items that do not fit are merely deferred.
//!
//! ## Usage
//!
//! ```ignore
//! let executive = Executive::new(limits, vec![Box::new(session), Box::new(referenda)])?;
//! let outcome = executive.execute_block(&mut state, 42, &inherents, &pool);
//! assert!(outcome.is_valid());
//! ```

mod admission;
mod block;
mod error;
mod runner;

#[cfg(test)]
mod tests;

pub use admission::{validate_block, AdmissionControl, Decision, DeferReason};
pub use block::{states, BlockBuilder, BlockOutcome, Verdict};
pub use error::InvalidBlock;
pub use runner::HookRunner;

use frame_block_system::{
	BlockLimits, BlockNumber, ConfigurationError, GetDispatchInfo, InMemoryStorage, OnInitialize,
};

pub(crate) const LOG_TARGET: &str = "runtime::executive";

/// Ties the block limits and the registered hooks together.
pub struct Executive {
	limits: BlockLimits,
	hooks: HookRunner,
}

impl Executive {
	/// Create an executive, validating the hook set against `limits`.
	pub fn new(
		limits: BlockLimits,
		hooks: Vec<Box<dyn OnInitialize>>,
	) -> Result<Self, ConfigurationError> {
		let hooks = HookRunner::new(hooks, &limits)?;
		Ok(Self { limits, hooks })
	}

	pub fn limits(&self) -> &BlockLimits {
		&self.limits
	}

	pub fn hooks(&self) -> &HookRunner {
		&self.hooks
	}

	/// Start a new block on top of `state`.
	pub fn begin_block<'a>(
		&'a self,
		state: &'a mut InMemoryStorage,
		now: BlockNumber,
	) -> BlockBuilder<'a, states::Initializing> {
		BlockBuilder::new(&self.limits, state, now)
	}

	/// Run a whole block: hooks, then `inherents` in order, then as much of `pool` as fits.
	///
	/// `state` is only changed if the resulting block is valid.
	pub fn execute_block<I: GetDispatchInfo>(
		&self,
		state: &mut InMemoryStorage,
		now: BlockNumber,
		inherents: &[I],
		pool: &[I],
	) -> BlockOutcome {
		match self.try_execute_block(state, now, inherents, pool) {
			Ok(outcome) | Err(outcome) => outcome,
		}
	}

	fn try_execute_block<I: GetDispatchInfo>(
		&self,
		state: &mut InMemoryStorage,
		now: BlockNumber,
		inherents: &[I],
		pool: &[I],
	) -> Result<BlockOutcome, BlockOutcome> {
		let block = self.begin_block(state, now).initialize()?;
		let block = block.execute_hooks(&self.hooks)?;
		let mut block = block.apply_inherents(inherents)?;
		block.fill_from_pool(pool);
		Ok(block.close_extrinsics().finalize())
	}
}
