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

use crate::{BlockNumber, Storage};
use sp_hook_weights::Weight;

/// Logic that runs once at the start of every block, before any inherent or extrinsic.
///
/// The returned weight is what the hook *actually* consumed in this block: the cost of the
/// branch it took, evaluated for the data it touched. It is charged as `Mandatory` weight, and a
/// block whose hooks do not fit is invalid; the hook's state changes are then discarded along
/// with the rest of the block.
///
/// Never return `max_block` or another upper bound as a "safe" answer; that starves every
/// other item of the block.
pub trait OnInitialize {
	/// Stable identifier used in logs and in the charge ledger.
	fn name(&self) -> &'static str;

	/// Run the hook for block `now`.
	#[must_use]
	fn on_initialize(&self, now: BlockNumber, storage: &mut dyn Storage) -> Weight;

	/// What [`Self::on_initialize`] costs on a block where the hook has nothing to do.
	fn idle_weight(&self) -> Weight {
		Weight::zero()
	}
}
