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

use frame_block_system::{BudgetExceeded, ChargeSource, DispatchClass, Weight};

/// Reasons for a block to be rejected. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidBlock {
	/// Mandatory work (base block, a hook or an inherent) did not fit into the block.
	#[error("mandatory {charge:?} does not fit into the block: {error}")]
	MandatoryExhausted {
		charge: ChargeSource,
		#[source]
		error: BudgetExceeded,
	},
	/// The hooks left less than the configured inherent reserve.
	#[error("hooks left {remaining:?}, less than the inherent reserve {reserve:?}")]
	InherentReserveViolated { reserve: Weight, remaining: Weight },
	/// The running totals disagree with the charge ledger.
	#[error("{class:?} running total {recorded:?} disagrees with ledger total {derived:?}")]
	LedgerMismatch { class: Option<DispatchClass>, recorded: Weight, derived: Weight },
	/// The block as a whole is heavier than `max_block`.
	#[error("block weight {total:?} exceeds max_block {max_block:?}")]
	ExceedsMaxBlock { total: Weight, max_block: Weight },
	/// A class consumed more than its own cap.
	#[error("{class:?} weight {consumed:?} exceeds the class limit {limit:?}")]
	ExceedsClassLimit { class: DispatchClass, consumed: Weight, limit: Weight },
}
