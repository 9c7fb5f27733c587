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

//! Weights for pallet_referendum_tally.
//!
//! Components:
//! - `r`: unbaked referenda read to find a free slot when launching.
//! - `p`: public proposals whose deposit was read to pick the one to launch.
//! - `k`: referenda maturing, and so baked, in the same block.

#![allow(unused_parens)]

use frame_block_system::ConfigurationError;
use sp_hook_weights::{constants::ROCKS_DB_WEIGHT, CostModel, Weight, WeightTable};

pub const ON_INITIALIZE_BASE: &str = "pallet_referendum_tally::on_initialize_base";
pub const LAUNCH_NEXT: &str = "pallet_referendum_tally::launch_next";
pub const BAKE_REFERENDA: &str = "pallet_referendum_tally::bake_referenda";
pub const PROPOSE: &str = "pallet_referendum_tally::propose";
pub const VOTE: &str = "pallet_referendum_tally::vote";

/// Weight functions needed for pallet_referendum_tally.
pub trait WeightInfo {
	fn on_initialize_base(&self) -> Weight;
	fn launch_next(&self, r: u32, p: u32) -> Weight;
	fn bake_referenda(&self, k: u32) -> Weight;
	fn propose(&self) -> Weight;
	fn vote(&self) -> Weight;
}

/// Weights read from a benchmarking artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableWeights {
	on_initialize_base: CostModel,
	launch_next: CostModel,
	bake_referenda: CostModel,
	propose: CostModel,
	vote: CostModel,
}

impl TableWeights {
	/// Pick the models of this pallet's operations out of `table`.
	pub fn from_table(table: &WeightTable) -> Result<Self, ConfigurationError> {
		Ok(Self {
			on_initialize_base: table.model_with_components(ON_INITIALIZE_BASE, &[])?.clone(),
			launch_next: table.model_with_components(LAUNCH_NEXT, &["r", "p"])?.clone(),
			bake_referenda: table.model_with_components(BAKE_REFERENDA, &["k"])?.clone(),
			propose: table.model_with_components(PROPOSE, &[])?.clone(),
			vote: table.model_with_components(VOTE, &[])?.clone(),
		})
	}
}

impl WeightInfo for TableWeights {
	fn on_initialize_base(&self) -> Weight {
		self.on_initialize_base.evaluate(&[])
	}
	fn launch_next(&self, r: u32, p: u32) -> Weight {
		self.launch_next.evaluate_named(&[("r", r), ("p", p)])
	}
	fn bake_referenda(&self, k: u32) -> Weight {
		self.bake_referenda.evaluate_named(&[("k", k)])
	}
	fn propose(&self) -> Weight {
		self.propose.evaluate(&[])
	}
	fn vote(&self) -> Weight {
		self.vote.evaluate(&[])
	}
}

// For backwards compatibility and tests.
impl WeightInfo for () {
	/// Storage: `ReferendumTally::LowestUnbaked` (r:1 w:0)
	/// Storage: `ReferendumTally::ReferendumCount` (r:1 w:0)
	fn on_initialize_base(&self) -> Weight {
		Weight::from_parts(6_134_000, 1_489)
			.saturating_add(ROCKS_DB_WEIGHT.reads(2_u64))
	}
	/// Storage: `ReferendumTally::LowestUnbaked` (r:1 w:0)
	/// Storage: `ReferendumTally::ReferendumCount` (r:1 w:1)
	/// Storage: `ReferendumTally::PublicProps` (r:1 w:1)
	/// Storage: `ReferendumTally::DepositOf` (r:p w:1)
	/// Storage: `ReferendumTally::ReferendumInfoOf` (r:r w:1)
	fn launch_next(&self, r: u32, p: u32) -> Weight {
		Weight::from_parts(14_908_000, 18_187)
			// Standard Error: 6_638
			.saturating_add(Weight::from_parts(6_638_000, 2_676).saturating_mul(r as u64))
			// Standard Error: 4_112
			.saturating_add(Weight::from_parts(3_271_000, 2_613).saturating_mul(p as u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads(3_u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads((1_u64).saturating_mul(r as u64)))
			.saturating_add(ROCKS_DB_WEIGHT.reads((1_u64).saturating_mul(p as u64)))
			.saturating_add(ROCKS_DB_WEIGHT.writes(4_u64))
	}
	/// Storage: `ReferendumTally::LowestUnbaked` (r:1 w:1)
	/// Storage: `ReferendumTally::ReferendumCount` (r:1 w:0)
	/// Storage: `ReferendumTally::ReferendumInfoOf` (r:k w:k)
	/// Storage: `ReferendumTally::DispatchQueue` (r:1 w:1)
	fn bake_referenda(&self, k: u32) -> Weight {
		Weight::from_parts(9_311_000, 1_489)
			// Standard Error: 7_219
			.saturating_add(Weight::from_parts(9_204_000, 2_676).saturating_mul(k as u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads(3_u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads((1_u64).saturating_mul(k as u64)))
			.saturating_add(ROCKS_DB_WEIGHT.writes(2_u64))
			.saturating_add(ROCKS_DB_WEIGHT.writes((1_u64).saturating_mul(k as u64)))
	}
	/// Storage: `ReferendumTally::PublicPropCount` (r:1 w:1)
	/// Storage: `ReferendumTally::PublicProps` (r:1 w:1)
	/// Storage: `ReferendumTally::DepositOf` (r:0 w:1)
	fn propose(&self) -> Weight {
		Weight::from_parts(42_153_000, 18_187)
			.saturating_add(ROCKS_DB_WEIGHT.reads(2_u64))
			.saturating_add(ROCKS_DB_WEIGHT.writes(3_u64))
	}
	/// Storage: `ReferendumTally::ReferendumInfoOf` (r:1 w:1)
	/// Storage: `ReferendumTally::VoteOf` (r:1 w:1)
	fn vote(&self) -> Weight {
		Weight::from_parts(43_792_000, 19_800)
			.saturating_add(ROCKS_DB_WEIGHT.reads(2_u64))
			.saturating_add(ROCKS_DB_WEIGHT.writes(2_u64))
	}
}
