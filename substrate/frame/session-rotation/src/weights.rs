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

//! Weights for pallet_session_rotation.
//!
//! Components:
//! - `v`: validators of the session being activated.
//! - `n`: candidates offered for the session after, each looked up in `NextKeys`.
//! - `q`: validators queued for the session after.
//! - `c`: queued validators whose keys differ from the active ones.

#![allow(unused_parens)]

use frame_block_system::ConfigurationError;
use sp_hook_weights::{constants::ROCKS_DB_WEIGHT, CostModel, Weight, WeightTable};

pub const SHOULD_END_SESSION: &str = "pallet_session_rotation::should_end_session";
pub const ROTATE_SESSION: &str = "pallet_session_rotation::rotate_session";
pub const SET_KEYS: &str = "pallet_session_rotation::set_keys";
pub const PURGE_KEYS: &str = "pallet_session_rotation::purge_keys";

/// Weight functions needed for pallet_session_rotation.
pub trait WeightInfo {
	fn should_end_session(&self) -> Weight;
	fn rotate_session(&self, v: u32, n: u32, q: u32, c: u32) -> Weight;
	fn set_keys(&self) -> Weight;
	fn purge_keys(&self) -> Weight;
}

/// Weights read from a benchmarking artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableWeights {
	should_end_session: CostModel,
	rotate_session: CostModel,
	set_keys: CostModel,
	purge_keys: CostModel,
}

impl TableWeights {
	/// Pick the models of this pallet's operations out of `table`.
	pub fn from_table(table: &WeightTable) -> Result<Self, ConfigurationError> {
		Ok(Self {
			should_end_session: table.model_with_components(SHOULD_END_SESSION, &[])?.clone(),
			rotate_session: table
				.model_with_components(ROTATE_SESSION, &["v", "n", "q", "c"])?
				.clone(),
			set_keys: table.model_with_components(SET_KEYS, &[])?.clone(),
			purge_keys: table.model_with_components(PURGE_KEYS, &[])?.clone(),
		})
	}
}

impl WeightInfo for TableWeights {
	fn should_end_session(&self) -> Weight {
		self.should_end_session.evaluate(&[])
	}
	fn rotate_session(&self, v: u32, n: u32, q: u32, c: u32) -> Weight {
		self.rotate_session.evaluate_named(&[("v", v), ("n", n), ("q", q), ("c", c)])
	}
	fn set_keys(&self) -> Weight {
		self.set_keys.evaluate(&[])
	}
	fn purge_keys(&self) -> Weight {
		self.purge_keys.evaluate(&[])
	}
}

// For backwards compatibility and tests.
impl WeightInfo for () {
	/// Storage: `Session::CurrentIndex` (r:1 w:0)
	fn should_end_session(&self) -> Weight {
		Weight::from_parts(2_139_000, 1_489)
	}
	/// Storage: `Session::CurrentIndex` (r:1 w:1)
	/// Storage: `Session::QueuedChanged` (r:1 w:1)
	/// Storage: `Session::QueuedKeys` (r:1 w:1)
	/// Storage: `Session::Validators` (r:0 w:1)
	/// Storage: `Session::NextKeys` (r:n w:0)
	fn rotate_session(&self, v: u32, n: u32, q: u32, c: u32) -> Weight {
		Weight::from_parts(21_733_000, 3_561)
			// Standard Error: 9_422
			.saturating_add(Weight::from_parts(1_216_307, 0).saturating_mul(v as u64))
			// Standard Error: 7_805
			.saturating_add(Weight::from_parts(1_372_560, 2_520).saturating_mul(n as u64))
			// Standard Error: 9_422
			.saturating_add(Weight::from_parts(667_554, 0).saturating_mul(q as u64))
			// Standard Error: 11_318
			.saturating_add(Weight::from_parts(418_006, 0).saturating_mul(c as u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads(3_u64))
			.saturating_add(ROCKS_DB_WEIGHT.reads((1_u64).saturating_mul(n as u64)))
			.saturating_add(ROCKS_DB_WEIGHT.writes(4_u64))
	}
	/// Storage: `Session::NextKeys` (r:1 w:1)
	/// Storage: `Session::KeyOwner` (r:2 w:2)
	fn set_keys(&self) -> Weight {
		Weight::from_parts(29_471_000, 6_946)
			.saturating_add(ROCKS_DB_WEIGHT.reads(3_u64))
			.saturating_add(ROCKS_DB_WEIGHT.writes(3_u64))
	}
	/// Storage: `Session::NextKeys` (r:1 w:1)
	/// Storage: `Session::KeyOwner` (r:0 w:1)
	fn purge_keys(&self) -> Weight {
		Weight::from_parts(20_985_000, 3_561)
			.saturating_add(ROCKS_DB_WEIGHT.reads(1_u64))
			.saturating_add(ROCKS_DB_WEIGHT.writes(2_u64))
	}
}
