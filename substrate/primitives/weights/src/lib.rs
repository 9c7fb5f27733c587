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

//! # Primitives for hook weighting.
//!
//! A [`Weight`] is the two-dimensional resource cost charged against a block: the execution
//! time (`ref_time`) and the size of the witness needed to prove the state transition
//! (`proof_size`). Both dimensions must fit into the block's limits for the block to be valid,
//! so weights are only ever compared with [`Weight::all_lte`] and [`Weight::any_gt`].
//!
//! Costs are not measured at runtime. They are predicted by a [`CostModel`], a pure function
//! `base + Σ(slope_i * param_i)` whose coefficients come from an offline benchmarking run and
//! are shipped as a versioned [`WeightTable`].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod cost_model;
pub mod serde_helpers;
mod table;

pub use cost_model::{Component, CostModel};
pub use sp_weights::{RuntimeDbWeight, Weight};
pub use table::{
	BenchmarkArtifact, ComponentCoefficients, OperationCoefficients, TableError, WeightTable,
};

pub mod constants {
	use super::RuntimeDbWeight;
	pub use sp_weights::constants::*;

	/// By default, Substrate uses RocksDB, so this will be the weight used throughout
	/// the runtime.
	pub const ROCKS_DB_WEIGHT: RuntimeDbWeight = RuntimeDbWeight {
		read: 25_000 * WEIGHT_REF_TIME_PER_NANOS,
		write: 100_000 * WEIGHT_REF_TIME_PER_NANOS,
	};
}
