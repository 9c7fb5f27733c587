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

//! `serde` forms of weights as they appear in benchmarking artifacts and configuration files.
//!
//! Weights are written as `{ "refTime": .., "proofSize": .. }` and database weights as
//! `{ "read": .., "write": .. }`. Use the modules with `#[serde(with = "..")]`.

use crate::{RuntimeDbWeight, Weight};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WeightParts {
	ref_time: u64,
	proof_size: u64,
}

impl From<Weight> for WeightParts {
	fn from(weight: Weight) -> Self {
		Self { ref_time: weight.ref_time(), proof_size: weight.proof_size() }
	}
}

impl From<WeightParts> for Weight {
	fn from(parts: WeightParts) -> Self {
		Weight::from_parts(parts.ref_time, parts.proof_size)
	}
}

/// A [`Weight`] field.
pub mod weight {
	use super::*;

	pub fn serialize<S: Serializer>(weight: &Weight, serializer: S) -> Result<S::Ok, S::Error> {
		WeightParts::from(*weight).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weight, D::Error> {
		WeightParts::deserialize(deserializer).map(Into::into)
	}
}

/// An `Option<Weight>` field.
pub mod weight_option {
	use super::*;

	pub fn serialize<S: Serializer>(
		weight: &Option<Weight>,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		weight.map(WeightParts::from).serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Option<Weight>, D::Error> {
		Option::<WeightParts>::deserialize(deserializer).map(|parts| parts.map(Into::into))
	}
}

/// A [`RuntimeDbWeight`] field.
pub mod db_weight {
	use super::*;

	#[derive(Serialize, Deserialize)]
	#[serde(deny_unknown_fields)]
	struct DbWeightParts {
		read: u64,
		write: u64,
	}

	pub fn serialize<S: Serializer>(
		db: &RuntimeDbWeight,
		serializer: S,
	) -> Result<S::Ok, S::Error> {
		DbWeightParts { read: db.read, write: db.write }.serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<RuntimeDbWeight, D::Error> {
		let parts = DbWeightParts::deserialize(deserializer)?;
		Ok(RuntimeDbWeight { read: parts.read, write: parts.write })
	}
}
