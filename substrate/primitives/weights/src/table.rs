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

//! The benchmarking artifact: coefficients for every weighed operation, indexed by name.
//!
//! The artifact is produced by an offline benchmarking run. It lists, per operation, a base
//! weight plus a number of storage reads and writes, and for every component a per-unit weight
//! plus per-unit reads and writes. Loading the artifact folds the database terms into plain
//! [`CostModel`] coefficients using the artifact's [`RuntimeDbWeight`], so that the accounting
//! code only ever deals with weights.

use crate::{CostModel, RuntimeDbWeight, Weight};
use alloc::{collections::BTreeMap, string::String, vec::Vec};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Coefficients of one component as written by the benchmarking run.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComponentCoefficients {
	pub name: String,
	#[serde(default, with = "crate::serde_helpers::weight")]
	pub weight: Weight,
	#[serde(default)]
	pub reads: u64,
	#[serde(default)]
	pub writes: u64,
}

/// Coefficients of one operation as written by the benchmarking run.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationCoefficients {
	#[serde(default, with = "crate::serde_helpers::weight")]
	pub base_weight: Weight,
	#[serde(default)]
	pub base_reads: u64,
	#[serde(default)]
	pub base_writes: u64,
	#[serde(default)]
	pub components: Vec<ComponentCoefficients>,
}

/// Serialized form of a [`WeightTable`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BenchmarkArtifact {
	pub version: u32,
	#[serde(with = "crate::serde_helpers::db_weight")]
	pub db_weight: RuntimeDbWeight,
	pub operations: BTreeMap<String, OperationCoefficients>,
}

/// Errors raised while loading or querying a [`WeightTable`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TableError {
	/// The artifact could not be parsed.
	Malformed(String),
	/// An operation required by a hook has no entry.
	MissingOperation(String),
	/// The artifact was produced for a different table layout.
	VersionMismatch { expected: u32, found: u32 },
	/// An operation's model has a component its caller does not know how to feed.
	UnknownComponent { operation: String, component: String },
}

impl fmt::Display for TableError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			TableError::Malformed(reason) => write!(f, "malformed weight table: {reason}"),
			TableError::MissingOperation(op) => write!(f, "weight table has no entry for `{op}`"),
			TableError::VersionMismatch { expected, found } => {
				write!(f, "weight table version {found} does not match expected {expected}")
			},
			TableError::UnknownComponent { operation, component } => {
				write!(f, "`{operation}` has unknown component `{component}`")
			},
		}
	}
}

#[cfg(feature = "std")]
impl std::error::Error for TableError {}

/// Versioned set of cost models, one per operation (or operation branch).
///
/// Coefficient updates only ever change the table, never the accounting logic consuming it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WeightTable {
	version: u32,
	db_weight: RuntimeDbWeight,
	models: BTreeMap<String, CostModel>,
}

impl WeightTable {
	pub fn new(version: u32, db_weight: RuntimeDbWeight) -> Self {
		Self { version, db_weight, models: BTreeMap::new() }
	}

	/// Build a table from a benchmarking artifact, folding storage reads and writes into the
	/// reference time coefficients.
	pub fn from_artifact(artifact: BenchmarkArtifact) -> Self {
		let db = artifact.db_weight;
		let models = artifact
			.operations
			.into_iter()
			.map(|(name, op)| {
				let base =
					op.base_weight.saturating_add(db.reads_writes(op.base_reads, op.base_writes));
				let model = op.components.into_iter().fold(CostModel::constant(base), |m, c| {
					let slope = c.weight.saturating_add(db.reads_writes(c.reads, c.writes));
					m.with_component(c.name, slope)
				});
				(name, model)
			})
			.collect();
		Self { version: artifact.version, db_weight: db, models }
	}

	/// Parse a JSON encoded [`BenchmarkArtifact`].
	pub fn from_json(json: &str) -> Result<Self, TableError> {
		let artifact: BenchmarkArtifact =
			serde_json::from_str(json).map_err(|e| TableError::Malformed(alloc::format!("{e}")))?;
		Ok(Self::from_artifact(artifact))
	}

	/// Register (or replace) the model of `operation`.
	pub fn insert(&mut self, operation: impl Into<String>, model: CostModel) {
		self.models.insert(operation.into(), model);
	}

	/// Builder flavour of [`Self::insert`].
	pub fn with(mut self, operation: impl Into<String>, model: CostModel) -> Self {
		self.insert(operation, model);
		self
	}

	pub fn version(&self) -> u32 {
		self.version
	}

	pub fn db_weight(&self) -> RuntimeDbWeight {
		self.db_weight
	}

	pub fn get(&self, operation: &str) -> Option<&CostModel> {
		self.models.get(operation)
	}

	/// Like [`Self::get`], but a missing entry is an error.
	pub fn model(&self, operation: &str) -> Result<&CostModel, TableError> {
		self.get(operation).ok_or_else(|| TableError::MissingOperation(operation.into()))
	}

	/// Like [`Self::model`], but also fails if the model has a component not listed in `known`.
	///
	/// A component the caller never passes would silently evaluate as zero.
	pub fn model_with_components(
		&self,
		operation: &str,
		known: &[&str],
	) -> Result<&CostModel, TableError> {
		let model = self.model(operation)?;
		match model.components().iter().find(|c| !known.contains(&c.name.as_str())) {
			Some(c) => Err(TableError::UnknownComponent {
				operation: operation.into(),
				component: c.name.clone(),
			}),
			None => Ok(model),
		}
	}

	pub fn ensure_version(&self, expected: u32) -> Result<(), TableError> {
		if self.version == expected {
			Ok(())
		} else {
			Err(TableError::VersionMismatch { expected, found: self.version })
		}
	}

	pub fn operations(&self) -> impl Iterator<Item = &str> {
		self.models.keys().map(|k| k.as_str())
	}
}
