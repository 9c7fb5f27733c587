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

//! Linear cost models derived from benchmarking.

use crate::Weight;
use alloc::{string::String, vec::Vec};
use codec::{Decode, Encode};
use scale_info::TypeInfo;

/// A single linear term of a [`CostModel`].
#[derive(Clone, PartialEq, Eq, Debug, Encode, Decode, TypeInfo)]
pub struct Component {
	/// Name of the benchmark component, e.g. `v` for validators.
	pub name: String,
	/// Cost added per unit of the component.
	pub slope: Weight,
}

/// Predicts the weight of one operation (or one branch of an operation) from the sizes of its
/// inputs.
///
/// The prediction is `base + Σ(slope_i * param_i)` with all arithmetic saturating. Since the
/// coefficients are unsigned, the model is monotonic non-decreasing in every parameter, so
/// evaluating it with configured upper bounds yields an upper bound of the cost.
#[derive(Clone, PartialEq, Eq, Debug, Encode, Decode, TypeInfo)]
pub struct CostModel {
	base: Weight,
	components: Vec<Component>,
}

impl CostModel {
	/// A model with no components, costing `base` regardless of input.
	pub fn constant(base: Weight) -> Self {
		Self { base, components: Vec::new() }
	}

	/// Append a linear component. Parameters passed to [`Self::evaluate`] are matched to
	/// components in the order they were added.
	pub fn with_component(mut self, name: impl Into<String>, slope: Weight) -> Self {
		self.components.push(Component { name: name.into(), slope });
		self
	}

	/// The cost with every parameter at zero.
	pub fn base(&self) -> Weight {
		self.base
	}

	pub fn components(&self) -> &[Component] {
		&self.components
	}

	/// Number of parameters this model expects.
	pub fn arity(&self) -> usize {
		self.components.len()
	}

	/// Position of the component called `name`, if any.
	pub fn component_index(&self, name: &str) -> Option<usize> {
		self.components.iter().position(|c| c.name == name)
	}

	/// Evaluate the model.
	///
	/// `params[i]` is the value of the `i`-th component. Missing trailing parameters count as
	/// zero, surplus ones are ignored.
	pub fn evaluate(&self, params: &[u32]) -> Weight {
		self.components
			.iter()
			.zip(params.iter().copied().chain(core::iter::repeat(0)))
			.fold(self.base, |acc, (component, n)| {
				acc.saturating_add(component.slope.saturating_mul(n as u64))
			})
	}

	/// Evaluate with named parameters. Unknown names are ignored, unnamed components are zero.
	pub fn evaluate_named(&self, params: &[(&str, u32)]) -> Weight {
		let mut positional = alloc::vec![0u32; self.components.len()];
		for (name, value) in params {
			if let Some(index) = self.component_index(name) {
				positional[index] = *value;
			}
		}
		self.evaluate(&positional)
	}
}
