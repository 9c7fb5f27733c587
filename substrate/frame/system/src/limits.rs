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

//! Block resource limits configuration structures.
//!
//! [`BlockLimits`] can only be obtained through [`BlockLimitsBuilder::build`] (or the JSON
//! [`BlockLimitsConfig`] that feeds it), which validates the configuration once, before any block
//! is processed. After that the limits are immutable.
//!
//! ```ignore
//! let limits = BlockLimits::builder()
//! 	.max_block(Weight::from_parts(2 * WEIGHT_REF_TIME_PER_SECOND, 5 * 1024 * 1024))
//! 	.for_class(DispatchClass::Normal, |c| c.ratio = Some(Perbill::from_percent(75)))
//! 	.for_class(DispatchClass::Operational, |c| c.ratio = Some(Perbill::from_percent(25)))
//! 	.build()?;
//! ```

use crate::{DispatchClass, OneOrMany, PerDispatchClass};
use serde::{Deserialize, Serialize};
use sp_arithmetic::Perbill;
use sp_hook_weights::{TableError, Weight};

/// Hooks may not cost more than this share (5%) of `max_block` on a block where they have
/// nothing to do.
pub const IDLE_COST_CEILING: Perbill = Perbill::from_parts(50_000_000);

/// Errors detected while validating configuration. All of them are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
	#[error("max_block must be non-zero in both dimensions, got {0:?}")]
	ZeroMaxBlock(Weight),
	#[error("class ratios sum to {total} parts per billion, more than the whole block")]
	RatiosExceedBlock { total: u64 },
	#[error("{class:?} share of {percent}% is not a valid percentage")]
	InvalidPercent { class: DispatchClass, percent: u8 },
	#[error("base_block {base_block:?} does not fit into max_block {max_block:?}")]
	BaseBlockExceedsMax { base_block: Weight, max_block: Weight },
	#[error("{class:?} base_extrinsic {base:?} does not fit into the class limit {limit:?}")]
	BaseExtrinsicExceedsLimit { class: DispatchClass, base: Weight, limit: Weight },
	#[error("{class:?} max_extrinsic {max:?} does not fit into the class limit {limit:?}")]
	MaxExtrinsicExceedsClassLimit { class: DispatchClass, max: Weight, limit: Weight },
	#[error("inherent reserve {reserve:?} plus base_block does not fit into max_block")]
	InherentReserveTooLarge { reserve: Weight },
	#[error("idle cost {idle:?} of the registered hooks exceeds the allowed {allowed:?}")]
	IdleCostTooHigh { idle: Weight, allowed: Weight },
	#[error(transparent)]
	WeightTable(#[from] TableError),
	#[error("malformed configuration: {0}")]
	Malformed(String),
}

/// `WeightsPerClass` limits configured for a single [`DispatchClass`].
#[derive(Clone, Copy, Eq, PartialEq, Default, Debug)]
pub struct WeightsPerClass {
	base_extrinsic: Weight,
	max_extrinsic: Option<Weight>,
	max_total: Option<Weight>,
	ratio: Option<Perbill>,
}

impl WeightsPerClass {
	/// Base weight charged on top of every item of this class.
	pub fn base_extrinsic(&self) -> Weight {
		self.base_extrinsic
	}

	/// Maximal weight of a single item of this class, base included.
	///
	/// `None` means an item is only bound by [`Self::max_total`].
	pub fn max_extrinsic(&self) -> Option<Weight> {
		self.max_extrinsic
	}

	/// Block maximal total weight for all items of this class.
	///
	/// `None` indicates that this class is only bound by the whole block's `max_block`.
	pub fn max_total(&self) -> Option<Weight> {
		self.max_total
	}

	/// The share of `max_block` `max_total` was derived from.
	pub fn ratio(&self) -> Option<Perbill> {
		self.ratio
	}
}

/// Validated, immutable weight limits of a block.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BlockLimits {
	base_block: Weight,
	max_block: Weight,
	per_class: PerDispatchClass<WeightsPerClass>,
	inherent_reserve: Option<Weight>,
}

impl BlockLimits {
	/// Start constructing new `BlockLimits` object.
	///
	/// By default all class ratios are unset, all base weights are zero and there is no
	/// inherent reserve.
	pub fn builder() -> BlockLimitsBuilder {
		BlockLimitsBuilder {
			max_block: Weight::zero(),
			base_block: Weight::zero(),
			per_class: PerDispatchClass::new(|_| ClassLimits::default()),
			inherent_reserve: None,
		}
	}

	/// Limits where every class may use the whole block.
	pub fn simple_max(max_block: Weight) -> Result<Self, ConfigurationError> {
		Self::builder().max_block(max_block).build()
	}

	/// Limits where `Normal` items may use `normal_ratio` of the block, `Operational` items
	/// the rest, and `Mandatory` work is only bound by the block itself.
	pub fn with_sensible_defaults(
		max_block: Weight,
		normal_ratio: Perbill,
	) -> Result<Self, ConfigurationError> {
		let operational_ratio =
			Perbill::from_parts(Perbill::one().deconstruct() - normal_ratio.deconstruct());
		Self::builder()
			.max_block(max_block)
			.for_class(DispatchClass::Normal, |c| c.ratio = Some(normal_ratio))
			.for_class(DispatchClass::Operational, |c| c.ratio = Some(operational_ratio))
			.build()
	}

	/// Parse and validate limits from their JSON file form.
	pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
		let config: BlockLimitsConfig =
			serde_json::from_str(json).map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
		config.try_into()
	}

	/// Weight charged for simply having a block, before any hook runs.
	pub fn base_block(&self) -> Weight {
		self.base_block
	}

	/// Maximal total weight consumed by all kinds of work in a block.
	pub fn max_block(&self) -> Weight {
		self.max_block
	}

	/// Get per-class weight settings.
	pub fn get(&self, class: DispatchClass) -> &WeightsPerClass {
		self.per_class.get(class)
	}

	/// Minimum budget hooks must leave unspent for mandatory inherents, if configured.
	pub fn inherent_reserve(&self) -> Option<Weight> {
		self.inherent_reserve
	}

	/// Verify that the summed idle cost of all registered hooks stays under
	/// [`IDLE_COST_CEILING`] of `max_block`.
	pub fn check_idle_cost(&self, idle: Weight) -> Result<(), ConfigurationError> {
		let allowed = scale(IDLE_COST_CEILING, self.max_block);
		if idle.all_lte(allowed) {
			Ok(())
		} else {
			Err(ConfigurationError::IdleCostTooHigh { idle, allowed })
		}
	}
}

/// Settings of a single class, as given to the builder.
#[derive(Clone, Copy, Eq, PartialEq, Default, Debug)]
pub struct ClassLimits {
	/// Share of `max_block` the class may use in total. `None` for no class-specific cap.
	pub ratio: Option<Perbill>,
	/// Base weight of every item of the class.
	pub base_extrinsic: Weight,
	/// Maximal weight of a single item of the class.
	pub max_extrinsic: Option<Weight>,
}

/// An opinionated builder for [`BlockLimits`].
pub struct BlockLimitsBuilder {
	max_block: Weight,
	base_block: Weight,
	per_class: PerDispatchClass<ClassLimits>,
	inherent_reserve: Option<Weight>,
}

impl BlockLimitsBuilder {
	/// Set the maximal weight of the whole block.
	pub fn max_block(mut self, max_block: Weight) -> Self {
		self.max_block = max_block;
		self
	}

	/// Set base block weight.
	pub fn base_block(mut self, base_block: Weight) -> Self {
		self.base_block = base_block;
		self
	}

	/// Keep at least `reserve` available for inherents after all hooks have reported.
	pub fn inherent_reserve(mut self, reserve: Weight) -> Self {
		self.inherent_reserve = Some(reserve);
		self
	}

	/// Set parameters for particular class.
	pub fn for_class(
		mut self,
		class: impl OneOrMany<DispatchClass>,
		action: impl Fn(&mut ClassLimits),
	) -> Self {
		for class in class.into_iter() {
			action(self.per_class.get_mut(class));
		}
		self
	}

	/// Construct the [`BlockLimits`] object, validating it.
	pub fn build(self) -> Result<BlockLimits, ConfigurationError> {
		let max_block = self.max_block;
		if max_block.ref_time() == 0 || max_block.proof_size() == 0 {
			return Err(ConfigurationError::ZeroMaxBlock(max_block))
		}

		let total: u64 = DispatchClass::all()
			.iter()
			.filter_map(|class| self.per_class.get(*class).ratio)
			.map(|ratio| ratio.deconstruct() as u64)
			.sum();
		if total > Perbill::one().deconstruct() as u64 {
			return Err(ConfigurationError::RatiosExceedBlock { total })
		}

		if !self.base_block.all_lte(max_block) {
			return Err(ConfigurationError::BaseBlockExceedsMax {
				base_block: self.base_block,
				max_block,
			})
		}

		let mut per_class = PerDispatchClass::new(|_| WeightsPerClass::default());
		for class in DispatchClass::all() {
			let given = self.per_class.get(*class);
			let max_total = given.ratio.map(|ratio| scale(ratio, max_block));
			let limit = max_total.unwrap_or(max_block);

			if !given.base_extrinsic.all_lte(limit) {
				return Err(ConfigurationError::BaseExtrinsicExceedsLimit {
					class: *class,
					base: given.base_extrinsic,
					limit,
				})
			}
			if let Some(max) = given.max_extrinsic {
				if !max.all_lte(limit) {
					return Err(ConfigurationError::MaxExtrinsicExceedsClassLimit {
						class: *class,
						max,
						limit,
					})
				}
			}

			*per_class.get_mut(*class) = WeightsPerClass {
				base_extrinsic: given.base_extrinsic,
				max_extrinsic: given.max_extrinsic,
				max_total,
				ratio: given.ratio,
			};
		}

		if let Some(reserve) = self.inherent_reserve {
			if !self.base_block.saturating_add(reserve).all_lte(max_block) {
				return Err(ConfigurationError::InherentReserveTooLarge { reserve })
			}
		}

		log::debug!(
			target: crate::LOG_TARGET,
			"block limits: max_block {:?}, base_block {:?}, inherent reserve {:?}",
			max_block,
			self.base_block,
			self.inherent_reserve,
		);

		Ok(BlockLimits {
			base_block: self.base_block,
			max_block,
			per_class,
			inherent_reserve: self.inherent_reserve,
		})
	}
}

/// Per-class section of [`BlockLimitsConfig`].
#[derive(Clone, Eq, PartialEq, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassLimitsConfig {
	#[serde(default)]
	pub max_total_percent: Option<u8>,
	#[serde(default, with = "sp_hook_weights::serde_helpers::weight")]
	pub base_extrinsic: Weight,
	#[serde(default, with = "sp_hook_weights::serde_helpers::weight_option")]
	pub max_extrinsic: Option<Weight>,
}

/// File form of [`BlockLimits`].
///
/// ```json
/// {
///   "maxBlock": { "refTime": 2000000000000, "proofSize": 5242880 },
///   "normal": { "maxTotalPercent": 75 },
///   "operational": { "maxTotalPercent": 25 },
///   "inherentReserve": { "refTime": 10000000000, "proofSize": 65536 }
/// }
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BlockLimitsConfig {
	#[serde(with = "sp_hook_weights::serde_helpers::weight")]
	pub max_block: Weight,
	#[serde(default, with = "sp_hook_weights::serde_helpers::weight")]
	pub base_block: Weight,
	#[serde(default)]
	pub normal: ClassLimitsConfig,
	#[serde(default)]
	pub operational: ClassLimitsConfig,
	#[serde(default)]
	pub mandatory: ClassLimitsConfig,
	#[serde(default, with = "sp_hook_weights::serde_helpers::weight_option")]
	pub inherent_reserve: Option<Weight>,
}

impl TryFrom<BlockLimitsConfig> for BlockLimits {
	type Error = ConfigurationError;

	fn try_from(config: BlockLimitsConfig) -> Result<Self, Self::Error> {
		let mut builder =
			BlockLimits::builder().max_block(config.max_block).base_block(config.base_block);
		if let Some(reserve) = config.inherent_reserve {
			builder = builder.inherent_reserve(reserve);
		}

		for (class, section) in [
			(DispatchClass::Normal, &config.normal),
			(DispatchClass::Operational, &config.operational),
			(DispatchClass::Mandatory, &config.mandatory),
		] {
			let ratio = match section.max_total_percent {
				Some(percent) if percent > 100 =>
					return Err(ConfigurationError::InvalidPercent { class, percent }),
				Some(percent) => Some(Perbill::from_percent(percent as u32)),
				None => None,
			};
			builder = builder.for_class(class, |c| {
				c.ratio = ratio;
				c.base_extrinsic = section.base_extrinsic;
				c.max_extrinsic = section.max_extrinsic;
			});
		}

		builder.build()
	}
}

/// Apply `ratio` to both dimensions of `weight`, rounding down.
pub(crate) fn scale(ratio: Perbill, weight: Weight) -> Weight {
	Weight::from_parts(ratio.mul_floor(weight.ref_time()), ratio.mul_floor(weight.proof_size()))
}
