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

//! # Referendum Tally Pallet
//!
//! Launches public proposals as referenda and tallies them when they mature, reporting, as an
//! initialization hook, the weight of every branch it took in the block.
//!
//! ## Overview
//!
//! - **Public proposals** are made with [`Pallet::propose`] and a deposit of at least
//!   [`ReferendumConfig::minimum_deposit`].
//! - **Launch:** every [`ReferendumConfig::launch_period`] blocks the proposal with the highest
//!   deposit becomes a referendum, provided fewer than [`ReferendumConfig::max_referenda`] are
//!   ongoing. Equal deposits go to the older proposal. The referendum ends
//!   [`ReferendumConfig::voting_period`] blocks later.
//! - **Voting:** [`Pallet::vote`] casts an aye or nay backed by a balance. Voting again
//!   replaces the earlier vote.
//! - **Bake:** every referendum whose end block has come is tallied by simple majority in the
//!   same pass. Approved proposals are queued for enactment
//!   [`ReferendumConfig::enactment_period`] blocks later.
//!
//! Referenda end blocks are non-decreasing in referendum index, so the maturing ones are always
//! a prefix of those still ongoing.
//!
//! ## Weight
//!
//! Each branch has its own cost model. `launch_next(r, p)` scales with the `r` unbaked referenda
//! read to find a free slot and the `p` proposals whose deposits were compared, and
//! `bake_referenda(k)` with the `k` referenda maturing together. A block that launches and bakes
//! is charged the sum of both. A block that does neither is charged
//! `on_initialize_base`. A launch attempt that finds no free slot is still charged for the
//! referenda it read, with `p = 0`.

#[cfg(test)]
mod mock;
mod types;
pub mod weights;

pub use types::{PropIndex, ReferendumIndex, ReferendumInfo, ReferendumStatus, Tally, Vote};
pub use weights::{TableWeights, WeightInfo};

use frame_block_system::{
	BlockNumber, ConfigurationError, DispatchClass, DispatchInfo, Member, OnInitialize, Storage,
	StorageMap, StorageValue,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sp_arithmetic::traits::AtLeast32BitUnsigned;
use sp_hook_weights::Weight;
use std::{cmp::Reverse, marker::PhantomData};

const LOG_TARGET: &str = "runtime::referendum-tally";

/// Types the pallet is generic over.
pub trait Config: 'static {
	/// Who proposes and votes.
	type AccountId: Member;
	/// What a referendum decides on.
	type Proposal: Member;
	/// Deposits and voting power.
	type Balance: Member + AtLeast32BitUnsigned + Copy + Default;
	/// Weight information for the operations of this pallet.
	type WeightInfo: WeightInfo;
}

/// Deployment specific periods and bounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReferendumConfig<Balance> {
	/// How often (in blocks) new public referenda are launched.
	pub launch_period: BlockNumber,
	/// How often (in blocks) to check for new votes.
	pub voting_period: BlockNumber,
	/// The period between a proposal being approved and enacted.
	pub enactment_period: BlockNumber,
	/// The minimum amount to be used as a deposit for a public referendum proposal.
	pub minimum_deposit: Balance,
	/// The maximum number of public proposals that can exist at any time.
	pub max_proposals: u32,
	/// The maximum number of ongoing referenda; the launch model was benchmarked for this many.
	pub max_referenda: u32,
}

impl<Balance: DeserializeOwned> ReferendumConfig<Balance> {
	pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
		serde_json::from_str(json).map_err(|e| ConfigurationError::Malformed(e.to_string()))
	}
}

/// Errors of the proposal and voting calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// Value too low
	#[error("deposit below the minimum")]
	ValueLow,
	/// Maximum number of proposals reached.
	#[error("too many public proposals")]
	TooMany,
	/// Vote given for invalid referendum
	#[error("vote given for invalid referendum")]
	ReferendumInvalid,
	/// A referendum must not end before the one injected before it.
	#[error("cannot inject a referendum that ends earlier than preceding referendum")]
	EndsBeforePrevious,
}

/// A branch the hook took in a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyBranch {
	/// Nothing was launched or matured.
	Idle,
	/// A launch was attempted.
	Launch(LaunchScan),
	/// This many referenda matured and were baked.
	Bake(u32),
}

/// Sizes of what a launch attempt read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LaunchScan {
	/// Unbaked referenda whose info was read to find a free slot.
	pub referenda: u32,
	/// Public proposals whose deposit was read to pick the one to launch.
	pub proposals: u32,
}

/// What the hook did in a block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TallyReport {
	/// What the launch attempt read, if one was made.
	pub launch: Option<LaunchScan>,
	/// Referenda baked.
	pub baked: u32,
}

impl TallyReport {
	/// The branches taken, `Idle` alone if there were none.
	pub fn branches(&self) -> Vec<TallyBranch> {
		let mut branches = Vec::with_capacity(2);
		if let Some(scan) = self.launch {
			branches.push(TallyBranch::Launch(scan));
		}
		if self.baked > 0 {
			branches.push(TallyBranch::Bake(self.baked));
		}
		if branches.is_empty() {
			branches.push(TallyBranch::Idle);
		}
		branches
	}
}

type ReferendumInfoOf<T> =
	ReferendumInfo<BlockNumber, <T as Config>::Proposal, <T as Config>::Balance>;

/// The referendum tally hook.
pub struct Pallet<T: Config> {
	weights: T::WeightInfo,
	config: ReferendumConfig<T::Balance>,
	_phantom: PhantomData<T>,
}

impl<T: Config> Pallet<T> {
	/// The number of (public) proposals that have been made so far.
	pub const PUBLIC_PROP_COUNT: StorageValue<PropIndex> =
		StorageValue::new(b"ReferendumTally::PublicPropCount");
	/// The public proposals. Unsorted.
	pub const PUBLIC_PROPS: StorageValue<Vec<(PropIndex, T::Proposal, T::AccountId)>> =
		StorageValue::new(b"ReferendumTally::PublicProps");
	/// Those who have locked a deposit.
	pub const DEPOSIT_OF: StorageMap<PropIndex, (T::AccountId, T::Balance)> =
		StorageMap::new(b"ReferendumTally::DepositOf");
	/// The next free referendum index, aka the number of referenda started so far.
	pub const REFERENDUM_COUNT: StorageValue<ReferendumIndex> =
		StorageValue::new(b"ReferendumTally::ReferendumCount");
	/// The lowest referendum index representing an unbaked referendum.
	pub const LOWEST_UNBAKED: StorageValue<ReferendumIndex> =
		StorageValue::new(b"ReferendumTally::LowestUnbaked");
	/// Information concerning any given referendum.
	pub const REFERENDUM_INFO_OF: StorageMap<ReferendumIndex, ReferendumInfoOf<T>> =
		StorageMap::new(b"ReferendumTally::ReferendumInfoOf");
	/// The vote of an account in a referendum.
	pub const VOTE_OF: StorageMap<(ReferendumIndex, T::AccountId), Vote<T::Balance>> =
		StorageMap::new(b"ReferendumTally::VoteOf");
	/// Approved proposals with the block they are to be enacted at.
	pub const DISPATCH_QUEUE: StorageValue<Vec<(BlockNumber, T::Proposal, ReferendumIndex)>> =
		StorageValue::new(b"ReferendumTally::DispatchQueue");

	pub fn new(weights: T::WeightInfo, config: ReferendumConfig<T::Balance>) -> Self {
		Self { weights, config, _phantom: PhantomData }
	}

	pub fn config(&self) -> &ReferendumConfig<T::Balance> {
		&self.config
	}

	pub fn public_props(storage: &dyn Storage) -> Vec<(PropIndex, T::Proposal, T::AccountId)> {
		Self::PUBLIC_PROPS.get_or_default(storage)
	}

	pub fn deposit_of(
		storage: &dyn Storage,
		proposal: PropIndex,
	) -> Option<(T::AccountId, T::Balance)> {
		Self::DEPOSIT_OF.get(storage, &proposal)
	}

	pub fn referendum_count(storage: &dyn Storage) -> ReferendumIndex {
		Self::REFERENDUM_COUNT.get_or_default(storage)
	}

	pub fn lowest_unbaked(storage: &dyn Storage) -> ReferendumIndex {
		Self::LOWEST_UNBAKED.get_or_default(storage)
	}

	pub fn referendum_info(
		storage: &dyn Storage,
		index: ReferendumIndex,
	) -> Option<ReferendumInfoOf<T>> {
		Self::REFERENDUM_INFO_OF.get(storage, &index)
	}

	pub fn vote_of(
		storage: &dyn Storage,
		index: ReferendumIndex,
		who: &T::AccountId,
	) -> Option<Vote<T::Balance>> {
		Self::VOTE_OF.get(storage, &(index, who.clone()))
	}

	pub fn dispatch_queue(
		storage: &dyn Storage,
	) -> Vec<(BlockNumber, T::Proposal, ReferendumIndex)> {
		Self::DISPATCH_QUEUE.get_or_default(storage)
	}

	/// Referenda launched but not yet baked.
	pub fn ongoing_referenda(storage: &dyn Storage) -> u32 {
		Self::referendum_count(storage).saturating_sub(Self::lowest_unbaked(storage))
	}

	/// Propose a sensitive action to be taken.
	pub fn propose(
		&self,
		storage: &mut dyn Storage,
		who: T::AccountId,
		proposal: T::Proposal,
		value: T::Balance,
	) -> Result<PropIndex, Error> {
		if value < self.config.minimum_deposit {
			return Err(Error::ValueLow)
		}
		let mut props = Self::public_props(storage);
		if props.len() >= self.config.max_proposals as usize {
			return Err(Error::TooMany)
		}

		let index = Self::PUBLIC_PROP_COUNT.get_or_default(storage);
		Self::PUBLIC_PROP_COUNT.put(storage, &index.saturating_add(1));
		Self::DEPOSIT_OF.insert(storage, &index, &(who.clone(), value));
		props.push((index, proposal, who));
		Self::PUBLIC_PROPS.put(storage, &props);
		Ok(index)
	}

	/// Vote in a referendum. A later vote of the same account replaces the earlier one.
	pub fn vote(
		&self,
		storage: &mut dyn Storage,
		who: T::AccountId,
		ref_index: ReferendumIndex,
		vote: Vote<T::Balance>,
	) -> Result<(), Error> {
		let Some(ReferendumInfo::Ongoing(mut status)) = Self::referendum_info(storage, ref_index)
		else {
			return Err(Error::ReferendumInvalid)
		};
		let key = (ref_index, who);
		if let Some(previous) = Self::VOTE_OF.get(storage, &key) {
			status.tally.remove(previous);
		}
		status.tally.add(vote);
		Self::VOTE_OF.insert(storage, &key, &vote);
		Self::REFERENDUM_INFO_OF.insert(storage, &ref_index, &ReferendumInfo::Ongoing(status));
		Ok(())
	}

	pub fn propose_dispatch_info(&self) -> DispatchInfo {
		DispatchInfo { weight: self.weights.propose(), class: DispatchClass::Normal }
	}

	pub fn vote_dispatch_info(&self) -> DispatchInfo {
		DispatchInfo { weight: self.weights.vote(), class: DispatchClass::Normal }
	}

	/// Start a referendum ending at `end`.
	pub fn inject_referendum(
		storage: &mut dyn Storage,
		end: BlockNumber,
		proposal: T::Proposal,
	) -> Result<ReferendumIndex, Error> {
		let ref_index = Self::referendum_count(storage);
		if let Some(previous) = ref_index.checked_sub(1) {
			let ends_later = match Self::referendum_info(storage, previous) {
				Some(ReferendumInfo::Ongoing(status)) => status.end > end,
				Some(ReferendumInfo::Finished { end: finished, .. }) => finished > end,
				None => false,
			};
			if ends_later {
				return Err(Error::EndsBeforePrevious)
			}
		}

		Self::REFERENDUM_COUNT.put(storage, &ref_index.saturating_add(1));
		Self::REFERENDUM_INFO_OF.insert(storage, &ref_index, &ReferendumInfo::new(end, proposal));
		Ok(ref_index)
	}

	fn is_launch_block(&self, now: BlockNumber) -> bool {
		now.checked_rem(self.config.launch_period) == Some(0)
	}

	/// Read the info of every referendum not yet baked.
	///
	/// Returns how many were read and how many of those are still ongoing.
	fn scan_unbaked(storage: &dyn Storage) -> (u32, u32) {
		let count = Self::referendum_count(storage);
		let lowest = Self::lowest_unbaked(storage);
		let ongoing = (lowest..count)
			.filter(|index| {
				matches!(Self::referendum_info(storage, *index), Some(ReferendumInfo::Ongoing(_)))
			})
			.count();
		(count.saturating_sub(lowest), u32::try_from(ongoing).unwrap_or(u32::MAX))
	}

	/// Table the waiting public proposal with the highest deposit for a vote.
	///
	/// Returns what was read on the way, or `None` if no proposal was waiting.
	pub fn launch_next(&self, storage: &mut dyn Storage, now: BlockNumber) -> Option<LaunchScan> {
		let mut public_props = Self::public_props(storage);
		if public_props.is_empty() {
			return None
		}

		let (referenda, ongoing) = Self::scan_unbaked(storage);
		if referenda > self.config.max_referenda {
			log::warn!(
				target: LOG_TARGET,
				"{} referenda unbaked, more than the benchmarked {}",
				referenda,
				self.config.max_referenda,
			);
		}
		if ongoing >= self.config.max_referenda {
			log::debug!(target: LOG_TARGET, "no free referendum slot at block {}", now);
			return Some(LaunchScan { referenda, proposals: 0 })
		}

		let deposits: Vec<T::Balance> = public_props
			.iter()
			.map(|(index, _, _)| {
				Self::deposit_of(storage, *index).map(|(_, d)| d).unwrap_or_default()
			})
			.collect();
		let scan =
			LaunchScan { referenda, proposals: u32::try_from(deposits.len()).unwrap_or(u32::MAX) };
		let winner = deposits
			.iter()
			.enumerate()
			.max_by_key(|(position, deposit)| (**deposit, Reverse(*position)))
			.map(|(position, _)| position)?;

		let end = now.saturating_add(self.config.voting_period);
		match Self::inject_referendum(storage, end, public_props[winner].1.clone()) {
			Ok(ref_index) => {
				let (prop_index, _, _) = public_props.remove(winner);
				if let Some((depositor, deposit)) = Self::DEPOSIT_OF.take(storage, &prop_index) {
					log::trace!(
						target: LOG_TARGET,
						"deposit {:?} of {:?} released",
						deposit,
						depositor,
					);
				}
				Self::PUBLIC_PROPS.put(storage, &public_props);
				log::debug!(
					target: LOG_TARGET,
					"proposal {} launched as referendum {}, ending at {}",
					prop_index,
					ref_index,
					end,
				);
			},
			Err(e) => log::warn!(target: LOG_TARGET, "launch at block {} failed: {}", now, e),
		}
		Some(scan)
	}

	/// Tally every referendum ending at or before `now`.
	///
	/// Returns the number of referenda baked.
	pub fn bake_referenda(&self, storage: &mut dyn Storage, now: BlockNumber) -> u32 {
		let count = Self::referendum_count(storage);
		let mut index = Self::lowest_unbaked(storage);
		let mut baked = 0u32;

		while index < count {
			match Self::referendum_info(storage, index) {
				Some(ReferendumInfo::Ongoing(status)) if status.end <= now => {
					let approved = status.tally.approved();
					if approved {
						let when = now.saturating_add(self.config.enactment_period);
						Self::DISPATCH_QUEUE.mutate(storage, |queue| {
							queue.push((when, status.proposal, index))
						});
					}
					Self::REFERENDUM_INFO_OF.insert(
						storage,
						&index,
						&ReferendumInfo::Finished { approved, end: now },
					);
					log::debug!(
						target: LOG_TARGET,
						"referendum {} {}",
						index,
						if approved { "passed" } else { "failed" },
					);
					baked += 1;
				},
				Some(ReferendumInfo::Finished { .. }) => {},
				_ => break,
			}
			index += 1;
		}

		if baked > 0 {
			Self::LOWEST_UNBAKED.put(storage, &index);
		}
		if baked > self.config.max_referenda {
			log::warn!(
				target: LOG_TARGET,
				"{} referenda baked at block {}, more than the benchmarked {}",
				baked,
				now,
				self.config.max_referenda,
			);
		}
		baked
	}

	/// Launch if it is time to, then bake whatever matured.
	pub fn step(&self, now: BlockNumber, storage: &mut dyn Storage) -> TallyReport {
		let launch = if self.is_launch_block(now) { self.launch_next(storage, now) } else { None };
		let baked = self.bake_referenda(storage, now);
		TallyReport { launch, baked }
	}

	pub fn branch_weight(&self, branch: &TallyBranch) -> Weight {
		match branch {
			TallyBranch::Idle => self.weights.on_initialize_base(),
			TallyBranch::Launch(scan) => self.weights.launch_next(scan.referenda, scan.proposals),
			TallyBranch::Bake(k) => self.weights.bake_referenda(*k),
		}
	}

	/// The weight of a block in which the hook did what `report` says.
	pub fn report_weight(&self, report: &TallyReport) -> Weight {
		report
			.branches()
			.iter()
			.map(|b| self.branch_weight(b))
			.fold(Weight::zero(), Weight::saturating_add)
	}
}

impl<T: Config> OnInitialize for Pallet<T> {
	fn name(&self) -> &'static str {
		"ReferendumTally"
	}

	fn on_initialize(&self, now: BlockNumber, storage: &mut dyn Storage) -> Weight {
		let report = self.step(now, storage);
		let weight = self.report_weight(&report);
		log::trace!(target: LOG_TARGET, "block {}: {:?} weighs {:?}", now, report, weight);
		weight
	}

	fn idle_weight(&self) -> Weight {
		self.branch_weight(&TallyBranch::Idle)
	}
}
