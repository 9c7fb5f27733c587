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

//! # Session Rotation Pallet
//!
//! Rotates the validator set at session boundaries and reports, as an initialization hook, the
//! weight of the work it actually did.
//!
//! ## Overview
//!
//! - **Session:** a period of time with a constant set of validators. Whether a block ends the
//!   current session is decided by a [`ShouldEndSession`] implementation; [`PeriodicSessions`]
//!   provides fixed-length sessions.
//! - **Session keys:** set with [`Pallet::set_keys`] for use not in the next session, but the one
//!   after. They are kept in `NextKeys` until the validator is queued.
//! - **Rotation:** at the start of every block the pallet asks [`ShouldEndSession`]. If the
//!   session ends, the queued validators and keys become active, the [`SessionManager`] is asked
//!   for the next set, and that set is queued together with its keys. The [`SessionHandler`]
//!   is told about both.
//!
//! ## Weight
//!
//! A block that does not end a session costs the `should_end_session` check alone. A block that
//! does is charged the check, `rotate_session(v, n, q, c)` and
//! [`SessionRotationConfig::handler_weight_per_validator`] for every activated validator. The
//! rotation cost is charged in full even if the new set turns out identical to the old one.
//! Every candidate offered by the [`SessionManager`] costs a `NextKeys` lookup, so `n` counts
//! candidates that end up not queued for lack of keys as well.
//! Validator counts above [`SessionRotationConfig::max_validators`] are reported as they are,
//! never clamped.

#[cfg(test)]
mod mock;
pub mod weights;

pub use weights::{TableWeights, WeightInfo};

use frame_block_system::{
	BlockNumber, ConfigurationError, DispatchClass, DispatchInfo, Member, OnInitialize, Storage,
	StorageMap, StorageValue,
};
use serde::{Deserialize, Serialize};
use sp_hook_weights::Weight;
use std::{collections::BTreeMap, marker::PhantomData};

/// Simple index type with which we can count sessions.
pub type SessionIndex = u32;

const LOG_TARGET: &str = "runtime::session-rotation";

/// Decides whether the session should be ended.
pub trait ShouldEndSession {
	/// Return `true` if the session should be ended.
	fn should_end_session(&self, now: BlockNumber) -> bool;
}

/// Ends the session every `period` blocks, starting at block `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PeriodicSessions {
	pub period: BlockNumber,
	pub offset: BlockNumber,
}

impl ShouldEndSession for PeriodicSessions {
	fn should_end_session(&self, now: BlockNumber) -> bool {
		now >= self.offset && (now - self.offset).checked_rem(self.period) == Some(0)
	}
}

/// A trait for managing creation of new validator set.
pub trait SessionManager<ValidatorId> {
	/// Plan a new session, and optionally provide the new validator set.
	///
	/// Even if the validator-set is the same as before, if any underlying economic conditions
	/// have changed, the new validator set must be returned. The returned validator set, if
	/// any, will not be applied until `new_index`. `new_index` is strictly greater than from
	/// previous call.
	fn new_session(new_index: SessionIndex) -> Option<Vec<ValidatorId>>;
	/// End the session.
	fn end_session(end_index: SessionIndex);
	/// Start an already planned session.
	fn start_session(start_index: SessionIndex);
}

impl<A> SessionManager<A> for () {
	fn new_session(_: SessionIndex) -> Option<Vec<A>> {
		None
	}
	fn end_session(_: SessionIndex) {}
	fn start_session(_: SessionIndex) {}
}

/// Handler for session life cycle events.
///
/// Handlers are external to this pallet; their cost is accounted for through
/// [`SessionRotationConfig::handler_weight_per_validator`].
pub trait SessionHandler<ValidatorId, Keys> {
	/// The given validator set will be used for the genesis session.
	fn on_genesis_session(validators: &[(ValidatorId, Keys)]);

	/// Session set has changed; act appropriately.
	///
	/// `changed` is true whenever any of the session keys or underlying economic
	/// identities or weightings behind those keys has changed.
	fn on_new_session(
		changed: bool,
		validators: &[(ValidatorId, Keys)],
		queued_validators: &[(ValidatorId, Keys)],
	);

	/// A notification for end of the session.
	fn on_before_session_ending() {}
}

#[impl_trait_for_tuples::impl_for_tuples(30)]
impl<AId, Ks> SessionHandler<AId, Ks> for Tuple {
	fn on_genesis_session(validators: &[(AId, Ks)]) {
		for_tuples!( #( Tuple::on_genesis_session(validators); )* )
	}

	fn on_new_session(changed: bool, validators: &[(AId, Ks)], queued_validators: &[(AId, Ks)]) {
		for_tuples!( #( Tuple::on_new_session(changed, validators, queued_validators); )* )
	}

	fn on_before_session_ending() {
		for_tuples!( #( Tuple::on_before_session_ending(); )* )
	}
}

/// Types the pallet is generic over.
pub trait Config: 'static {
	/// A stable ID for a validator.
	type ValidatorId: Member + Ord;
	/// The session keys of a validator.
	type Keys: Member;
	/// Handler for managing new session.
	type SessionManager: SessionManager<Self::ValidatorId>;
	/// Handler when a session has changed.
	type SessionHandler: SessionHandler<Self::ValidatorId, Self::Keys>;
	/// Indicator for when to end the session.
	type ShouldEndSession: ShouldEndSession;
	/// Weight information for the operations of this pallet.
	type WeightInfo: WeightInfo;
}

/// Deployment specific bounds and costs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionRotationConfig {
	/// The number of validators the rotation was benchmarked for.
	pub max_validators: u32,
	/// Upper bound of what the session handlers spend per activated validator.
	#[serde(default, with = "sp_hook_weights::serde_helpers::weight")]
	pub handler_weight_per_validator: Weight,
}

impl SessionRotationConfig {
	pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
		serde_json::from_str(json).map_err(|e| ConfigurationError::Malformed(e.to_string()))
	}
}

/// Errors of the key management calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// The keys are already registered by another validator.
	#[error("registered duplicate key")]
	DuplicatedKey,
	/// No keys are associated with this account.
	#[error("no associated keys")]
	NoKeys,
}

/// The branch the hook took in a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionBranch {
	/// The session goes on; only the check was made.
	NoRotation,
	/// The session ended and validators were rotated.
	Rotate(Rotation),
}

/// Sizes of the data touched by a rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rotation {
	/// Validators of the session that became active.
	pub validators: u32,
	/// Candidates for the session after, each looked up in `NextKeys`.
	pub candidates: u32,
	/// Validators queued for the session after.
	pub queued: u32,
	/// Queued validators whose keys differ from the ones they had in the active set.
	pub keys_changed: u32,
}

/// Genesis state of the pallet.
pub struct GenesisConfig<T: Config> {
	pub keys: Vec<(T::ValidatorId, T::Keys)>,
}

impl<T: Config> GenesisConfig<T> {
	pub fn build(&self, storage: &mut dyn Storage) {
		for (who, keys) in &self.keys {
			if Pallet::<T>::KEY_OWNER.contains_key(storage, keys) {
				log::warn!(
					target: LOG_TARGET,
					"genesis keys of {:?} are a duplicate, skipped",
					who,
				);
				continue
			}
			Pallet::<T>::NEXT_KEYS.insert(storage, who, keys);
			Pallet::<T>::KEY_OWNER.insert(storage, keys, who);
		}

		let initial_validators_0 = T::SessionManager::new_session(0)
			.unwrap_or_else(|| self.keys.iter().map(|(who, _)| who.clone()).collect());
		let initial_validators_1 =
			T::SessionManager::new_session(1).unwrap_or_else(|| initial_validators_0.clone());
		let queued_keys: Vec<_> = initial_validators_1
			.into_iter()
			.filter_map(|v| Pallet::<T>::load_keys(storage, &v).map(|k| (v, k)))
			.collect();

		// Tell everyone about the genesis session keys
		T::SessionHandler::on_genesis_session(&queued_keys);

		Pallet::<T>::VALIDATORS.put(storage, &initial_validators_0);
		Pallet::<T>::QUEUED_KEYS.put(storage, &queued_keys);
		T::SessionManager::start_session(0);
	}
}

/// The session rotation hook.
pub struct Pallet<T: Config> {
	should_end_session: T::ShouldEndSession,
	weights: T::WeightInfo,
	config: SessionRotationConfig,
	_phantom: PhantomData<T>,
}

impl<T: Config> Pallet<T> {
	/// Current index of the session.
	pub const CURRENT_INDEX: StorageValue<SessionIndex> =
		StorageValue::new(b"Session::CurrentIndex");
	/// The current set of validators.
	pub const VALIDATORS: StorageValue<Vec<T::ValidatorId>> =
		StorageValue::new(b"Session::Validators");
	/// The queued keys for the next session. When the next session begins, these keys will be
	/// used to determine the validator's session keys.
	pub const QUEUED_KEYS: StorageValue<Vec<(T::ValidatorId, T::Keys)>> =
		StorageValue::new(b"Session::QueuedKeys");
	/// True if the underlying economic identities or weighting behind the validators has
	/// changed in the queued validator set.
	pub const QUEUED_CHANGED: StorageValue<bool> = StorageValue::new(b"Session::QueuedChanged");
	/// The next session keys for a validator.
	pub const NEXT_KEYS: StorageMap<T::ValidatorId, T::Keys> =
		StorageMap::new(b"Session::NextKeys");
	/// The owner of a key.
	pub const KEY_OWNER: StorageMap<T::Keys, T::ValidatorId> =
		StorageMap::new(b"Session::KeyOwner");

	pub fn new(
		should_end_session: T::ShouldEndSession,
		weights: T::WeightInfo,
		config: SessionRotationConfig,
	) -> Self {
		Self { should_end_session, weights, config, _phantom: PhantomData }
	}

	pub fn current_index(storage: &dyn Storage) -> SessionIndex {
		Self::CURRENT_INDEX.get_or_default(storage)
	}

	pub fn validators(storage: &dyn Storage) -> Vec<T::ValidatorId> {
		Self::VALIDATORS.get_or_default(storage)
	}

	pub fn queued_keys(storage: &dyn Storage) -> Vec<(T::ValidatorId, T::Keys)> {
		Self::QUEUED_KEYS.get_or_default(storage)
	}

	pub fn queued_changed(storage: &dyn Storage) -> bool {
		Self::QUEUED_CHANGED.get_or_default(storage)
	}

	pub fn load_keys(storage: &dyn Storage, who: &T::ValidatorId) -> Option<T::Keys> {
		Self::NEXT_KEYS.get(storage, who)
	}

	/// Sets the session key(s) of `who` for the session after the next one.
	pub fn set_keys(
		&self,
		storage: &mut dyn Storage,
		who: T::ValidatorId,
		keys: T::Keys,
	) -> Result<(), Error> {
		if let Some(owner) = Self::KEY_OWNER.get(storage, &keys) {
			if owner != who {
				return Err(Error::DuplicatedKey)
			}
		}
		if let Some(old) = Self::NEXT_KEYS.get(storage, &who) {
			Self::KEY_OWNER.remove(storage, &old);
		}
		Self::KEY_OWNER.insert(storage, &keys, &who);
		Self::NEXT_KEYS.insert(storage, &who, &keys);
		Ok(())
	}

	/// Removes any session key(s) of `who`.
	pub fn purge_keys(&self, storage: &mut dyn Storage, who: &T::ValidatorId) -> Result<(), Error> {
		let old = Self::NEXT_KEYS.take(storage, who).ok_or(Error::NoKeys)?;
		Self::KEY_OWNER.remove(storage, &old);
		Ok(())
	}

	pub fn set_keys_dispatch_info(&self) -> DispatchInfo {
		DispatchInfo { weight: self.weights.set_keys(), class: DispatchClass::Normal }
	}

	pub fn purge_keys_dispatch_info(&self) -> DispatchInfo {
		DispatchInfo { weight: self.weights.purge_keys(), class: DispatchClass::Normal }
	}

	/// Move on to next session. Register new validator set and session keys.
	///
	/// Returns the sizes of what was touched, for weighing.
	pub fn rotate_session(&self, storage: &mut dyn Storage) -> Rotation {
		let session_index = Self::current_index(storage);
		let changed = Self::queued_changed(storage);
		log::trace!(target: LOG_TARGET, "rotating session {:?}", session_index);

		T::SessionHandler::on_before_session_ending();
		T::SessionManager::end_session(session_index);

		// Get queued session keys and validators.
		let session_keys = Self::queued_keys(storage);
		let validators: Vec<_> = session_keys.iter().map(|(v, _)| v.clone()).collect();
		Self::VALIDATORS.put(storage, &validators);

		let session_index = session_index.saturating_add(1);
		Self::CURRENT_INDEX.put(storage, &session_index);
		T::SessionManager::start_session(session_index);

		// Get next validator set.
		let (next_validators, identities_changed) =
			match T::SessionManager::new_session(session_index.saturating_add(1)) {
				Some(next) => (next, true),
				None => (validators, false),
			};

		// Queue next session keys.
		let candidates = u32::try_from(next_validators.len()).unwrap_or(u32::MAX);
		let active: BTreeMap<&T::ValidatorId, &T::Keys> =
			session_keys.iter().map(|(v, k)| (v, k)).collect();
		let mut keys_changed = 0u32;
		let queued: Vec<(T::ValidatorId, T::Keys)> = next_validators
			.into_iter()
			.filter_map(|v| {
				let Some(keys) = Self::load_keys(storage, &v) else {
					log::debug!(target: LOG_TARGET, "{:?} has no session keys, not queued", v);
					return None
				};
				if active.get(&v) != Some(&&keys) {
					keys_changed += 1;
				}
				Some((v, keys))
			})
			.collect();

		Self::QUEUED_KEYS.put(storage, &queued);
		Self::QUEUED_CHANGED.put(storage, &(identities_changed || keys_changed > 0));

		T::SessionHandler::on_new_session(changed, &session_keys, &queued);

		let rotation = Rotation {
			validators: u32::try_from(session_keys.len()).unwrap_or(u32::MAX),
			candidates,
			queued: u32::try_from(queued.len()).unwrap_or(u32::MAX),
			keys_changed,
		};
		let largest = rotation.validators.max(rotation.candidates);
		if largest > self.config.max_validators {
			log::warn!(
				target: LOG_TARGET,
				"session {} has {} validators and {} candidates, more than the benchmarked {}",
				session_index,
				rotation.validators,
				rotation.candidates,
				self.config.max_validators,
			);
		}
		rotation
	}

	/// The weight of a block in which the hook took `branch`.
	pub fn branch_weight(&self, branch: &SessionBranch) -> Weight {
		let check = self.weights.should_end_session();
		match branch {
			SessionBranch::NoRotation => check,
			SessionBranch::Rotate(r) => check
				.saturating_add(self.weights.rotate_session(
					r.validators,
					r.candidates,
					r.queued,
					r.keys_changed,
				))
				.saturating_add(
					self.config.handler_weight_per_validator.saturating_mul(r.validators as u64),
				),
		}
	}

	/// Decide whether `now` ends the session and rotate if it does.
	pub fn step(&self, now: BlockNumber, storage: &mut dyn Storage) -> SessionBranch {
		if self.should_end_session.should_end_session(now) {
			SessionBranch::Rotate(self.rotate_session(storage))
		} else {
			SessionBranch::NoRotation
		}
	}
}

impl<T: Config> OnInitialize for Pallet<T> {
	fn name(&self) -> &'static str {
		"SessionRotation"
	}

	/// Called when a block is initialized. Will rotate session if it is the last
	/// block of the current session.
	fn on_initialize(&self, now: BlockNumber, storage: &mut dyn Storage) -> Weight {
		let branch = self.step(now, storage);
		let weight = self.branch_weight(&branch);
		log::trace!(target: LOG_TARGET, "block {}: {:?} weighs {:?}", now, branch, weight);
		weight
	}

	fn idle_weight(&self) -> Weight {
		self.branch_weight(&SessionBranch::NoRotation)
	}
}
