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

//! Chain state as seen from inside block execution.
//!
//! Values are SCALE encoded under raw byte keys. Hooks use the typed [`StorageValue`] and
//! [`StorageMap`] accessors. A block works against an [`OverlayedStorage`], which buffers all
//! writes until the block is known to be valid.

use crate::LOG_TARGET;
use codec::{Decode, Encode};
use core::marker::PhantomData;
use std::collections::BTreeMap;

/// Raw key-value access to chain state.
pub trait Storage {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
	fn set(&mut self, key: &[u8], value: Vec<u8>);
	fn clear(&mut self, key: &[u8]);

	fn exists(&self, key: &[u8]) -> bool {
		self.get(key).is_some()
	}
}

/// Committed chain state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryStorage {
	inner: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl Storage for InMemoryStorage {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		self.inner.get(key).cloned()
	}

	fn set(&mut self, key: &[u8], value: Vec<u8>) {
		self.inner.insert(key.to_vec(), value);
	}

	fn clear(&mut self, key: &[u8]) {
		self.inner.remove(key);
	}
}

/// Uncommitted changes on top of an [`InMemoryStorage`].
///
/// Reads see the pending changes first. Nothing reaches the backend until [`Self::commit`];
/// dropping the overlay or calling [`Self::discard`] forgets every change.
pub struct OverlayedStorage<'a> {
	backend: &'a mut InMemoryStorage,
	changes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> OverlayedStorage<'a> {
	pub fn new(backend: &'a mut InMemoryStorage) -> Self {
		Self { backend, changes: BTreeMap::new() }
	}

	/// Number of keys with a pending change.
	pub fn pending(&self) -> usize {
		self.changes.len()
	}

	/// Write all pending changes to the backend.
	pub fn commit(self) {
		log::trace!(target: LOG_TARGET, "committing {} storage changes", self.changes.len());
		for (key, change) in self.changes {
			match change {
				Some(value) => self.backend.set(&key, value),
				None => self.backend.clear(&key),
			}
		}
	}

	/// Drop all pending changes.
	pub fn discard(self) {
		log::trace!(target: LOG_TARGET, "discarding {} storage changes", self.changes.len());
	}
}

impl Storage for OverlayedStorage<'_> {
	fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
		match self.changes.get(key) {
			Some(change) => change.clone(),
			None => self.backend.get(key),
		}
	}

	fn set(&mut self, key: &[u8], value: Vec<u8>) {
		self.changes.insert(key.to_vec(), Some(value));
	}

	fn clear(&mut self, key: &[u8]) {
		self.changes.insert(key.to_vec(), None);
	}
}

fn decode_or_log<V: Decode>(key: &[u8], raw: Vec<u8>) -> Option<V> {
	match V::decode(&mut &raw[..]) {
		Ok(value) => Some(value),
		Err(e) => {
			log::error!(
				target: LOG_TARGET,
				"corrupted value under key {}: {:?}",
				array_bytes::bytes2hex("0x", key),
				e,
			);
			None
		},
	}
}

/// A single typed value stored under a fixed key.
pub struct StorageValue<V> {
	key: &'static [u8],
	_phantom: PhantomData<V>,
}

impl<V: Encode + Decode> StorageValue<V> {
	pub const fn new(key: &'static [u8]) -> Self {
		Self { key, _phantom: PhantomData }
	}

	pub fn key(&self) -> &'static [u8] {
		self.key
	}

	/// Load the value, `None` if it is absent or cannot be decoded.
	pub fn get<S: Storage + ?Sized>(&self, storage: &S) -> Option<V> {
		storage.get(self.key).and_then(|raw| decode_or_log(self.key, raw))
	}

	pub fn put<S: Storage + ?Sized>(&self, storage: &mut S, value: &V) {
		storage.set(self.key, value.encode());
	}

	pub fn exists<S: Storage + ?Sized>(&self, storage: &S) -> bool {
		storage.exists(self.key)
	}

	/// Load the value and remove it from storage.
	pub fn take<S: Storage + ?Sized>(&self, storage: &mut S) -> Option<V> {
		let value = self.get(storage);
		storage.clear(self.key);
		value
	}

	pub fn kill<S: Storage + ?Sized>(&self, storage: &mut S) {
		storage.clear(self.key);
	}
}

impl<V: Encode + Decode + Default> StorageValue<V> {
	pub fn get_or_default<S: Storage + ?Sized>(&self, storage: &S) -> V {
		self.get(storage).unwrap_or_default()
	}

	/// Read, modify in place and write back.
	pub fn mutate<S: Storage + ?Sized, R>(
		&self,
		storage: &mut S,
		f: impl FnOnce(&mut V) -> R,
	) -> R {
		let mut value = self.get_or_default(storage);
		let result = f(&mut value);
		self.put(storage, &value);
		result
	}
}

/// Typed values keyed by `K`, stored under `prefix ++ key.encode()`.
pub struct StorageMap<K, V> {
	prefix: &'static [u8],
	_phantom: PhantomData<(K, V)>,
}

impl<K: Encode, V: Encode + Decode> StorageMap<K, V> {
	pub const fn new(prefix: &'static [u8]) -> Self {
		Self { prefix, _phantom: PhantomData }
	}

	/// The raw key `key` is stored under.
	pub fn hashed_key_for(&self, key: &K) -> Vec<u8> {
		let mut raw = self.prefix.to_vec();
		key.encode_to(&mut raw);
		raw
	}

	pub fn get<S: Storage + ?Sized>(&self, storage: &S, key: &K) -> Option<V> {
		let raw_key = self.hashed_key_for(key);
		storage.get(&raw_key).and_then(|raw| decode_or_log(&raw_key, raw))
	}

	pub fn insert<S: Storage + ?Sized>(&self, storage: &mut S, key: &K, value: &V) {
		storage.set(&self.hashed_key_for(key), value.encode());
	}

	pub fn contains_key<S: Storage + ?Sized>(&self, storage: &S, key: &K) -> bool {
		storage.exists(&self.hashed_key_for(key))
	}

	pub fn remove<S: Storage + ?Sized>(&self, storage: &mut S, key: &K) {
		storage.clear(&self.hashed_key_for(key));
	}

	pub fn take<S: Storage + ?Sized>(&self, storage: &mut S, key: &K) -> Option<V> {
		let value = self.get(storage, key);
		self.remove(storage, key);
		value
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const COUNTER: StorageValue<u32> = StorageValue::new(b"Test::Counter");
	const OWNERS: StorageMap<u32, Vec<u8>> = StorageMap::new(b"Test::Owners");

	#[test]
	fn typed_values_round_trip_through_raw_storage() {
		let mut storage = InMemoryStorage::new();
		assert_eq!(COUNTER.get(&storage), None);
		assert_eq!(COUNTER.get_or_default(&storage), 0);

		COUNTER.put(&mut storage, &41);
		let bumped = COUNTER.mutate(&mut storage, |c| {
			*c += 1;
			*c
		});
		assert_eq!(bumped, 42);
		assert_eq!(COUNTER.take(&mut storage), Some(42));
		assert!(!COUNTER.exists(&storage));
	}

	#[test]
	fn map_keys_do_not_collide() {
		let mut storage = InMemoryStorage::new();
		OWNERS.insert(&mut storage, &1, &b"alice".to_vec());
		OWNERS.insert(&mut storage, &2, &b"bob".to_vec());
		assert_eq!(OWNERS.get(&storage, &1), Some(b"alice".to_vec()));
		assert_eq!(OWNERS.get(&storage, &2), Some(b"bob".to_vec()));
		OWNERS.remove(&mut storage, &1);
		assert!(!OWNERS.contains_key(&storage, &1));
		assert_eq!(storage.len(), 1);
	}

	#[test]
	fn corrupted_value_reads_as_absent() {
		let mut storage = InMemoryStorage::new();
		storage.set(COUNTER.key(), vec![1]);
		assert_eq!(COUNTER.get(&storage), None);
	}

	#[test]
	fn overlay_commit_applies_changes() {
		let mut backend = InMemoryStorage::new();
		COUNTER.put(&mut backend, &1);
		OWNERS.insert(&mut backend, &7, &vec![7]);

		let mut overlay = OverlayedStorage::new(&mut backend);
		COUNTER.put(&mut overlay, &2);
		OWNERS.remove(&mut overlay, &7);
		assert_eq!(COUNTER.get(&overlay), Some(2));
		assert!(!OWNERS.contains_key(&overlay, &7));
		assert_eq!(overlay.pending(), 2);
		overlay.commit();

		assert_eq!(COUNTER.get(&backend), Some(2));
		assert!(!OWNERS.contains_key(&backend, &7));
	}

	#[test]
	fn overlay_discard_leaves_backend_untouched() {
		let mut backend = InMemoryStorage::new();
		COUNTER.put(&mut backend, &1);
		let before = backend.clone();

		let mut overlay = OverlayedStorage::new(&mut backend);
		COUNTER.put(&mut overlay, &5);
		OWNERS.insert(&mut overlay, &3, &vec![3]);
		overlay.discard();

		assert_eq!(backend, before);
	}
}
