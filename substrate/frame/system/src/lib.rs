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

//! # Block System
//!
//! The block system provides the low-level pieces every other crate in the block pipeline
//! builds upon:
//!
//! - [`DispatchClass`] and [`PerDispatchClass`]: the priority tiers work is accounted under.
//! - [`limits::BlockLimits`]: the immutable, validated weight limits of a block.
//! - [`BlockBudget`]: the block-scoped running total of consumed weight, per class.
//! - [`Storage`] and the typed [`StorageValue`]/[`StorageMap`] accessors: chain state as seen by
//!   hooks, with an [`OverlayedStorage`] that lets a rejected block leave no trace.
//! - [`OnInitialize`]: the contract every initialization hook implements.
//!
//! ## Accounting rules
//!
//! Consumption only ever increases during a block. A reservation either fits (both within the
//! whole block's `max_block` and within the class's own cap) and is committed in full, or it is
//! refused without any change to the budget. What a refusal *means* is decided by the caller:
//! for `Mandatory` work it invalidates the block, for everything else it only defers the item.

mod budget;
mod dispatch;
mod hooks;
pub mod limits;
mod storage;

pub use budget::{BlockBudget, BudgetExceeded, BudgetSnapshot, Charge, ChargeSource};
pub use dispatch::{DispatchClass, DispatchInfo, GetDispatchInfo, OneOrMany, PerDispatchClass};
pub use hooks::OnInitialize;
pub use limits::{BlockLimits, ConfigurationError};
pub use sp_hook_weights::Weight;
pub use storage::{InMemoryStorage, OverlayedStorage, Storage, StorageMap, StorageValue};

/// Block number type used throughout the pipeline.
pub type BlockNumber = u32;

/// A type that can be kept in chain storage and compared, e.g. a validator id or a session key.
pub trait Member: Clone + Eq + core::fmt::Debug + codec::Codec + 'static {}
impl<T: Clone + Eq + core::fmt::Debug + codec::Codec + 'static> Member for T {}

pub(crate) const LOG_TARGET: &str = "runtime::system";
