// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Studio Ledger Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Studio Ledger
//!
//! This library provides the order-tracking engine of a small photo studio:
//! jobs move through a `Pending` -> `Ready` -> `Completed` lifecycle, carry a
//! running ledger of total, advance, and balance amounts, and trigger customer
//! notifications as they transition.
//!
//! ## Core Components
//!
//! - [`JobLedger`]: Central engine applying lifecycle operations to jobs
//! - [`Job`]: One customer order with its financial and status fields
//! - [`MemoryStore`]: In-process document store with atomic transactions
//! - [`Stats`]: Income and outstanding-balance aggregates over all jobs
//! - [`JobError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use studio_ledger_rs::{Actor, JobDraft, JobLedger, MemoryStore, NullNotifier, TextReceipt};
//! use rust_decimal_macros::dec;
//!
//! let ledger = JobLedger::new(MemoryStore::new(), NullNotifier, TextReceipt::default());
//! let admin = Actor::admin("owner");
//!
//! // Create a job with a 500 advance against a 2000 total
//! let draft = JobDraft {
//!     customer_name: "Asha Rao".into(),
//!     total_cost: Some(dec!(2000)),
//!     advance: Some(dec!(500)),
//!     ..Default::default()
//! };
//! let saved = ledger.create(&admin, &draft, false).unwrap();
//!
//! assert_eq!(saved.job.id.as_str(), "SC-0001");
//! assert_eq!(saved.job.balance, dec!(1500));
//! ```
//!
//! ## Thread Safety
//!
//! Receipt IDs are allocated inside a storage transaction, so concurrent
//! creations always receive dense, unique `SC-####` numbers. Everything else
//! is last-write-wins, which is the right trade for a single-studio workload.

mod base;
pub mod catalog;
mod engine;
pub mod error;
mod job;
pub mod notify;
mod sequence;
pub mod stats;
pub mod store;

pub use base::{Actor, JobId, Role};
pub use catalog::{Catalog, Product};
pub use engine::{JobFeed, JobLedger, Notified, Saved, JOBS};
pub use error::{JobError, NotificationFailure};
pub use job::{IntakeForm, Job, JobDraft, JobStatus, PayMethod};
pub use notify::{
    Notification, NotificationKind, Notifier, NullNotifier, ReceiptRenderer, SendError,
    TextReceipt,
};
pub use sequence::allocate;
pub use store::{Document, MemoryStore, Storage, StorageError, StorageTxn};
pub use stats::{Stats, StatusCounts};
