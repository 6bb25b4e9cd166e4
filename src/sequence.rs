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

//! Sequential job ID allocation.
//!
//! IDs are minted from a single shared counter document inside the storage
//! layer's atomic primitive. A plain read-then-write would hand out duplicate
//! IDs whenever two staff members create jobs at the same moment; the
//! read-modify-write here commits or retries as one unit, so every caller
//! gets a distinct, densely sequential value.

use crate::base::JobId;
use crate::error::JobError;
use crate::store::{Storage, StorageError};
use serde_json::{Value, json};

/// Collection holding the counter document.
pub const COUNTERS: &str = "counters";
/// The one counter record the allocator owns.
pub const JOB_COUNTER: &str = "jobCounter";

/// Allocates the next job identifier.
///
/// A missing counter document reads as zero, so the first allocation on a
/// fresh store yields `SC-0001`.
///
/// # Errors
///
/// [`JobError::AllocationConflict`] if the storage layer exhausted its retry
/// budget (not expected under normal load); [`JobError::Storage`] for backend
/// failures.
pub fn allocate(store: &impl Storage) -> Result<JobId, JobError> {
    let mut issued = 0u64;
    let result = store.atomic(&mut |txn| {
        let current = txn
            .get(COUNTERS, JOB_COUNTER)?
            .and_then(|doc| doc.get("current").and_then(Value::as_u64))
            .unwrap_or(0);
        issued = current + 1;
        txn.set(COUNTERS, JOB_COUNTER, json!({ "current": issued }));
        Ok(())
    });

    match result {
        Ok(()) => Ok(JobId::from_sequence(issued)),
        Err(StorageError::Conflict(_)) => Err(JobError::AllocationConflict),
        Err(err) => Err(JobError::Storage(err)),
    }
}
