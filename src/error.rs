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

//! Error types for job ledger operations.

use crate::base::{JobId, Role};
use crate::notify::NotificationKind;
use crate::store::StorageError;
use thiserror::Error;

/// Job ledger operation errors.
///
/// Validation errors (`MissingCustomerName`, `NegativeAmount`,
/// `MissingProductField`) are raised before any write; everything else aborts
/// the single operation that hit it. Notification failures are deliberately
/// not part of this enum: a failed dispatch never undoes a committed write, so
/// it travels inside the successful outcome as a [`NotificationFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// Customer name missing or blank
    #[error("customer name is required")]
    MissingCustomerName,

    /// Total cost or advance below zero
    #[error("amount must not be negative")]
    NegativeAmount,

    /// Referenced job no longer exists (e.g. concurrent delete)
    #[error("job not found")]
    JobNotFound,

    /// Draft referenced a catalog code with no catalog entry
    #[error("product not found")]
    ProductNotFound,

    /// Operation targeted a job that already reached the terminal state
    #[error("job is already completed")]
    AlreadyCompleted,

    /// Transition valid only from `Pending`
    #[error("job is not pending")]
    NotPending,

    /// Caller role lacks permission for this operation
    #[error("{0} role may not perform this operation")]
    Forbidden(Role),

    /// Catalog entry missing its code, name, or price
    #[error("product code, name, and price are required")]
    MissingProductField,

    /// Catalog code already in use (codes are case-insensitive)
    #[error("product code is already in use")]
    DuplicateProductCode,

    /// ID allocation kept conflicting until the retry budget ran out.
    /// Not expected under normal load; the allocator retries internally.
    #[error("job id allocation conflict")]
    AllocationConflict,

    /// Storage write/read failure; the operation changed nothing
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Non-fatal record of a dispatch the mailer rejected.
///
/// The owning job's state write had already committed when this was produced;
/// callers surface it as a "saved, but notification failed" warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} notification for job {job_id} failed: {reason}")]
pub struct NotificationFailure {
    pub kind: NotificationKind,
    pub job_id: JobId,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            JobError::MissingCustomerName.to_string(),
            "customer name is required"
        );
        assert_eq!(
            JobError::NegativeAmount.to_string(),
            "amount must not be negative"
        );
        assert_eq!(JobError::JobNotFound.to_string(), "job not found");
        assert_eq!(JobError::ProductNotFound.to_string(), "product not found");
        assert_eq!(
            JobError::AlreadyCompleted.to_string(),
            "job is already completed"
        );
        assert_eq!(JobError::NotPending.to_string(), "job is not pending");
        assert_eq!(
            JobError::Forbidden(Role::Staff).to_string(),
            "staff role may not perform this operation"
        );
        assert_eq!(
            JobError::AllocationConflict.to_string(),
            "job id allocation conflict"
        );
    }

    #[test]
    fn notification_failure_names_kind_and_job() {
        let failure = NotificationFailure {
            kind: NotificationKind::Receipt,
            job_id: JobId::from_sequence(7),
            reason: "smtp timeout".into(),
        };
        assert_eq!(
            failure.to_string(),
            "RECEIPT notification for job SC-0007 failed: smtp timeout"
        );
    }

    #[test]
    fn errors_are_cloneable() {
        let error = JobError::AlreadyCompleted;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
