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

//! Outbound notification dispatch.
//!
//! Lifecycle transitions translate into at most one message request to the
//! external mailer. Dispatch is awaited but never load-bearing: a rejected
//! send is reported back as a warning while the committed job state stands.

use crate::base::JobId;
use crate::job::Job;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

/// The lifecycle event a message announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// Job created or its details updated; carries a receipt.
    JobUpdated,
    /// Work finished, awaiting collection; no attachment.
    ReadyNotify,
    /// Final receipt after completion.
    Receipt,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::JobUpdated => "JOB_UPDATED",
            NotificationKind::ReadyNotify => "READY_NOTIFY",
            NotificationKind::Receipt => "RECEIPT",
        }
    }

    /// Kinds that carry a rendered receipt document.
    pub fn wants_attachment(self) -> bool {
        matches!(self, NotificationKind::JobUpdated | NotificationKind::Receipt)
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One outbound message request handed to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient_name: String,
    pub recipient_email: String,
    pub job_id: JobId,
    /// Rendered receipt document, present for kinds that want one.
    pub attachment: Option<Vec<u8>>,
}

/// Transport-level failure reported by a mailer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SendError(pub String);

/// External mailer collaborator.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), SendError>;
}

/// External receipt renderer collaborator: a pure function of the job record.
pub trait ReceiptRenderer: Send + Sync {
    fn render(&self, job: &Job) -> Vec<u8>;
}

/// Notifier that accepts everything and sends nothing.
///
/// For batch runs, benchmarks, and demos where no mailer is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, notification: &Notification) -> Result<(), SendError> {
        tracing::debug!(
            kind = %notification.kind,
            job = %notification.job_id,
            "dropping notification (null notifier)"
        );
        Ok(())
    }
}

/// Plain-text receipt renderer.
///
/// Carries the content of the studio's printed receipt (bill-to block,
/// receipt number, line item, advance, balance due) without any page layout.
#[derive(Debug, Clone, Default)]
pub struct TextReceipt {
    pub studio_name: String,
    pub address: String,
    pub phone: String,
}

impl TextReceipt {
    pub fn new(
        studio_name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        TextReceipt {
            studio_name: studio_name.into(),
            address: address.into(),
            phone: phone.into(),
        }
    }
}

impl ReceiptRenderer for TextReceipt {
    fn render(&self, job: &Job) -> Vec<u8> {
        let mut out = String::new();
        if !self.studio_name.is_empty() {
            let _ = writeln!(out, "{}", self.studio_name);
        }
        if !self.address.is_empty() {
            let _ = writeln!(out, "{}", self.address);
        }
        if !self.phone.is_empty() {
            let _ = writeln!(out, "{}", self.phone);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "OFFICIAL RECEIPT");
        let _ = writeln!(out);
        let _ = writeln!(out, "BILL TO: {}", job.customer_name);
        if let Some(phone) = &job.customer_phone {
            let _ = writeln!(out, "         {phone}");
        }
        let _ = writeln!(out, "RECEIPT #: {}", job.id);
        let _ = writeln!(out, "DATE: {}", job.created_at.date_naive());
        let _ = writeln!(out, "DUE DATE: {}", job.due_date);
        let _ = writeln!(out);
        let description = job.product_name.as_deref().unwrap_or("Service");
        let _ = writeln!(out, "{description}  {:.2}", job.total_cost);
        let _ = writeln!(out, "Sub Total: {:.2}", job.total_cost);
        let _ = writeln!(out, "Advance Paid: -{:.2}", job.advance);
        if job.balance > rust_decimal::Decimal::ZERO {
            let _ = writeln!(out, "BALANCE DUE: {:.2}", job.balance);
        } else {
            let _ = writeln!(out, "FULLY PAID");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Thank you for your business!");
        out.into_bytes()
    }
}
