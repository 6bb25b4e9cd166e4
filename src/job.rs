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

//! Job records, form inputs, and document normalization.
//!
//! Jobs follow a state machine:
//! - [`Pending`] → [`Ready`] (via mark-ready)
//! - [`Pending`] or [`Ready`] → [`Completed`] (via complete, terminal)
//!
//! Stored documents drifted across several schema generations (early records
//! used `name`/`email`/`phone`, predate `balancePayMethod`, and carry
//! backend-native timestamp objects). All of that drift is absorbed in one
//! place, [`Job::from_document`]; the rest of the crate only ever sees the
//! canonical shape.
//!
//! [`Pending`]: JobStatus::Pending
//! [`Ready`]: JobStatus::Ready
//! [`Completed`]: JobStatus::Completed

use crate::base::JobId;
use crate::error::JobError;
use crate::store::Document;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Ready,
    Completed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Ready => "Ready",
            JobStatus::Completed => "Completed",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "ready" => Some(JobStatus::Ready),
            "completed" => Some(JobStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a payment was collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PayMethod {
    #[default]
    Cash,
    Card,
}

impl PayMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PayMethod::Cash => "Cash",
            PayMethod::Card => "Card",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cash" => Some(PayMethod::Cash),
            "card" => Some(PayMethod::Card),
            _ => None,
        }
    }
}

impl fmt::Display for PayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One customer order, tracked from intake to payment completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Snapshot of the catalog item at create/edit time, not a live
    /// reference. `None` on self-registered jobs awaiting staff details.
    pub product_code: Option<String>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub total_cost: Decimal,
    /// Amount collected up front.
    pub advance: Decimal,
    /// Persisted `total_cost - advance`; forced to zero at completion.
    pub balance: Decimal,
    /// Method of the advance payment.
    pub pay_method: PayMethod,
    /// Method of the final balance payment, recorded at completion only.
    pub balance_pay_method: Option<PayMethod>,
    pub status: JobStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether the job was self-registered by a customer and still needs
    /// staff to attach product and pricing. A presentation condition, not a
    /// stored state; it never gates what the engine mechanically allows.
    pub fn needs_details(&self) -> bool {
        self.product_code.is_none() || self.total_cost == Decimal::ZERO
    }

    /// The amount collected at completion time: the balance that was due
    /// before it got zeroed. Overpaid jobs settle nothing extra.
    pub fn settled_balance(&self) -> Decimal {
        (self.total_cost - self.advance).max(Decimal::ZERO)
    }

    /// Normalizes a stored document into the canonical job shape.
    ///
    /// Total: legacy and malformed fields degrade to defaults rather than
    /// failing, per the projection's tolerance requirements.
    pub fn from_document(id: JobId, doc: &Document) -> Job {
        let total_cost = amount_field(doc, "totalCost");
        let advance = amount_field(doc, "advance");
        // Records predating the balance field derive it.
        let balance = if doc.get("balance").is_some() {
            amount_field(doc, "balance")
        } else {
            total_cost - advance
        };

        let created_at = timestamp_field(doc, "createdAt").unwrap_or(DateTime::UNIX_EPOCH);
        let due_date = str_field(doc, &["dueDate"])
            .and_then(|s| s.parse::<NaiveDate>().ok())
            .unwrap_or_else(|| created_at.date_naive());

        Job {
            id,
            customer_name: str_field(doc, &["customerName", "name"]).unwrap_or_default(),
            customer_email: str_field(doc, &["customerEmail", "email"]),
            customer_phone: str_field(doc, &["customerPhone", "phone"]),
            product_code: str_field(doc, &["productCode"]),
            product_name: str_field(doc, &["productName"]),
            description: str_field(doc, &["description"]),
            total_cost,
            advance,
            balance,
            pay_method: str_field(doc, &["payMethod"])
                .and_then(|s| PayMethod::parse(&s))
                .unwrap_or_default(),
            balance_pay_method: str_field(doc, &["balancePayMethod"])
                .and_then(|s| PayMethod::parse(&s)),
            status: str_field(doc, &["status"])
                .and_then(|s| JobStatus::parse(&s))
                .unwrap_or(JobStatus::Pending),
            due_date,
            created_at,
            completed_at: timestamp_field(doc, "completedAt"),
        }
    }

    /// Serializes the canonical camelCase schema. Amounts are written as
    /// strings (decimal-exact), timestamps as RFC 3339.
    pub fn to_document(&self) -> Document {
        json!({
            "customerName": self.customer_name,
            "customerEmail": self.customer_email,
            "customerPhone": self.customer_phone,
            "productCode": self.product_code,
            "productName": self.product_name,
            "description": self.description,
            "totalCost": self.total_cost,
            "advance": self.advance,
            "balance": self.balance,
            "payMethod": self.pay_method,
            "balancePayMethod": self.balance_pay_method,
            "status": self.status,
            "dueDate": self.due_date,
            "createdAt": self.created_at.to_rfc3339(),
            "completedAt": self.completed_at.map(|t| t.to_rfc3339()),
        })
    }
}

/// Staff-entered job details from the create/edit form.
///
/// Field coercion mirrors the form: missing amounts read as zero, a missing
/// due date becomes today, a missing product selection falls back to the
/// synthetic custom entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDraft {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Catalog code of the selected product; `None` for a custom job.
    pub product_code: Option<String>,
    pub description: Option<String>,
    /// Manual override; `None` takes the catalog price.
    pub total_cost: Option<Decimal>,
    pub advance: Option<Decimal>,
    pub pay_method: PayMethod,
    pub due_date: Option<NaiveDate>,
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.customer_name.trim().is_empty() {
            return Err(JobError::MissingCustomerName);
        }
        if self.total_cost.is_some_and(|v| v < Decimal::ZERO)
            || self.advance.is_some_and(|v| v < Decimal::ZERO)
        {
            return Err(JobError::NegativeAmount);
        }
        Ok(())
    }
}

/// Minimal fields from the public customer self-intake form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntakeForm {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

impl IntakeForm {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.customer_name.trim().is_empty() {
            return Err(JobError::MissingCustomerName);
        }
        Ok(())
    }
}

/// First non-blank string among the given keys.
pub(crate) fn str_field(doc: &Document, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        doc.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    })
}

/// Numeric field tolerant of legacy encodings: JSON numbers, numeric strings,
/// or nothing at all (reads as zero).
pub(crate) fn amount_field(doc: &Document, key: &str) -> Decimal {
    match doc.get(key) {
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Timestamp field accepting RFC 3339 strings, bare Unix seconds, and the
/// backend-native `{"seconds": n}` object shape.
fn timestamp_field(doc: &Document, key: &str) -> Option<DateTime<Utc>> {
    match doc.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|s| Utc.timestamp_opt(s, 0).single()),
        Value::Object(map) => map
            .get("seconds")
            .and_then(Value::as_i64)
            .and_then(|s| Utc.timestamp_opt(s, 0).single()),
        _ => None,
    }
}
