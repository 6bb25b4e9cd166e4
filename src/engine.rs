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

//! Job lifecycle engine.
//!
//! The [`JobLedger`] is the central component: it validates and applies every
//! state-changing operation on jobs, allocates receipt IDs, keeps the ledger
//! arithmetic consistent, and dispatches notifications as side effects of
//! transitions.
//!
//! # Operations
//!
//! | Operation | Roles | Valid from | Notification |
//! |-----------|-------|------------|--------------|
//! | `register` | public intake | — | none |
//! | `create` | admin | — | `JOB_UPDATED` (opt-in) |
//! | `update` | staff, admin | not `Completed` | `JOB_UPDATED` (opt-in) |
//! | `mark_ready` | staff, admin | `Pending` | `READY_NOTIFY` |
//! | `complete` | admin | `Pending`, `Ready` | `RECEIPT` |
//! | `delete` | admin | any | none |
//!
//! # Concurrency
//!
//! Only ID allocation needs true concurrency safety and runs inside the
//! storage layer's atomic primitive. Edits to one job by two staff members
//! are last-write-wins, matching the storage layer's semantics; a
//! low-concurrency single-studio deployment accepts that, and the engine does
//! not pretend otherwise.

use crate::base::{Actor, JobId};
use crate::catalog::Catalog;
use crate::error::{JobError, NotificationFailure};
use crate::job::{IntakeForm, Job, JobDraft, JobStatus, PayMethod};
use crate::notify::{Notification, NotificationKind, Notifier, ReceiptRenderer};
use crate::sequence;
use crate::stats::{self, Stats, StatusCounts};
use crate::store::{Document, Storage};
use chrono::{NaiveDate, Utc};
use crossbeam::channel::Receiver;
use rust_decimal::Decimal;

/// Collection holding job documents, keyed by job ID.
pub const JOBS: &str = "jobs";

/// Synthetic catalog snapshot for jobs without a catalog selection.
const CUSTOM_CODE: &str = "CUST";
const CUSTOM_NAME: &str = "Custom";

/// Outcome of a state-changing operation: the committed job plus what became
/// of its notification. Callers distinguish plain success, success with a
/// notification warning, and (via [`JobError`]) rejected or failed writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub job: Job,
    pub notification: Notified,
}

/// What happened to the notification tied to a lifecycle write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notified {
    /// Dispatch was attempted and the mailer accepted it.
    Sent(NotificationKind),
    /// No dispatch: not requested, or the job carries no customer email.
    /// Deliberate no-op, never an error.
    Skipped,
    /// The state write committed but the mailer rejected the send.
    Failed(NotificationFailure),
}

/// Fields a draft resolves to once the catalog snapshot is taken.
struct DraftFields {
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    product_code: String,
    product_name: String,
    description: Option<String>,
    total_cost: Decimal,
    advance: Decimal,
    pay_method: PayMethod,
    due_date: NaiveDate,
}

/// The job ledger engine.
///
/// Generic over its three external collaborators: the document store, the
/// mailer, and the receipt renderer. All operations are synchronous from the
/// caller's point of view; notification dispatch is awaited and its failure
/// folded into the returned [`Saved`] outcome rather than thrown.
pub struct JobLedger<S, N, R> {
    store: S,
    notifier: N,
    renderer: R,
}

impl<S, N, R> JobLedger<S, N, R>
where
    S: Storage,
    N: Notifier,
    R: ReceiptRenderer,
{
    pub fn new(store: S, notifier: N, renderer: R) -> Self {
        JobLedger {
            store,
            notifier,
            renderer,
        }
    }

    /// The underlying document store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The mailer this engine dispatches through.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Catalog view over the same store.
    pub fn catalog(&self) -> Catalog<'_, S> {
        Catalog::new(&self.store)
    }

    /// Registers a job from the public customer intake form.
    ///
    /// Minimal fields only: the job starts `Pending` with zero financials and
    /// no product snapshot, waiting for staff to attach details. No
    /// notification is sent at this point.
    pub fn register(&self, intake: &IntakeForm) -> Result<Saved, JobError> {
        intake.validate()?;

        let id = sequence::allocate(&self.store)?;
        let now = Utc::now();
        let job = Job {
            id,
            customer_name: intake.customer_name.trim().to_string(),
            customer_email: trimmed(&intake.customer_email),
            customer_phone: trimmed(&intake.customer_phone),
            product_code: None,
            product_name: None,
            description: None,
            total_cost: Decimal::ZERO,
            advance: Decimal::ZERO,
            balance: Decimal::ZERO,
            pay_method: PayMethod::default(),
            balance_pay_method: None,
            status: JobStatus::Pending,
            due_date: now.date_naive(),
            created_at: now,
            completed_at: None,
        };
        self.persist(&job)?;
        tracing::debug!(job = %job.id, "registered customer intake job");

        Ok(Saved {
            job,
            notification: Notified::Skipped,
        })
    }

    /// Creates a job from staff-entered details.
    ///
    /// Allocates a fresh ID, snapshots the selected catalog item (or the
    /// synthetic `CUST`/`Custom` entry), and persists with `balance =
    /// total_cost - advance` and `status = Pending`. When `notify` is set and
    /// the customer has an email, a `JOB_UPDATED` message with the rendered
    /// receipt is dispatched.
    ///
    /// # Errors
    ///
    /// - [`JobError::Forbidden`] - job creation is an admin operation.
    /// - [`JobError::MissingCustomerName`] / [`JobError::NegativeAmount`] -
    ///   validation, raised before any write.
    /// - [`JobError::ProductNotFound`] - draft names an unknown catalog code.
    pub fn create(&self, actor: &Actor, draft: &JobDraft, notify: bool) -> Result<Saved, JobError> {
        require_admin(actor)?;
        draft.validate()?;
        let fields = self.resolve(draft)?;

        let id = sequence::allocate(&self.store)?;
        let now = Utc::now();
        let job = Job {
            id,
            customer_name: fields.customer_name,
            customer_email: fields.customer_email,
            customer_phone: fields.customer_phone,
            product_code: Some(fields.product_code),
            product_name: Some(fields.product_name),
            description: fields.description,
            total_cost: fields.total_cost,
            advance: fields.advance,
            balance: fields.total_cost - fields.advance,
            pay_method: fields.pay_method,
            balance_pay_method: None,
            status: JobStatus::Pending,
            due_date: fields.due_date,
            created_at: now,
            completed_at: None,
        };
        self.persist(&job)?;

        let notification = if notify {
            self.dispatch(NotificationKind::JobUpdated, &job)
        } else {
            Notified::Skipped
        };
        Ok(Saved { job, notification })
    }

    /// Overwrites the descriptive and financial fields of an existing job.
    ///
    /// `id`, `status`, and `created_at` never change here. Completed jobs are
    /// immutable: their receipt already went out, so edits are rejected with
    /// [`JobError::AlreadyCompleted`].
    pub fn update(
        &self,
        actor: &Actor,
        id: &JobId,
        draft: &JobDraft,
        notify: bool,
    ) -> Result<Saved, JobError> {
        let _ = actor; // any authenticated staff member may edit
        draft.validate()?;
        let mut job = self.load(id)?;
        if job.status == JobStatus::Completed {
            return Err(JobError::AlreadyCompleted);
        }

        let fields = self.resolve(draft)?;
        job.customer_name = fields.customer_name;
        job.customer_email = fields.customer_email;
        job.customer_phone = fields.customer_phone;
        job.product_code = Some(fields.product_code);
        job.product_name = Some(fields.product_name);
        job.description = fields.description;
        job.total_cost = fields.total_cost;
        job.advance = fields.advance;
        job.balance = fields.total_cost - fields.advance;
        job.pay_method = fields.pay_method;
        job.due_date = fields.due_date;
        self.persist(&job)?;

        let notification = if notify {
            self.dispatch(NotificationKind::JobUpdated, &job)
        } else {
            Notified::Skipped
        };
        Ok(Saved { job, notification })
    }

    /// Marks a pending job as ready for collection and notifies the customer.
    ///
    /// # Errors
    ///
    /// - [`JobError::AlreadyCompleted`] - the job already closed.
    /// - [`JobError::NotPending`] - the job is already `Ready`.
    pub fn mark_ready(&self, actor: &Actor, id: &JobId) -> Result<Saved, JobError> {
        let _ = actor; // any authenticated staff member may mark work done
        let mut job = self.load(id)?;
        match job.status {
            JobStatus::Pending => {}
            JobStatus::Completed => return Err(JobError::AlreadyCompleted),
            JobStatus::Ready => return Err(JobError::NotPending),
        }

        job.status = JobStatus::Ready;
        self.persist(&job)?;

        let notification = self.dispatch(NotificationKind::ReadyNotify, &job);
        Ok(Saved { job, notification })
    }

    /// Closes a job: collects the outstanding balance, zeroes it, and sends
    /// the final receipt.
    ///
    /// `balance_pay_method` records how the balance was settled. When the
    /// balance was already zero or negative there is nothing to collect and
    /// the method is forced to `None` regardless of what the caller supplied;
    /// any shortfall is absorbed, not tracked as residual debt.
    pub fn complete(
        &self,
        actor: &Actor,
        id: &JobId,
        balance_pay_method: Option<PayMethod>,
    ) -> Result<Saved, JobError> {
        require_admin(actor)?;
        let mut job = self.load(id)?;
        if job.status == JobStatus::Completed {
            return Err(JobError::AlreadyCompleted);
        }

        job.balance_pay_method = if job.balance <= Decimal::ZERO {
            None
        } else {
            balance_pay_method
        };
        job.status = JobStatus::Completed;
        job.balance = Decimal::ZERO;
        job.completed_at = Some(Utc::now());
        self.persist(&job)?;

        let notification = self.dispatch(NotificationKind::Receipt, &job);
        Ok(Saved { job, notification })
    }

    /// Permanently removes a job. No cascade: the catalog and the sequence
    /// counter are untouched, and the ID is never reissued.
    pub fn delete(&self, actor: &Actor, id: &JobId) -> Result<(), JobError> {
        require_admin(actor)?;
        if self.store.get(JOBS, id.as_str())?.is_none() {
            return Err(JobError::JobNotFound);
        }
        self.store.delete(JOBS, id.as_str())?;
        Ok(())
    }

    /// Loads one job in canonical shape.
    pub fn job(&self, id: &JobId) -> Result<Job, JobError> {
        self.load(id)
    }

    /// The full job set, newest first.
    pub fn jobs(&self) -> Result<Vec<Job>, JobError> {
        let mut jobs: Vec<Job> = self
            .store
            .list(JOBS)?
            .into_iter()
            .map(|(id, doc)| Job::from_document(JobId(id), &doc))
            .collect();
        sort_newest_first(&mut jobs);
        Ok(jobs)
    }

    /// Current aggregate statistics.
    pub fn stats(&self) -> Result<Stats, JobError> {
        Ok(stats::project(&self.jobs()?))
    }

    /// Current job counts per lifecycle state.
    pub fn status_counts(&self) -> Result<StatusCounts, JobError> {
        Ok(stats::status_counts(&self.jobs()?))
    }

    /// Long-lived realtime view of the job collection.
    pub fn subscribe(&self) -> JobFeed {
        JobFeed {
            inner: self.store.subscribe(JOBS),
        }
    }

    fn load(&self, id: &JobId) -> Result<Job, JobError> {
        let doc = self
            .store
            .get(JOBS, id.as_str())?
            .ok_or(JobError::JobNotFound)?;
        Ok(Job::from_document(id.clone(), &doc))
    }

    fn persist(&self, job: &Job) -> Result<(), JobError> {
        self.store.put(JOBS, job.id.as_str(), job.to_document())?;
        Ok(())
    }

    /// Resolves a draft against the catalog: snapshot of code, name, price,
    /// and default description, with the synthetic custom entry as fallback.
    fn resolve(&self, draft: &JobDraft) -> Result<DraftFields, JobError> {
        let catalog = self.catalog();
        let selected = match trimmed(&draft.product_code) {
            Some(code) => Some(catalog.find(&code)?.ok_or(JobError::ProductNotFound)?),
            None => None,
        };

        let (product_code, product_name, list_price, default_description) = match selected {
            Some(product) => (
                product.code,
                product.name,
                Some(product.price),
                product.description,
            ),
            None => (CUSTOM_CODE.to_string(), CUSTOM_NAME.to_string(), None, None),
        };

        Ok(DraftFields {
            customer_name: draft.customer_name.trim().to_string(),
            customer_email: trimmed(&draft.customer_email),
            customer_phone: trimmed(&draft.customer_phone),
            product_code,
            product_name,
            description: trimmed(&draft.description).or(default_description),
            total_cost: draft
                .total_cost
                .or(list_price)
                .unwrap_or(Decimal::ZERO),
            advance: draft.advance.unwrap_or(Decimal::ZERO),
            pay_method: draft.pay_method,
            due_date: draft.due_date.unwrap_or_else(|| Utc::now().date_naive()),
        })
    }

    /// Attempts exactly one dispatch for a committed transition.
    ///
    /// Missing email is a deliberate no-op. A mailer rejection is logged and
    /// folded into the outcome; the job's persisted state stands either way.
    fn dispatch(&self, kind: NotificationKind, job: &Job) -> Notified {
        let Some(email) = job.customer_email.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Notified::Skipped;
        };

        let attachment = kind.wants_attachment().then(|| self.renderer.render(job));
        let notification = Notification {
            kind,
            recipient_name: job.customer_name.clone(),
            recipient_email: email.to_string(),
            job_id: job.id.clone(),
            attachment,
        };

        match self.notifier.send(&notification) {
            Ok(()) => Notified::Sent(kind),
            Err(err) => {
                tracing::warn!(
                    job = %job.id,
                    kind = %kind,
                    "notification dispatch failed: {err}"
                );
                Notified::Failed(NotificationFailure {
                    kind,
                    job_id: job.id.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Realtime view of the job collection.
///
/// Wraps the storage subscription: every delivery is the full current job
/// set normalized to canonical records, with statistics recomputed from
/// scratch. The first delivery is available immediately.
pub struct JobFeed {
    inner: Receiver<Vec<(String, Document)>>,
}

impl JobFeed {
    /// Blocks for the next snapshot. `None` once the store is gone.
    pub fn recv(&self) -> Option<(Vec<Job>, Stats)> {
        self.inner.recv().ok().map(Self::normalize)
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&self) -> Option<(Vec<Job>, Stats)> {
        self.inner.try_recv().ok().map(Self::normalize)
    }

    fn normalize(snapshot: Vec<(String, Document)>) -> (Vec<Job>, Stats) {
        let mut jobs: Vec<Job> = snapshot
            .into_iter()
            .map(|(id, doc)| Job::from_document(JobId(id), &doc))
            .collect();
        sort_newest_first(&mut jobs);
        let stats = stats::project(&jobs);
        (jobs, stats)
    }
}

fn require_admin(actor: &Actor) -> Result<(), JobError> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(JobError::Forbidden(actor.role))
    }
}

fn sort_newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
