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

//! Income and outstanding-balance statistics.
//!
//! A pure projection over the full job set, recomputed from scratch on every
//! snapshot delivery. At the studio's data volumes (hundreds of jobs, not
//! millions) a full recompute is cheaper than maintaining incremental state.

use crate::job::{Job, JobStatus, PayMethod};
use rust_decimal::Decimal;
use serde::Serialize;

/// Aggregate dashboard figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_jobs: usize,
    pub cash_income: Decimal,
    pub card_income: Decimal,
    /// Outstanding balance across all non-completed jobs.
    pub due_balance: Decimal,
}

/// Job counts per lifecycle state, for the dashboard filter bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub ready: usize,
    pub completed: usize,
}

/// Projects aggregate statistics from the full job set.
///
/// Advance payments attribute to the job's `pay_method`. For completed jobs
/// the settled balance attributes to `balance_pay_method`, falling back to
/// `pay_method` for records created before that field existed. The persisted
/// balance is zero by then, so the settled amount is re-derived from
/// `total_cost - advance`.
pub fn project(jobs: &[Job]) -> Stats {
    let mut stats = Stats {
        total_jobs: jobs.len(),
        ..Stats::default()
    };

    for job in jobs {
        bucket(&mut stats, job.pay_method, job.advance);
        if job.status == JobStatus::Completed {
            let method = job.balance_pay_method.unwrap_or(job.pay_method);
            bucket(&mut stats, method, job.settled_balance());
        } else {
            stats.due_balance += job.balance;
        }
    }
    stats
}

/// Counts jobs per status.
pub fn status_counts(jobs: &[Job]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for job in jobs {
        match job.status {
            JobStatus::Pending => counts.pending += 1,
            JobStatus::Ready => counts.ready += 1,
            JobStatus::Completed => counts.completed += 1,
        }
    }
    counts
}

fn bucket(stats: &mut Stats, method: PayMethod, amount: Decimal) {
    match method {
        PayMethod::Cash => stats.cash_income += amount,
        PayMethod::Card => stats.card_income += amount,
    }
}
