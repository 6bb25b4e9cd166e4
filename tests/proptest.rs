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

//! Property-based tests for the job ledger.
//!
//! These tests verify invariants that should hold for any mix of job
//! amounts, payment methods, and lifecycle depth.

use proptest::prelude::*;
use rust_decimal::Decimal;
use studio_ledger_rs::{
    stats, Actor, JobDraft, JobLedger, JobStatus, MemoryStore, NullNotifier, PayMethod,
    TextReceipt,
};

// =============================================================================
// Arbitrary Strategies
// =============================================================================

/// Generate a non-negative amount (0 to 10000 with 2 decimal places).
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_method() -> impl Strategy<Value = PayMethod> {
    prop_oneof![Just(PayMethod::Cash), Just(PayMethod::Card)]
}

/// One job's worth of inputs: total, advance, advance method, balance
/// method, and how far through the lifecycle it gets (0 = pending,
/// 1 = ready, 2 = completed).
fn arb_job() -> impl Strategy<Value = (Decimal, Decimal, PayMethod, PayMethod, u8)> {
    (arb_amount(), arb_amount(), arb_method(), arb_method(), 0u8..=2)
}

fn ledger() -> JobLedger<MemoryStore, NullNotifier, TextReceipt> {
    JobLedger::new(MemoryStore::new(), NullNotifier, TextReceipt::default())
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// An open job always satisfies balance = total - advance.
    #[test]
    fn open_balance_identity(total in arb_amount(), advance in arb_amount()) {
        let ledger = ledger();
        let saved = ledger.create(
            &Actor::admin("owner"),
            &JobDraft {
                customer_name: "Customer".to_string(),
                total_cost: Some(total),
                advance: Some(advance),
                ..Default::default()
            },
            false,
        ).unwrap();

        prop_assert_eq!(saved.job.balance, total - advance);
        prop_assert_eq!(saved.job.status, JobStatus::Pending);
    }

    /// Completion always zeroes the balance and stamps a completion time.
    #[test]
    fn completion_zeroes_balance(
        total in arb_amount(),
        advance in arb_amount(),
        method in arb_method(),
    ) {
        let ledger = ledger();
        let admin = Actor::admin("owner");
        let id = ledger.create(
            &admin,
            &JobDraft {
                customer_name: "Customer".to_string(),
                total_cost: Some(total),
                advance: Some(advance),
                ..Default::default()
            },
            false,
        ).unwrap().job.id;

        let saved = ledger.complete(&admin, &id, Some(method)).unwrap();

        prop_assert_eq!(saved.job.balance, Decimal::ZERO);
        prop_assert!(saved.job.completed_at.is_some());
        if total <= advance {
            // Nothing was owed, so no settlement method is recorded.
            prop_assert_eq!(saved.job.balance_pay_method, None);
        } else {
            prop_assert_eq!(saved.job.balance_pay_method, Some(method));
        }
    }

    /// Cash plus card income never exceeds the sum of all job totals, and
    /// income is never negative.
    #[test]
    fn income_bounded_by_totals(jobs in prop::collection::vec(arb_job(), 1..12)) {
        let ledger = ledger();
        let admin = Actor::admin("owner");
        let staff = Actor::staff("assistant");
        let mut total_sum = Decimal::ZERO;

        for (total, advance, method, balance_method, depth) in &jobs {
            let advance = (*advance).min(*total);
            total_sum += *total;
            let id = ledger.create(
                &admin,
                &JobDraft {
                    customer_name: "Customer".to_string(),
                    total_cost: Some(*total),
                    advance: Some(advance),
                    pay_method: *method,
                    ..Default::default()
                },
                false,
            ).unwrap().job.id;

            if *depth >= 1 {
                ledger.mark_ready(&staff, &id).unwrap();
            }
            if *depth >= 2 {
                ledger.complete(&admin, &id, Some(*balance_method)).unwrap();
            }
        }

        let stats = ledger.stats().unwrap();
        prop_assert!(stats.cash_income >= Decimal::ZERO);
        prop_assert!(stats.card_income >= Decimal::ZERO);
        prop_assert!(stats.due_balance >= Decimal::ZERO);
        prop_assert!(stats.cash_income + stats.card_income <= total_sum);
        // Income plus outstanding balance covers every total exactly, since
        // advances were clamped to totals above.
        prop_assert_eq!(
            stats.cash_income + stats.card_income + stats.due_balance,
            total_sum
        );
    }

    /// Projecting the same job set twice yields identical statistics.
    #[test]
    fn projection_is_deterministic(jobs in prop::collection::vec(arb_job(), 0..8)) {
        let ledger = ledger();
        let admin = Actor::admin("owner");

        for (total, advance, method, _, _) in &jobs {
            ledger.create(
                &admin,
                &JobDraft {
                    customer_name: "Customer".to_string(),
                    total_cost: Some(*total),
                    advance: Some(*advance),
                    pay_method: *method,
                    ..Default::default()
                },
                false,
            ).unwrap();
        }

        let snapshot = ledger.jobs().unwrap();
        prop_assert_eq!(stats::project(&snapshot), stats::project(&snapshot));
        prop_assert_eq!(ledger.stats().unwrap(), stats::project(&snapshot));
    }
}
