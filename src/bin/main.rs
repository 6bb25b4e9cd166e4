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

use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use studio_ledger_rs::{
    Actor, IntakeForm, JobDraft, JobId, JobLedger, MemoryStore, NullNotifier, PayMethod, Product,
    TextReceipt,
};

type Ledger = JobLedger<MemoryStore, NullNotifier, TextReceipt>;

/// Studio Ledger - Replay job operation CSV files
///
/// Reads lifecycle operations from a CSV file, applies them in order against
/// a fresh in-memory store, and prints the resulting job table to stdout.
#[derive(Parser, Debug)]
#[command(name = "studio-ledger-rs")]
#[command(about = "A job ledger engine that replays operation CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with operations
    ///
    /// Expected format: op,job,name,email,phone,product,total,advance,method,balance_method,due
    /// Example: cargo run -- jobs.csv > ledger.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print income and balance statistics to stderr after replay
    #[arg(long)]
    stats: bool,
}

fn main() {
    // Logs go to stderr so the job table on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match replay_operations(BufReader::new(file)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing operations: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_jobs(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }

    if args.stats {
        match ledger.stats() {
            Ok(stats) => eprintln!(
                "jobs={} cash={} card={} due={}",
                stats.total_jobs, stats.cash_income, stats.card_income, stats.due_balance
            ),
            Err(e) => eprintln!("Error computing stats: {}", e),
        }
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `op, job, name, email, phone, product, total, advance, method,
/// balance_method, due`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    op: String,
    job: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    product: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    total: Option<Decimal>,
    #[serde(deserialize_with = "csv::invalid_option")]
    advance: Option<Decimal>,
    method: Option<String>,
    balance_method: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    due: Option<NaiveDate>,
}

impl CsvRecord {
    fn draft(&self) -> JobDraft {
        JobDraft {
            customer_name: self.name.clone().unwrap_or_default(),
            customer_email: self.email.clone(),
            customer_phone: self.phone.clone(),
            product_code: self.product.clone(),
            description: None,
            total_cost: self.total,
            advance: self.advance,
            pay_method: self
                .method
                .as_deref()
                .and_then(PayMethod::parse)
                .unwrap_or_default(),
            due_date: self.due,
        }
    }

    fn job_id(&self) -> Option<JobId> {
        self.job.clone().filter(|j| !j.is_empty()).map(JobId)
    }
}

/// Applies one operation row. `None` means the row named an unknown
/// operation or missed a required field.
fn apply(ledger: &Ledger, actor: &Actor, record: &CsvRecord) -> Option<Result<(), String>> {
    let outcome = match record.op.to_lowercase().as_str() {
        "product" => {
            let product = Product {
                code: record.product.clone()?,
                name: record.name.clone()?,
                price: record.total?,
                description: None,
            };
            ledger.catalog().add(product).map(|_| ())
        }
        "create" => ledger.create(actor, &record.draft(), false).map(|_| ()),
        "register" => {
            let intake = IntakeForm {
                customer_name: record.name.clone()?,
                customer_email: record.email.clone(),
                customer_phone: record.phone.clone(),
            };
            ledger.register(&intake).map(|_| ())
        }
        "update" => {
            let id = record.job_id()?;
            ledger.update(actor, &id, &record.draft(), false).map(|_| ())
        }
        "ready" => {
            let id = record.job_id()?;
            ledger.mark_ready(actor, &id).map(|_| ())
        }
        "complete" => {
            let id = record.job_id()?;
            let method = record.balance_method.as_deref().and_then(PayMethod::parse);
            ledger.complete(actor, &id, method).map(|_| ())
        }
        "delete" => {
            let id = record.job_id()?;
            ledger.delete(actor, &id)
        }
        _ => return None,
    };
    Some(outcome.map_err(|e| e.to_string()))
}

/// Replays operations from a CSV reader against a fresh ledger.
///
/// Rows apply in file order, so IDs come out dense from `SC-0001`. Malformed
/// rows and rejected operations are skipped; the replay keeps going.
///
/// # CSV Format
///
/// Expected columns: `op, job, name, email, phone, product, total, advance,
/// method, balance_method, due`
/// - `op`: product, create, register, update, ready, complete, delete
/// - `job`: Job ID (SC-####), required for update/ready/complete/delete
/// - remaining columns feed the draft and are optional per operation
///
/// # Example
///
/// ```csv
/// op,job,name,email,phone,product,total,advance,method,balance_method,due
/// create,,Asha Rao,,,,2000,500,Cash,,
/// ready,SC-0001,,,,,,,,,
/// complete,SC-0001,,,,,,,,Card,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
/// Individual operation errors are logged in debug mode but don't stop replay.
pub fn replay_operations<R: Read>(reader: R) -> Result<Ledger, csv::Error> {
    let ledger = JobLedger::new(MemoryStore::new(), NullNotifier, TextReceipt::default());
    let actor = Actor::admin("cli");

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<CsvRecord>() {
        match result {
            Ok(record) => match apply(&ledger, &actor, &record) {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping {} row: {}", record.op, e);
                    #[cfg(not(debug_assertions))]
                    let _ = e;
                }
                None => {
                    #[cfg(debug_assertions)]
                    eprintln!("Skipping invalid operation record");
                }
            },
            Err(e) => {
                // Skip malformed rows
                #[cfg(debug_assertions)]
                eprintln!("Skipping malformed row: {}", e);
                continue;
            }
        }
    }

    Ok(ledger)
}

/// Writes the job table to a CSV writer, newest job first.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_jobs<W: Write>(ledger: &Ledger, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for job in ledger.jobs().map_err(std::io::Error::other)? {
        wtr.serialize(&job)?;
    }

    wtr.flush()?;
    Ok(())
}
