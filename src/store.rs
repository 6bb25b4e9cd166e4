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

//! Document storage seam.
//!
//! The ledger treats its database as a generic document store: collections of
//! JSON documents with upsert/delete, full-snapshot subscriptions, and one
//! transactional read-modify-write primitive. [`MemoryStore`] is the bundled
//! implementation, backed by [`DashMap`] collections with optimistic
//! version-checked commits.

use crossbeam::channel::{self, Receiver, Sender};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// A stored record. The engine normalizes these into canonical shapes at read
/// time, so legacy documents with drifted schemas stay representable.
pub type Document = Value;

/// Storage layer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// An optimistic transaction kept colliding with concurrent commits.
    #[error("transaction conflict persisted after {0} attempts")]
    Conflict(u32),

    /// The backend rejected the operation.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Transactional handle passed to [`Storage::atomic`] bodies.
///
/// Reads observe the body's own pending writes; the whole body commits or
/// retries as one unit.
pub trait StorageTxn {
    fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;
    fn set(&mut self, collection: &str, id: &str, document: Document);
}

/// Generic document store consumed by the ledger engine.
pub trait Storage: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError>;

    /// Upsert: full overwrite of the document under `id`.
    fn put(&self, collection: &str, id: &str, document: Document) -> Result<(), StorageError>;

    fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError>;

    fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StorageError>;

    /// Long-lived subscription to a collection. The current full record set is
    /// delivered immediately, then re-delivered after every mutation. Deltas
    /// are never sent; consumers recompute from each snapshot.
    fn subscribe(&self, collection: &str) -> Receiver<Vec<(String, Document)>>;

    /// Runs `body` as one atomic read-modify-write. On conflict with a
    /// concurrent commit the whole body is retried; errors returned by the
    /// body abort without retrying.
    fn atomic(
        &self,
        body: &mut dyn FnMut(&mut dyn StorageTxn) -> Result<(), StorageError>,
    ) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    document: Document,
}

#[derive(Debug, Default)]
struct Collection {
    documents: DashMap<String, Versioned>,
    watchers: Mutex<Vec<Sender<Vec<(String, Document)>>>>,
}

impl Collection {
    fn snapshot(&self) -> Vec<(String, Document)> {
        self.documents
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().document.clone()))
            .collect()
    }
}

/// In-memory document store with optimistic transactions.
///
/// Transactions record the version of every document they read, buffer their
/// writes, and validate the recorded versions under a commit lock before
/// applying. A version mismatch means a concurrent commit won; the transaction
/// body is re-run from scratch. Plain `put`/`delete` bypass validation (last
/// write wins, as the surrounding application expects for job edits).
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
    versions: AtomicU64,
    commit_lock: Mutex<()>,
}

impl MemoryStore {
    const MAX_COMMIT_ATTEMPTS: u32 = 64;

    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current version of a document, `None` if absent.
    fn version_of(&self, collection: &str, id: &str) -> Option<u64> {
        self.collections
            .get(collection)?
            .documents
            .get(id)
            .map(|doc| doc.version)
    }

    fn publish(&self, collection: &str) {
        let Some(coll) = self.collections.get(collection) else {
            return;
        };
        let snapshot = coll.snapshot();
        let mut watchers = coll.watchers.lock();
        watchers.retain(|sender| sender.send(snapshot.clone()).is_ok());
    }

    fn try_commit(&self, txn: &MemoryTxn<'_>) -> bool {
        let _guard = self.commit_lock.lock();

        for (collection, id, seen) in &txn.reads {
            if self.version_of(collection, id) != *seen {
                return false;
            }
        }

        for (collection, id, document) in &txn.writes {
            let coll = self.collections.entry(collection.clone()).or_default();
            coll.documents.insert(
                id.clone(),
                Versioned {
                    version: self.next_version(),
                    document: document.clone(),
                },
            );
        }
        true
    }
}

impl Storage for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|coll| coll.documents.get(id).map(|doc| doc.document.clone())))
    }

    fn put(&self, collection: &str, id: &str, document: Document) -> Result<(), StorageError> {
        {
            let coll = self.collections.entry(collection.to_string()).or_default();
            coll.documents.insert(
                id.to_string(),
                Versioned {
                    version: self.next_version(),
                    document,
                },
            );
        }
        self.publish(collection);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let removed = self
            .collections
            .get(collection)
            .and_then(|coll| coll.documents.remove(id))
            .is_some();
        if removed {
            self.publish(collection);
        }
        Ok(())
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StorageError> {
        Ok(self
            .collections
            .get(collection)
            .map(|coll| coll.snapshot())
            .unwrap_or_default())
    }

    fn subscribe(&self, collection: &str) -> Receiver<Vec<(String, Document)>> {
        let (sender, receiver) = channel::unbounded();
        let coll = self.collections.entry(collection.to_string()).or_default();
        // Initial delivery mirrors the realtime listener contract: subscribers
        // start from the current full record set.
        let _ = sender.send(coll.snapshot());
        coll.watchers.lock().push(sender);
        receiver
    }

    fn atomic(
        &self,
        body: &mut dyn FnMut(&mut dyn StorageTxn) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        for attempt in 1..=Self::MAX_COMMIT_ATTEMPTS {
            let mut txn = MemoryTxn {
                store: self,
                reads: Vec::new(),
                writes: Vec::new(),
            };
            body(&mut txn)?;

            if self.try_commit(&txn) {
                let mut touched: Vec<String> =
                    txn.writes.into_iter().map(|(coll, _, _)| coll).collect();
                touched.dedup();
                for collection in touched {
                    self.publish(&collection);
                }
                return Ok(());
            }
            tracing::debug!(attempt, "optimistic commit conflicted, retrying transaction");
        }
        Err(StorageError::Conflict(Self::MAX_COMMIT_ATTEMPTS))
    }
}

struct MemoryTxn<'a> {
    store: &'a MemoryStore,
    /// Versions observed at read time: (collection, id, version-or-absent).
    reads: Vec<(String, String, Option<u64>)>,
    /// Buffered writes, applied in order at commit.
    writes: Vec<(String, String, Document)>,
}

impl StorageTxn for MemoryTxn<'_> {
    fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
        // Reads observe this transaction's own pending writes.
        if let Some((_, _, document)) = self
            .writes
            .iter()
            .rev()
            .find(|(coll, doc_id, _)| coll == collection && doc_id == id)
        {
            return Ok(Some(document.clone()));
        }

        let found = self.store.collections.get(collection).and_then(|coll| {
            coll.documents
                .get(id)
                .map(|doc| (doc.version, doc.document.clone()))
        });
        let (version, document) = match found {
            Some((version, document)) => (Some(version), Some(document)),
            None => (None, None),
        };
        self.reads
            .push((collection.to_string(), id.to_string(), version));
        Ok(document)
    }

    fn set(&mut self, collection: &str, id: &str, document: Document) {
        self.writes
            .push((collection.to_string(), id.to_string(), document));
    }
}
