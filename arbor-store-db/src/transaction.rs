// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Explicit transactions, save batches and the savepoint wrapped around
//! every immediate write.
//!
//! Nesting, outermost first:
//!
//! - an explicit transaction (`BEGIN IMMEDIATE`), optional
//! - a save batch (savepoint `arbor_batch`), optional
//! - one savepoint `arbor_write` per mutating call
//!
//! Reference work staged by mutations is flushed when the write savepoint is
//! released, or at [`ContentStore::finish_save`] when a batch is open.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::connection::ContentStore;
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub(crate) struct TransactionState {
    pub(crate) explicit: bool,
    pub(crate) batch: bool,
}

/// Reference work deferred until the end of the write or the batch.
#[derive(Debug, Default, Clone)]
pub(crate) struct Staged {
    /// Rows whose outgoing edges must be re-derived.
    pub(crate) references: BTreeSet<i64>,
    /// Deleted rows by id, with their former paths.
    pub(crate) deletions: BTreeMap<i64, String>,
}

impl Staged {
    pub(crate) fn is_empty(&self) -> bool {
        self.references.is_empty() && self.deletions.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.references.clear();
        self.deletions.clear();
    }
}

impl ContentStore {
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.tx.explicit {
            return Err(Error::Usage("a transaction is already open".into()));
        }
        if self.tx.batch {
            return Err(Error::Usage(
                "cannot begin a transaction inside a save batch".into(),
            ));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.tx.explicit = true;
        debug!("began transaction");
        Ok(())
    }

    pub fn commit_transaction(&mut self) -> Result<()> {
        if !self.tx.explicit {
            return Err(Error::Usage("no transaction is open".into()));
        }
        if self.tx.batch {
            return Err(Error::Usage(
                "the open save batch must be finished or rolled back first".into(),
            ));
        }
        self.conn.execute_batch("COMMIT")?;
        self.tx.explicit = false;
        self.namespaces.discard_snapshot();
        debug!("committed transaction");
        Ok(())
    }

    /// Roll back the explicit transaction, including any open save batch.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        if !self.tx.explicit {
            return Err(Error::Usage("no transaction is open".into()));
        }
        self.tx = TransactionState::default();
        self.staged.clear();
        self.cache.get_mut().clear();
        self.namespaces.restore();
        self.conn.execute_batch("ROLLBACK")?;
        self.reload_types()?;
        debug!("rolled back transaction");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.explicit
    }

    pub fn set_transaction_timeout(&mut self, _seconds: u64) -> Result<()> {
        Err(Error::NotImplemented("transaction timeouts"))
    }

    /// Open a save batch: mutations until [`ContentStore::finish_save`]
    /// defer their reference checks.
    pub fn prepare_save(&mut self) -> Result<()> {
        if self.tx.batch {
            return Err(Error::Usage("a save batch is already open".into()));
        }
        self.conn.execute_batch("SAVEPOINT arbor_batch")?;
        self.tx.batch = true;
        Ok(())
    }

    /// Synchronize staged references, validate staged deletions and release
    /// the batch. On failure the batch stays open with its staged work.
    pub fn finish_save(&mut self) -> Result<()> {
        if !self.tx.batch {
            return Err(Error::Usage("no save batch is open".into()));
        }
        self.flush_references()?;
        self.conn.execute_batch("RELEASE arbor_batch")?;
        self.tx.batch = false;
        Ok(())
    }

    pub fn rollback_save(&mut self) -> Result<()> {
        if !self.tx.batch {
            return Err(Error::Usage("no save batch is open".into()));
        }
        self.conn
            .execute_batch("ROLLBACK TO arbor_batch; RELEASE arbor_batch")?;
        self.tx.batch = false;
        self.staged.clear();
        self.cache.get_mut().clear();
        self.namespaces.reload(&self.conn)?;
        self.reload_types()
    }

    /// Run `op` inside the write savepoint. Outside a batch, staged
    /// reference work is flushed before the savepoint is released.
    pub(crate) fn write_batch<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let staged_before = self.tx.batch.then(|| self.staged.clone());
        self.conn.execute_batch("SAVEPOINT arbor_write")?;

        let result = op(self).and_then(|value| {
            if !self.tx.batch {
                self.flush_references()?;
            }
            Ok(value)
        });

        match result {
            Ok(value) => {
                self.conn.execute_batch("RELEASE arbor_write")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO arbor_write; RELEASE arbor_write")
                {
                    warn!(error = %rollback, "failed to roll back write savepoint");
                }
                self.staged = staged_before.unwrap_or_default();
                self.cache.get_mut().clear();
                Err(e)
            }
        }
    }
}
