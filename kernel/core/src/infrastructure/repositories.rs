// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! In-memory repository.
//!
//! Rows are kept in insertion order so that `find_all` is deterministic.
//! Inside a write scope, `save` and `delete` only enlist a [`StagedWrite`] in
//! the unit of work; the row changes when the unit of work commits. A staged
//! write remembers the row it replaced, so rolling back after a partial
//! commit restores it.
//!
//! There is at most one staged write per key and unit of work. Saving or
//! deleting a key that is already staged replaces the pending operation, so
//! the row remembered for rollback is always the one from before the unit of
//! work began.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::application::scope::OperationScope;
use crate::domain::entity::Identified;
use crate::domain::error::KernelError;
use crate::domain::repository::{Repository, TransactionalParticipant};
use crate::domain::trust::{CapabilityKind, TrustContext};

struct Table<E: Identified> {
    rows: HashMap<E::Id, E>,
    order: Vec<E::Id>,
}

impl<E: Identified + Clone> Table<E> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Returns the replaced row.
    fn put(&mut self, entity: E) -> Option<E> {
        let id = entity.id().clone();
        let previous = self.rows.insert(id.clone(), entity);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    /// Returns the removed row.
    fn remove(&mut self, id: &E::Id) -> Option<E> {
        let removed = self.rows.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    fn all(&self) -> Vec<E> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id).cloned())
            .collect()
    }

    fn clear(&mut self) -> usize {
        let count = self.rows.len();
        self.rows.clear();
        self.order.clear();
        count
    }
}

type SharedTable<E> = Arc<RwLock<Table<E>>>;

/// Live staged writes, by trace id and then by key.
type StagedIndex<E> = HashMap<String, HashMap<<E as Identified>::Id, Weak<StagedWrite<E>>>>;

enum StagedOp<E: Identified> {
    Put(E),
    Remove(E::Id),
}

impl<E: Identified> StagedOp<E> {
    fn key(&self) -> &E::Id {
        match self {
            StagedOp::Put(entity) => entity.id(),
            StagedOp::Remove(id) => id,
        }
    }
}

/// A save or delete waiting for its unit of work to commit.
pub struct StagedWrite<E: Identified> {
    table: SharedTable<E>,
    op: Mutex<StagedOp<E>>,
    /// `Some(previous row)` once committed.
    undo: Mutex<Option<Option<E>>>,
}

impl<E> StagedWrite<E>
where
    E: Identified + Clone + Send + Sync + 'static,
{
    fn new(table: SharedTable<E>, op: StagedOp<E>) -> Self {
        Self {
            table,
            op: Mutex::new(op),
            undo: Mutex::new(None),
        }
    }

    fn key(&self) -> E::Id {
        self.op.lock().key().clone()
    }

    /// Replaces the pending operation. Hands `op` back once this write has
    /// already committed.
    fn restage(&self, op: StagedOp<E>) -> Result<(), StagedOp<E>> {
        let undo = self.undo.lock();
        if undo.is_some() {
            return Err(op);
        }
        *self.op.lock() = op;
        Ok(())
    }
}

#[async_trait]
impl<E> TransactionalParticipant for StagedWrite<E>
where
    E: Identified + Clone + Send + Sync + 'static,
{
    async fn commit(&self) -> Result<(), KernelError> {
        let mut undo = self.undo.lock();
        let previous = {
            let op = self.op.lock();
            let mut table = self.table.write();
            match &*op {
                StagedOp::Put(entity) => table.put(entity.clone()),
                StagedOp::Remove(id) => table.remove(id),
            }
        };
        *undo = Some(previous);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), KernelError> {
        let Some(previous) = self.undo.lock().take() else {
            return Ok(());
        };
        let key = self.key();
        let mut table = self.table.write();
        match previous {
            Some(row) => {
                table.put(row);
            }
            None => {
                table.remove(&key);
            }
        }
        Ok(())
    }
}

pub struct InMemoryRepository<E: Identified> {
    resource: String,
    table: SharedTable<E>,
    staged: Mutex<StagedIndex<E>>,
}

impl<E> InMemoryRepository<E>
where
    E: Identified + Clone + Send + Sync + 'static,
{
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            table: Arc::new(RwLock::new(Table::new())),
            staged: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw dump of every row. Requires `RawAccess`.
    pub fn snapshot(&self, ctx: &TrustContext) -> Result<Vec<E>, KernelError> {
        ctx.capabilities().require(CapabilityKind::RawAccess)?;
        Ok(self.table.read().all())
    }

    /// Deletes every row immediately, outside any unit of work. Requires
    /// `Administrative`.
    pub fn purge(&self, ctx: &TrustContext) -> Result<usize, KernelError> {
        ctx.capabilities().require(CapabilityKind::Administrative)?;
        let removed = self.table.write().clear();
        debug!(resource = %self.resource, removed, "Repository purged");
        Ok(removed)
    }

    fn stage(&self, scope: &OperationScope, op: StagedOp<E>) -> Result<(), KernelError> {
        scope.context().capabilities().require(CapabilityKind::Write)?;

        match scope.unit_of_work() {
            Ok(uow) => {
                let mut staged = self.staged.lock();
                // Entries die once their unit of work drops its participants.
                staged.retain(|_, by_key| {
                    by_key.retain(|_, write| write.strong_count() > 0);
                    !by_key.is_empty()
                });

                let by_key = staged.entry(uow.trace_id().to_string()).or_default();
                let op = match by_key.get(op.key()).and_then(Weak::upgrade) {
                    Some(existing) => match existing.restage(op) {
                        Ok(()) => {
                            debug!(resource = %self.resource, trace_id = %scope.trace_id(), "Staged write replaced");
                            return Ok(());
                        }
                        Err(op) => op,
                    },
                    None => op,
                };

                let key = op.key().clone();
                let write = Arc::new(StagedWrite::new(self.table.clone(), op));
                by_key.insert(key, Arc::downgrade(&write));
                uow.register_participant(write);
                debug!(resource = %self.resource, trace_id = %scope.trace_id(), "Write staged");
            }
            Err(KernelError::ReadOnlyScope) => {
                let mut table = self.table.write();
                match op {
                    StagedOp::Put(entity) => {
                        table.put(entity);
                    }
                    StagedOp::Remove(id) => {
                        table.remove(&id);
                    }
                }
                debug!(resource = %self.resource, trace_id = %scope.trace_id(), "Write applied directly");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

#[async_trait]
impl<E> Repository<E> for InMemoryRepository<E>
where
    E: Identified + Clone + Send + Sync + 'static,
{
    fn resource_name(&self) -> &str {
        &self.resource
    }

    async fn get_by_id(&self, _ctx: &TrustContext, id: &E::Id) -> Result<Option<E>, KernelError> {
        Ok(self.table.read().rows.get(id).cloned())
    }

    async fn find_all(&self, _ctx: &TrustContext) -> Result<Vec<E>, KernelError> {
        Ok(self.table.read().all())
    }

    async fn save(&self, scope: &OperationScope, entity: E) -> Result<(), KernelError> {
        self.stage(scope, StagedOp::Put(entity))
    }

    async fn delete(&self, scope: &OperationScope, id: &E::Id) -> Result<(), KernelError> {
        self.stage(scope, StagedOp::Remove(id.clone()))
    }
}

impl<E: Identified> fmt::Debug for InMemoryRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("resource", &self.resource)
            .field("rows", &self.table.read().rows.len())
            .finish()
    }
}
