// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Repository & Transaction Ports
//!
//! | Trait | Role | Implementations |
//! |-------|------|-----------------|
//! | `Repository<E>` | entity persistence | `InMemoryRepository<E>` |
//! | `TransactionalParticipant` | staged writer enlisted in a unit of work | `StagedWrite<E>` |
//!
//! Reads take a plain `TrustContext`. Writes take the `OperationScope` so that
//! a save can enlist itself in the scope's unit of work; writes always require
//! a `Write` capability.

use async_trait::async_trait;

use crate::application::scope::OperationScope;
use crate::domain::entity::Identified;
use crate::domain::error::KernelError;
use crate::domain::trust::TrustContext;

/// A staged writer. `commit` makes the write durable; `rollback` undoes it.
#[async_trait]
pub trait TransactionalParticipant: Send + Sync {
    async fn commit(&self) -> Result<(), KernelError>;

    async fn rollback(&self) -> Result<(), KernelError>;
}

#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: Identified + Clone + Send + Sync + 'static,
{
    /// Resource name used in `NotFound` errors.
    fn resource_name(&self) -> &str;

    async fn get_by_id(&self, ctx: &TrustContext, id: &E::Id) -> Result<Option<E>, KernelError>;

    /// Strict variant of `get_by_id`.
    async fn find_by_id(&self, ctx: &TrustContext, id: &E::Id) -> Result<E, KernelError> {
        self.get_by_id(ctx, id)
            .await?
            .ok_or_else(|| KernelError::not_found(self.resource_name(), id))
    }

    async fn find_all(&self, ctx: &TrustContext) -> Result<Vec<E>, KernelError>;

    /// Create or update. Staged into the scope's unit of work when one is open.
    async fn save(&self, scope: &OperationScope, entity: E) -> Result<(), KernelError>;

    async fn delete(&self, scope: &OperationScope, id: &E::Id) -> Result<(), KernelError>;
}
