// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod execution;
pub mod scope;
pub mod unit_of_work;

pub use execution::ExecutionKernel;
pub use scope::{OperationScope, ScopeServices};
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
