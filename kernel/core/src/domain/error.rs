// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Kernel Errors
//!
//! Every kernel failure is loud and immediate. Nothing in this crate retries.
//!
//! | Condition | Variant |
//! |-----------|---------|
//! | evolve without a live token | `UnauthorizedEvolution` |
//! | evolve with an empty reason | `MissingReason` |
//! | data fails its validity predicate | `DomainValidation` |
//! | capability absent at `require()` | `MissingCapability` |
//! | second `open()` for one trace | `NestedUnitOfWork` |
//! | entity not found | `NotFound` |
//! | policy rejects a transition | `BusinessRule` |

use thiserror::Error;

use crate::domain::trust::{CapabilityKind, TrustLevel};

/// Raised when data fails the type-specific validity predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Domain validation failed: {0}")]
pub struct DomainValidationError(pub String);

impl DomainValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Unauthorized evolution: a valid evolution token is required")]
    UnauthorizedEvolution,

    #[error("Unexplained evolution: a non-empty reason is required")]
    MissingReason,

    #[error(transparent)]
    DomainValidation(#[from] DomainValidationError),

    #[error("Missing required capability: {capability}")]
    MissingCapability { capability: CapabilityKind },

    #[error("Invalid trust promotion from {from} to {to}")]
    InvalidPromotion { from: TrustLevel, to: TrustLevel },

    #[error("Nested UnitOfWork detected for trace {trace_id}")]
    NestedUnitOfWork { trace_id: String },

    #[error("Write operation attempted in read-only scope (no active unit of work)")]
    ReadOnlyScope,

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    #[error("{0}")]
    BusinessRule(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Dependency failure: {dependency} ({message})")]
    DependencyFailure { dependency: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KernelError {
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }

    /// Stable machine-readable code, one per failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnauthorizedEvolution => "UNAUTHORIZED",
            Self::MissingReason => "VALIDATION_ERROR",
            Self::DomainValidation(_) => "DOMAIN_VALIDATION_ERROR",
            Self::MissingCapability { .. } => "MISSING_CAPABILITY",
            Self::InvalidPromotion { .. } => "INVALID_PROMOTION",
            Self::NestedUnitOfWork { .. } => "NESTED_UNIT_OF_WORK",
            Self::ReadOnlyScope => "READ_ONLY_SCOPE",
            Self::NotFound { .. } => "NOT_FOUND_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::DependencyFailure { .. } => "DEPENDENCY_FAILURE",
            Self::Other(_) => "KERNEL_ERROR",
        }
    }

    /// Remediation hint for failures caused by misuse of the kernel API.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::UnauthorizedEvolution => {
                Some("Evolve inside a DecisionPolicy or through OperationScope::authorize.")
            }
            Self::MissingReason => Some("Add a descriptive reason for this state change."),
            Self::ReadOnlyScope => Some("Open the scope with a unit of work to perform writes."),
            Self::NestedUnitOfWork { .. } => {
                Some("Fork the existing scope instead of opening a second unit of work.")
            }
            _ => None,
        }
    }

    /// Business-level failures are expected outcomes of a use case, not defects.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::BusinessRule(_) | Self::NotFound { .. } | Self::DomainValidation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_message_names_the_kind() {
        let err = KernelError::MissingCapability {
            capability: CapabilityKind::Write,
        };
        assert_eq!(err.to_string(), "Missing required capability: Write");
        assert_eq!(err.code(), "MISSING_CAPABILITY");
    }

    #[test]
    fn test_nested_unit_of_work_message_contains_trace() {
        let err = KernelError::NestedUnitOfWork {
            trace_id: "trace-7".to_string(),
        };
        assert!(err.to_string().contains("Nested UnitOfWork detected for trace trace-7"));
        assert!(err.guidance().is_some());
    }

    #[test]
    fn test_not_found_formats_resource_and_id() {
        let err = KernelError::not_found("KitchenTicket", "ticket-9");
        assert_eq!(err.to_string(), "KitchenTicket with ID ticket-9 not found");
        assert!(err.is_business());
    }

    #[test]
    fn test_domain_validation_converts() {
        let err: KernelError = DomainValidationError::new("name is required").into();
        assert_eq!(err.code(), "DOMAIN_VALIDATION_ERROR");
        assert_eq!(err.to_string(), "Domain validation failed: name is required");
    }
}
