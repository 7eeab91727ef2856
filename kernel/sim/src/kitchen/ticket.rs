// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0

use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_core::{DomainData, DomainValidationError, Entity, Validatable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Received,
    Cooking,
    Completed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Received => write!(f, "RECEIVED"),
            TicketStatus::Cooking => write!(f, "COOKING"),
            TicketStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenItem {
    pub name: String,
    pub status: TicketStatus,
    pub course: u32,
}

impl KitchenItem {
    pub fn received(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TicketStatus::Received,
            course: 1,
        }
    }

    pub fn with_status(&self, status: TicketStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Minutes on the grill before the item completes by itself.
    pub fn cooking_minutes(&self) -> u64 {
        let name = self.name.to_lowercase();
        if name.contains("steak") {
            20
        } else if name.contains("burger") {
            10
        } else {
            5
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenTicketData {
    pub items: Vec<KitchenItem>,
    pub status: TicketStatus,
}

impl KitchenTicketData {
    pub fn received<S: AsRef<str>>(items: &[S]) -> Self {
        Self {
            items: items.iter().map(|name| KitchenItem::received(name.as_ref())).collect(),
            status: TicketStatus::Received,
        }
    }

    pub fn item(&self, name: &str) -> Option<&KitchenItem> {
        self.items.iter().find(|item| item.name == name)
    }
}

impl Validatable for KitchenTicketData {
    fn validate(&self) -> Result<(), DomainValidationError> {
        if self.items.is_empty() {
            return Err(DomainValidationError::new("Items are required"));
        }
        if let Some(unnamed) = self.items.iter().position(|item| item.name.trim().is_empty()) {
            return Err(DomainValidationError::new(format!(
                "Item name is required (item {})",
                unnamed + 1
            )));
        }
        let all_completed = self.items.iter().all(|item| item.status == TicketStatus::Completed);
        if self.status == TicketStatus::Completed && !all_completed {
            return Err(DomainValidationError::new(
                "Ticket cannot be COMPLETED while items are outstanding",
            ));
        }
        Ok(())
    }
}

/// Partial update applied by the kitchen rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<KitchenItem>>,
}

impl DomainData for KitchenTicketData {
    type Patch = TicketPatch;

    fn merge(&self, changes: &TicketPatch) -> Self {
        Self {
            items: changes.items.clone().unwrap_or_else(|| self.items.clone()),
            status: changes.status.unwrap_or(self.status),
        }
    }
}

pub type KitchenTicket = Entity<String, KitchenTicketData>;
