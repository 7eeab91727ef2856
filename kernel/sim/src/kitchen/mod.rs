// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Reference kitchen application driven by the bundled scenarios.

pub mod app;
pub mod rules;
pub mod ticket;

pub use app::{KitchenApp, KitchenCommand, KitchenQuery, TicketSummary, TicketView, SYSTEM_CLOCK_PRINCIPAL};
pub use rules::{KitchenAction, KitchenRules};
pub use ticket::{KitchenItem, KitchenTicket, KitchenTicketData, TicketPatch, TicketStatus};
