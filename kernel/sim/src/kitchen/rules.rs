// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Kitchen decision rules.
//!
//! | Action | Allowed from | Result |
//! |--------|--------------|--------|
//! | `StartCooking` | `RECEIVED` | ticket and every item `COOKING` |
//! | `CompleteItem` | `COOKING` | named item `COMPLETED`; ticket `COMPLETED` once all items are |

use tessera_core::{Decide, Evolution, Identified, KernelError};

use super::ticket::{KitchenTicket, TicketPatch, TicketStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KitchenAction {
    StartCooking,
    CompleteItem { item_name: String },
}

#[derive(Debug, Default)]
pub struct KitchenRules;

impl Decide for KitchenRules {
    const NAME: &'static str = "KitchenPolicy";
    type Target = KitchenTicket;
    type Context = KitchenAction;

    fn decide(
        &self,
        ticket: &KitchenTicket,
        action: &KitchenAction,
    ) -> Result<Vec<Evolution<TicketPatch>>, KernelError> {
        let data = ticket.data();

        match action {
            KitchenAction::StartCooking => {
                if data.status != TicketStatus::Received {
                    return Err(KernelError::business_rule(format!(
                        "Cannot start cooking from status: {}",
                        data.status
                    )));
                }
                let items = data
                    .items
                    .iter()
                    .map(|item| item.with_status(TicketStatus::Cooking))
                    .collect();
                Ok(vec![Evolution::new(
                    TicketPatch {
                        status: Some(TicketStatus::Cooking),
                        items: Some(items),
                    },
                    "Transitioned ticket and items to COOKING",
                )])
            }
            KitchenAction::CompleteItem { item_name } => {
                if data.status != TicketStatus::Cooking {
                    return Err(KernelError::business_rule(format!(
                        "Cannot complete item from status: {}",
                        data.status
                    )));
                }
                if data.item(item_name).is_none() {
                    return Err(KernelError::business_rule(format!(
                        "Ticket {} has no item named {item_name}",
                        ticket.id()
                    )));
                }

                let items: Vec<_> = data
                    .items
                    .iter()
                    .map(|item| {
                        if item.name == *item_name {
                            item.with_status(TicketStatus::Completed)
                        } else {
                            item.clone()
                        }
                    })
                    .collect();
                let all_completed = items.iter().all(|item| item.status == TicketStatus::Completed);

                let (status, note) = if all_completed {
                    (TicketStatus::Completed, "All items completed, ticket COMPLETED".to_string())
                } else {
                    (TicketStatus::Cooking, format!("Completed item: {item_name}"))
                };
                Ok(vec![Evolution::new(
                    TicketPatch {
                        status: Some(status),
                        items: Some(items),
                    },
                    note,
                )])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::ticket::KitchenTicketData;
    use std::sync::Arc;
    use tessera_core::infrastructure::{SequentialIdGenerator, VirtualClock};
    use tessera_core::{ContextFactory, DecisionPolicy};

    fn ticket(items: &[&str]) -> KitchenTicket {
        let clock = VirtualClock::new(0);
        KitchenTicket::new("ticket-1".to_string(), KitchenTicketData::received(items), &clock).unwrap()
    }

    fn policy() -> DecisionPolicy<KitchenRules> {
        DecisionPolicy::new(KitchenRules, Arc::new(VirtualClock::new(0)))
    }

    fn ctx() -> tessera_core::TrustContext {
        ContextFactory::new(Arc::new(SequentialIdGenerator::new()))
            .create_command(Some("Chef"))
            .unwrap()
    }

    #[test]
    fn test_start_cooking_moves_everything_to_cooking() {
        let ticket = ticket(&["Burger", "Fries"]);
        let cooking = policy()
            .execute(&ctx(), &ticket, &KitchenAction::StartCooking)
            .unwrap()
            .into_owned();

        assert_eq!(cooking.data().status, TicketStatus::Cooking);
        assert!(cooking.data().items.iter().all(|i| i.status == TicketStatus::Cooking));
        assert_eq!(cooking.revision(), 2);
        assert_eq!(
            cooking.provenance().history[0].reason,
            "[Policy: KitchenPolicy] Transitioned ticket and items to COOKING"
        );
    }

    #[test]
    fn test_cannot_start_twice() {
        let policy = policy();
        let ctx = ctx();
        let cooking = policy
            .execute(&ctx, &ticket(&["Soup"]), &KitchenAction::StartCooking)
            .unwrap()
            .into_owned();
        let err = policy.execute(&ctx, &cooking, &KitchenAction::StartCooking).unwrap_err();
        assert_eq!(err.to_string(), "Cannot start cooking from status: COOKING");
    }

    #[test]
    fn test_complete_items_until_ticket_completes() {
        let policy = policy();
        let ctx = ctx();
        let complete = |name: &str| KitchenAction::CompleteItem {
            item_name: name.to_string(),
        };

        let cooking = policy
            .execute(&ctx, &ticket(&["Burger", "Fries"]), &KitchenAction::StartCooking)
            .unwrap()
            .into_owned();
        let partial = policy.execute(&ctx, &cooking, &complete("Fries")).unwrap().into_owned();
        assert_eq!(partial.data().status, TicketStatus::Cooking);
        assert_eq!(partial.data().item("Fries").unwrap().status, TicketStatus::Completed);

        let done = policy.execute(&ctx, &partial, &complete("Burger")).unwrap().into_owned();
        assert_eq!(done.data().status, TicketStatus::Completed);
        assert_eq!(done.revision(), 4);
    }

    #[test]
    fn test_complete_requires_cooking_and_known_item() {
        let policy = policy();
        let ctx = ctx();
        let received = ticket(&["Soup"]);
        let err = policy
            .execute(
                &ctx,
                &received,
                &KitchenAction::CompleteItem {
                    item_name: "Soup".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot complete item from status: RECEIVED");

        let cooking = policy
            .execute(&ctx, &received, &KitchenAction::StartCooking)
            .unwrap()
            .into_owned();
        let err = policy
            .execute(
                &ctx,
                &cooking,
                &KitchenAction::CompleteItem {
                    item_name: "Pie".to_string(),
                },
            )
            .unwrap_err();
        assert!(err.is_business());
        assert_eq!(err.to_string(), "Ticket ticket-1 has no item named Pie");
    }
}
