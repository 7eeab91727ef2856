// Copyright (c) 2026 Tessera Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Kitchen use cases.
//!
//! Every command runs through [`ExecutionKernel::run_command`]: load, decide,
//! stage the save, record the event. Nothing becomes visible before the unit
//! of work commits.
//!
//! With scheduled completion enabled, a successful `StartCooking` schedules
//! one `CompleteItem` per item on the clock, run later under the
//! `System:Clock` principal.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::application::{ExecutionKernel, OperationScope};
use tessera_core::infrastructure::InMemoryRepository;
use tessera_core::{
    scheduled_task, Clock, DecisionPolicy, DomainEvent, IdGenerator, Identified, KernelError, Repository,
};
use tracing::{info, warn};

use super::rules::{KitchenAction, KitchenRules};
use super::ticket::{KitchenItem, KitchenTicket, KitchenTicketData, TicketStatus};
use crate::world::SimulationApp;

pub const SYSTEM_CLOCK_PRINCIPAL: &str = "System:Clock";
const RESOURCE: &str = "KitchenTicket";

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "intent", content = "payload")]
pub enum KitchenCommand {
    PlaceOrder(PlaceOrder),
    StartCooking(StartCooking),
    CompleteItem(CompleteItem),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCooking {
    pub ticket_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteItem {
    pub ticket_id: String,
    pub item_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "query", content = "params")]
pub enum KitchenQuery {
    GetTicket(GetTicket),
    ListTickets,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTicket {
    pub ticket_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketView {
    pub status: TicketStatus,
    pub items: Vec<KitchenItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: String,
    pub status: TicketStatus,
    pub revision: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPlaced<'a> {
    ticket_id: &'a str,
    items: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketEvent<'a> {
    ticket_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_name: Option<&'a str>,
}

pub struct KitchenApp {
    service: Arc<KitchenService>,
}

struct KitchenService {
    kernel: ExecutionKernel,
    tickets: InMemoryRepository<KitchenTicket>,
    policy: DecisionPolicy<KitchenRules>,
    ids: Arc<dyn IdGenerator>,
    scheduled_completion: bool,
}

impl KitchenApp {
    pub fn new(kernel: ExecutionKernel, ids: Arc<dyn IdGenerator>, scheduled_completion: bool) -> Self {
        let policy = DecisionPolicy::new(KitchenRules, kernel.clock().clone());
        Self {
            service: Arc::new(KitchenService {
                kernel,
                tickets: InMemoryRepository::new(RESOURCE),
                policy,
                ids,
                scheduled_completion,
            }),
        }
    }

    pub fn kernel(&self) -> &ExecutionKernel {
        &self.service.kernel
    }

    pub fn tickets(&self) -> &InMemoryRepository<KitchenTicket> {
        &self.service.tickets
    }
}

#[async_trait]
impl SimulationApp for KitchenApp {
    type Command = KitchenCommand;
    type Query = KitchenQuery;

    const INTENTS: &'static [&'static str] = &["PlaceOrder", "StartCooking", "CompleteItem"];
    const QUERIES: &'static [&'static str] = &["GetTicket", "ListTickets"];

    async fn handle(&self, actor: &str, command: KitchenCommand) -> Result<Value, KernelError> {
        match command {
            KitchenCommand::PlaceOrder(cmd) => {
                let ticket_id = self.service.place_order(actor, cmd.items).await?;
                Ok(serde_json::json!({ "ticketId": ticket_id }))
            }
            KitchenCommand::StartCooking(cmd) => {
                self.service.start_cooking(actor, cmd.ticket_id).await?;
                Ok(Value::Null)
            }
            KitchenCommand::CompleteItem(cmd) => {
                self.service
                    .complete_item(Some(actor), cmd.ticket_id, cmd.item_name)
                    .await?;
                Ok(Value::Null)
            }
        }
    }

    async fn answer(&self, query: KitchenQuery) -> Result<Value, KernelError> {
        let view = match query {
            KitchenQuery::GetTicket(q) => serde_json::to_value(self.service.get_ticket(q.ticket_id).await?),
            KitchenQuery::ListTickets => serde_json::to_value(self.service.list_tickets().await?),
        };
        view.map_err(|e| KernelError::Other(anyhow::Error::new(e).context("ticket view")))
    }
}

fn event<P: Serialize>(scope: &OperationScope, name: &str, payload: &P) -> Result<(), KernelError> {
    scope.record_event(DomainEvent::with_payload(name, scope.clock().now(), payload)?)
}

impl KitchenService {
    async fn place_order(&self, actor: &str, items: Vec<String>) -> Result<String, KernelError> {
        self.kernel
            .run_command("PlaceOrder", Some(actor), |scope| async move {
                let ticket_id = self.ids.generate(Some("ticket"));
                let ticket = KitchenTicket::new(
                    ticket_id.clone(),
                    KitchenTicketData::received(&items),
                    scope.clock().as_ref(),
                )?;
                self.tickets.save(&scope, ticket).await?;
                event(
                    &scope,
                    "OrderPlaced",
                    &OrderPlaced {
                        ticket_id: &ticket_id,
                        items: &items,
                    },
                )?;
                Ok(ticket_id)
            })
            .await
    }

    async fn start_cooking(self: &Arc<Self>, actor: &str, ticket_id: String) -> Result<(), KernelError> {
        let cooking = self
            .kernel
            .run_command("StartCooking", Some(actor), |scope| async move {
                let ticket = self.tickets.find_by_id(scope.context(), &ticket_id).await?;
                let next = self
                    .policy
                    .execute(scope.context(), &ticket, &KitchenAction::StartCooking)?
                    .into_owned();
                let items = next.data().items.clone();
                self.tickets.save(&scope, next).await?;
                event(
                    &scope,
                    "CookingStarted",
                    &TicketEvent {
                        ticket_id: &ticket_id,
                        item_name: None,
                    },
                )?;
                Ok((ticket_id, items))
            })
            .await?;

        if self.scheduled_completion {
            let (ticket_id, items) = cooking;
            for item in items {
                self.schedule_completion(&ticket_id, &item);
            }
        }
        Ok(())
    }

    fn schedule_completion(self: &Arc<Self>, ticket_id: &str, item: &KitchenItem) {
        let delay_ms = item.cooking_minutes() * 60 * 1000;
        info!(ticket_id, item = %item.name, delay_ms, "Completion scheduled");

        let service = Arc::clone(self);
        let ticket_id = ticket_id.to_string();
        let item_name = item.name.clone();
        self.kernel.clock().schedule(
            delay_ms,
            scheduled_task(move || async move {
                if let Err(e) = service.complete_item(None, ticket_id.clone(), item_name.clone()).await {
                    warn!(ticket_id = %ticket_id, item = %item_name, error = %e, "Scheduled completion failed");
                }
            }),
        );
    }

    /// `actor == None` runs as the clock's system principal.
    async fn complete_item(
        &self,
        actor: Option<&str>,
        ticket_id: String,
        item_name: String,
    ) -> Result<(), KernelError> {
        let ctx = match actor {
            Some(actor) => self.kernel.contexts().create_command(Some(actor))?,
            None => self.kernel.contexts().create_system(SYSTEM_CLOCK_PRINCIPAL)?,
        };

        self.kernel
            .run_command_as("CompleteItem", ctx, |scope| async move {
                let ticket = self.tickets.find_by_id(scope.context(), &ticket_id).await?;
                let action = KitchenAction::CompleteItem {
                    item_name: item_name.clone(),
                };
                let next = self.policy.execute(scope.context(), &ticket, &action)?.into_owned();
                let completed = next.data().status == TicketStatus::Completed;
                self.tickets.save(&scope, next).await?;

                event(
                    &scope,
                    "ItemCompleted",
                    &TicketEvent {
                        ticket_id: &ticket_id,
                        item_name: Some(&item_name),
                    },
                )?;
                if completed {
                    event(
                        &scope,
                        "TicketCompleted",
                        &TicketEvent {
                            ticket_id: &ticket_id,
                            item_name: None,
                        },
                    )?;
                }
                Ok(())
            })
            .await
    }

    async fn get_ticket(&self, ticket_id: String) -> Result<TicketView, KernelError> {
        self.kernel
            .run_query("GetTicket", None, |scope| async move {
                let ticket = self.tickets.find_by_id(scope.context(), &ticket_id).await?;
                Ok(TicketView {
                    status: ticket.data().status,
                    items: ticket.data().items.clone(),
                })
            })
            .await
    }

    async fn list_tickets(&self) -> Result<Vec<TicketSummary>, KernelError> {
        self.kernel
            .run_query("ListTickets", None, |scope| async move {
                let tickets = self.tickets.find_all(scope.context()).await?;
                Ok(tickets
                    .iter()
                    .map(|ticket| TicketSummary {
                        id: ticket.id().clone(),
                        status: ticket.data().status,
                        revision: ticket.revision(),
                    })
                    .collect())
            })
            .await
    }
}
