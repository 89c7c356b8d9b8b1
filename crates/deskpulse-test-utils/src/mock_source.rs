// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock ticket source for deterministic testing.
//!
//! `MockTicketSource` implements `TicketSource` over in-memory data, counts
//! every call, and can be told to fail or to stall so cache and engine
//! behaviour can be observed without a helpdesk account.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use deskpulse_core::{Conversation, DeskError, Ticket, TicketId, TicketQuery, TicketSource};

#[derive(Default)]
struct State {
    tickets: Vec<Ticket>,
    conversations: HashMap<TicketId, Vec<Conversation>>,
    failing_conversations: HashSet<TicketId>,
    ticket_failure: Option<DeskError>,
    delay: Option<Duration>,
    queries: Vec<TicketQuery>,
}

/// An in-memory [`TicketSource`].
///
/// Tickets are returned in insertion order, filtered by
/// `TicketQuery::updated_since`. Tickets with no registered conversations
/// have an empty thread.
#[derive(Clone, Default)]
pub struct MockTicketSource {
    state: Arc<Mutex<State>>,
    ticket_calls: Arc<AtomicUsize>,
    conversation_calls: Arc<AtomicUsize>,
}

impl MockTicketSource {
    /// Create an empty mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source pre-loaded with tickets.
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                tickets,
                ..State::default()
            })),
            ..Self::default()
        }
    }

    pub async fn add_ticket(&self, ticket: Ticket) {
        self.state.lock().await.tickets.push(ticket);
    }

    /// Replace every ticket.
    pub async fn set_tickets(&self, tickets: Vec<Ticket>) {
        self.state.lock().await.tickets = tickets;
    }

    pub async fn set_conversations(&self, id: u64, entries: Vec<Conversation>) {
        self.state
            .lock()
            .await
            .conversations
            .insert(TicketId(id), entries);
    }

    /// Make `fetch_conversations` fail for one ticket.
    pub async fn fail_conversations_for(&self, id: u64) {
        self.state
            .lock()
            .await
            .failing_conversations
            .insert(TicketId(id));
    }

    /// Make every `fetch_tickets` call fail with `error` (`None` restores).
    pub async fn fail_tickets_with(&self, error: Option<DeskError>) {
        self.state.lock().await.ticket_failure = error;
    }

    /// Delay applied to every call, for overlapping concurrent requests.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        self.state.lock().await.delay = delay;
    }

    pub fn ticket_calls(&self) -> usize {
        self.ticket_calls.load(Ordering::SeqCst)
    }

    pub fn conversation_calls(&self) -> usize {
        self.conversation_calls.load(Ordering::SeqCst)
    }

    /// Every query passed to `fetch_tickets`, oldest first.
    pub async fn queries(&self) -> Vec<TicketQuery> {
        self.state.lock().await.queries.clone()
    }

    async fn pause(&self) {
        let delay = self.state.lock().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TicketSource for MockTicketSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, DeskError> {
        self.ticket_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let mut state = self.state.lock().await;
        state.queries.push(query.clone());
        if let Some(error) = &state.ticket_failure {
            return Err(error.clone());
        }
        Ok(state
            .tickets
            .iter()
            .filter(|t| query.updated_since.is_none_or(|since| t.updated_at >= since))
            .cloned()
            .collect())
    }

    async fn fetch_conversations(&self, ticket_id: TicketId) -> Result<Vec<Conversation>, DeskError> {
        self.conversation_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let state = self.state.lock().await;
        if state.failing_conversations.contains(&ticket_id) {
            return Err(DeskError::Upstream {
                message: format!("conversations for ticket {ticket_id} unavailable"),
                status: Some(500),
                source: None,
            });
        }
        Ok(state
            .conversations
            .get(&ticket_id)
            .cloned()
            .unwrap_or_default())
    }
}
