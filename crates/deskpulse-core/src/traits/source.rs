// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket source trait for helpdesk integrations (Freshdesk, mocks).

use async_trait::async_trait;

use crate::error::DeskError;
use crate::types::{Conversation, Ticket, TicketId, TicketQuery};

/// Read-only access to an upstream helpdesk.
///
/// A failed `fetch_tickets` is fatal for the request that issued it. A failed
/// `fetch_conversations` only removes that ticket from response-time samples;
/// the engine decides that, implementations just report the error.
#[async_trait]
pub trait TicketSource: Send + Sync + 'static {
    /// Human-readable name of this source, used in logs.
    fn name(&self) -> &str;

    /// Fetches every ticket matching the query, across all pages.
    async fn fetch_tickets(&self, query: &TicketQuery) -> Result<Vec<Ticket>, DeskError>;

    /// Fetches the conversation thread of one ticket.
    async fn fetch_conversations(&self, ticket_id: TicketId)
    -> Result<Vec<Conversation>, DeskError>;
}
