// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket and conversation fixtures.

use chrono::{DateTime, Utc};
use deskpulse_core::{Conversation, Ticket, TicketId};

/// Parses an RFC 3339 timestamp. Panics on malformed input (tests only).
pub fn ts(value: &str) -> DateTime<Utc> {
    value
        .parse()
        .unwrap_or_else(|e| panic!("invalid fixture timestamp {value:?}: {e}"))
}

/// Builder for [`Ticket`] with neutral defaults.
#[derive(Debug, Clone)]
pub struct TicketBuilder {
    ticket: Ticket,
}

impl TicketBuilder {
    /// An Open (2) ticket created and updated at `2025-12-14T10:00:00Z`.
    pub fn new(id: u64) -> Self {
        let created = ts("2025-12-14T10:00:00Z");
        Self {
            ticket: Ticket {
                id: TicketId(id),
                subject: Some(format!("Ticket {id}")),
                status: 2,
                priority: Some(1),
                created_at: created,
                updated_at: created,
                tags: Vec::new(),
                group_id: None,
                responder_id: None,
                requester_id: None,
            },
        }
    }

    pub fn status(mut self, status: i64) -> Self {
        self.ticket.status = status;
        self
    }

    pub fn subject(mut self, subject: &str) -> Self {
        self.ticket.subject = Some(subject.to_string());
        self
    }

    pub fn created(mut self, at: &str) -> Self {
        self.ticket.created_at = ts(at);
        self
    }

    pub fn updated(mut self, at: &str) -> Self {
        self.ticket.updated_at = ts(at);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.ticket.tags.push(tag.to_string());
        self
    }

    pub fn group(mut self, group_id: u64) -> Self {
        self.ticket.group_id = Some(group_id);
        self
    }

    pub fn responder(mut self, agent_id: u64) -> Self {
        self.ticket.responder_id = Some(agent_id);
        self
    }

    pub fn build(self) -> Ticket {
        self.ticket
    }
}

/// A public reply written by an agent.
pub fn agent_reply(at: &str) -> Conversation {
    Conversation {
        id: None,
        created_at: ts(at),
        incoming: false,
        private: Some(false),
        user_id: None,
    }
}

/// A private note written by an agent.
pub fn agent_note(at: &str) -> Conversation {
    Conversation {
        private: Some(true),
        ..agent_reply(at)
    }
}

/// A message from the requester.
pub fn requester_message(at: &str) -> Conversation {
    Conversation {
        incoming: true,
        private: None,
        ..agent_reply(at)
    }
}
