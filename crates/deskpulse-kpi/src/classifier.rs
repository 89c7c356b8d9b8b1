// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket status and conversation classification.
//!
//! Pure functions: no I/O, no allocation beyond the returned partitions,
//! never panics.

use deskpulse_core::{Conversation, StatusBucket, Ticket};

/// True iff `code` is Open (2), Pending (3) or Waiting (6).
///
/// Resolved (4) and Closed (5) are never backlog, under any metric.
pub fn is_backlog_status(code: i64) -> bool {
    StatusBucket::from_code(code).is_backlog()
}

/// True iff `code` is Resolved (4) or Closed (5).
pub fn is_resolved_status(code: i64) -> bool {
    StatusBucket::from_code(code).is_resolved()
}

/// An agent-authored entry the requester can see.
///
/// `private == None` counts as public.
pub fn is_public_agent_reply(entry: &Conversation) -> bool {
    !entry.incoming && entry.private != Some(true)
}

/// The earliest public agent reply in a thread.
pub fn first_public_agent_reply(entries: &[Conversation]) -> Option<&Conversation> {
    entries
        .iter()
        .filter(|e| is_public_agent_reply(e))
        .min_by_key(|e| e.created_at)
}

/// False when the ticket was last updated before it was created.
pub fn has_consistent_timestamps(ticket: &Ticket) -> bool {
    ticket.updated_at >= ticket.created_at
}

/// Tickets split by semantic bucket.
#[derive(Debug, Default)]
pub struct StatusPartition<'a> {
    pub backlog: Vec<&'a Ticket>,
    pub resolved: Vec<&'a Ticket>,
    /// New and unknown codes.
    pub other: Vec<&'a Ticket>,
}

impl<'a> StatusPartition<'a> {
    pub fn of(tickets: &'a [Ticket]) -> Self {
        let mut partition = Self::default();
        for ticket in tickets {
            let bucket = StatusBucket::from_code(ticket.status);
            if bucket.is_backlog() {
                partition.backlog.push(ticket);
            } else if bucket.is_resolved() {
                partition.resolved.push(ticket);
            } else {
                partition.other.push(ticket);
            }
        }
        partition
    }

    /// Raw status codes of the backlog tickets, for the consistency guard.
    pub fn backlog_statuses(&self) -> Vec<i64> {
        self.backlog.iter().map(|t| t.status).collect()
    }
}
