// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket data model shared by the ticket sources and the KPI engine.
//!
//! These records are owned by the upstream helpdesk. The engine reads them
//! and never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Upstream ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A support ticket as returned by the helpdesk API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default)]
    pub subject: Option<String>,
    /// Raw status code; see [`StatusBucket`] for the semantic mapping.
    pub status: i64,
    #[serde(default)]
    pub priority: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group_id: Option<u64>,
    #[serde(default)]
    pub responder_id: Option<u64>,
    #[serde(default)]
    pub requester_id: Option<u64>,
}

/// One entry of a ticket's conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// `true` when written by the requester, `false` when written by an agent.
    pub incoming: bool,
    /// Absent means public.
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// Semantic status derived from the raw integer code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    New,
    Open,
    Pending,
    Resolved,
    Closed,
    Waiting,
    Unknown,
}

impl StatusBucket {
    /// Maps a raw status code to its bucket. Unrecognised codes map to `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StatusBucket::New,
            2 => StatusBucket::Open,
            3 => StatusBucket::Pending,
            4 => StatusBucket::Resolved,
            5 => StatusBucket::Closed,
            6 => StatusBucket::Waiting,
            _ => StatusBucket::Unknown,
        }
    }

    /// The raw code for this bucket, `None` for `Unknown`.
    pub fn code(self) -> Option<i64> {
        match self {
            StatusBucket::New => Some(1),
            StatusBucket::Open => Some(2),
            StatusBucket::Pending => Some(3),
            StatusBucket::Resolved => Some(4),
            StatusBucket::Closed => Some(5),
            StatusBucket::Waiting => Some(6),
            StatusBucket::Unknown => None,
        }
    }

    /// Backlog is exactly Open, Pending and Waiting.
    pub fn is_backlog(self) -> bool {
        matches!(
            self,
            StatusBucket::Open | StatusBucket::Pending | StatusBucket::Waiting
        )
    }

    /// Resolved or Closed.
    pub fn is_resolved(self) -> bool {
        matches!(self, StatusBucket::Resolved | StatusBucket::Closed)
    }
}

/// Server-side filter passed to a ticket source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    /// Only tickets updated at or after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
