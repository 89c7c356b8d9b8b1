// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for deskpulse integration tests.
//!
//! Provides a mock ticket source and ticket fixtures for fast,
//! deterministic tests without a helpdesk account.
//!
//! # Components
//!
//! - [`MockTicketSource`] - in-memory tickets and conversations with call
//!   counters, delays and failure injection
//! - [`fixtures`] - builders for tickets and conversation entries

pub mod fixtures;
pub mod mock_source;

pub use fixtures::{TicketBuilder, agent_note, agent_reply, requester_message, ts};
pub use mock_source::MockTicketSource;
