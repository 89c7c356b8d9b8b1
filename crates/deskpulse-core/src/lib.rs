// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for deskpulse.
//!
//! This crate provides the error types, the ticket data model and the
//! [`TicketSource`] trait shared by the KPI engine and the helpdesk clients.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ContractViolation, DeskError};
pub use traits::TicketSource;
pub use types::{Conversation, StatusBucket, Ticket, TicketId, TicketQuery};
