// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Freshdesk v2 ticket source for deskpulse.
//!
//! [`FreshdeskClient`] implements [`deskpulse_core::TicketSource`]: paginated
//! ticket listing, per-ticket conversation threads, basic authentication
//! with the API key, and a bounded retry on transient HTTP statuses.

pub mod client;
pub mod types;

pub use client::FreshdeskClient;
