// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the KPI engine.
//!
//! Traits use `#[async_trait]` so sources can be held as `Arc<dyn TicketSource>`.

pub mod source;

pub use source::TicketSource;
