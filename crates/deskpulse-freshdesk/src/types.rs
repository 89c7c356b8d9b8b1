// SPDX-FileCopyrightText: 2026 Deskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Freshdesk API error payloads.

use serde::Deserialize;

/// Error body returned by the Freshdesk v2 API.
///
/// Validation failures carry `description` and `errors`; authentication and
/// access failures carry `code` and `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiErrorResponse {
    /// One-line summary, `None` when the body carried nothing useful.
    pub fn summary(&self) -> Option<String> {
        let head = self
            .message
            .clone()
            .or_else(|| self.description.clone())?;
        let details: Vec<String> = self
            .errors
            .iter()
            .filter_map(|e| match (&e.field, &e.message) {
                (Some(field), Some(message)) => Some(format!("{field}: {message}")),
                (None, Some(message)) => Some(message.clone()),
                _ => e.code.clone(),
            })
            .collect();
        let head = match &self.code {
            Some(code) => format!("{head} ({code})"),
            None => head,
        };
        if details.is_empty() {
            Some(head)
        } else {
            Some(format!("{head}: {}", details.join("; ")))
        }
    }
}
