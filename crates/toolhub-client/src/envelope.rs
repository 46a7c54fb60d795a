//! Response envelopes returned to callers.

use crate::sanitize::Redaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one logical operation: a single call, or a finished page walk.
///
/// The body has already been sanitized with the policy named in `redaction`;
/// an envelope never carries raw fields alongside sanitized ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    /// HTTP status of the (last) response
    pub status: u16,

    /// Headers of the (last) response, lowercase names
    pub headers: BTreeMap<String, String>,

    /// Sanitized body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<T>,

    /// URL of the next page when the walk stopped early
    pub next_cursor: Option<String>,

    /// Collection size reported by the server, when parseable
    pub total_count: Option<u64>,

    /// Policy applied to the body
    pub redaction: Redaction,
}

impl<T> ResponseEnvelope<T> {
    /// Whether a further page can be requested.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Map the body, keeping all metadata.
    pub fn map<U, F>(self, f: F) -> ResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResponseEnvelope {
            status: self.status,
            headers: self.headers,
            body: self.body.map(f),
            next_cursor: self.next_cursor,
            total_count: self.total_count,
            redaction: self.redaction,
        }
    }
}
