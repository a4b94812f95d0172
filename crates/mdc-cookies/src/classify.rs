//! Response classification.
//!
//! Matching is literal, case-insensitive substring containment over the
//! target's indicator lists. Rules are checked in a fixed order and the
//! first match wins:
//!
//! 1. transport failure → `Timeout` / `SslError` / `NetworkError`
//! 2. 200 + block indicator → `Blocked` (even if a success indicator is present)
//! 3. 200 + success indicator → `Success`
//! 4. 200 → `Warning`
//! 5. 403 → `Forbidden`
//! 6. 404 → `NotFound`
//! 7. anything else → `NetworkError` ("HTTP <code>")

use crate::probe::ProbeResponse;
use crate::targets::TestTarget;
use crate::types::{Classification, Outcome, TransportError};

/// Longest transport message carried into a reason.
pub const MAX_REASON_LEN: usize = 200;

/// Classify an HTTP reply by status code and body text.
pub fn classify(status: u16, body: &str, target: &TestTarget) -> Classification {
    match status {
        200 => {
            let body = body.to_lowercase();
            if contains_any(&body, &target.block_indicators) {
                Classification::new(Outcome::Blocked, "Cloudflare or bot protection active")
            } else if contains_any(&body, &target.success_indicators) {
                Classification::new(Outcome::Success, "authenticated")
            } else {
                Classification::new(
                    Outcome::Warning,
                    "page loaded but content unexpected; page structure may have changed",
                )
            }
        }
        403 => Classification::new(Outcome::Forbidden, "cookies rejected or expired"),
        404 => Classification::new(Outcome::NotFound, "test target may be invalid"),
        code => Classification::new(Outcome::NetworkError, format!("HTTP {code}")),
    }
}

/// Classify a failure that happened before any status code arrived.
pub fn classify_failure(err: &TransportError) -> Classification {
    let outcome = match err {
        TransportError::Timeout { .. } => Outcome::Timeout,
        TransportError::Tls(_) => Outcome::SslError,
        TransportError::Connect(_) | TransportError::Other(_) => Outcome::NetworkError,
    };
    Classification::new(outcome, truncate(&err.to_string(), MAX_REASON_LEN))
}

/// Classify whatever the probe client returned.
pub fn classify_response(
    response: &Result<ProbeResponse, TransportError>,
    target: &TestTarget,
) -> Classification {
    match response {
        Ok(resp) => classify(resp.status, &resp.body, target),
        Err(err) => classify_failure(err),
    }
}

fn contains_any(haystack_lower: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack_lower.contains(&needle.to_lowercase()))
}

/// Cut `s` to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
