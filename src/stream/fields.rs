//! Cheap field extraction from JSON text
//!
//! These helpers never build a document. Each one scans forward for a literal
//! key pattern and reads the value that follows, so callers must ask for
//! fields in the order they appear in the payload: a key that lies behind the
//! cursor is reported as missing.

use compact_str::{CompactString, format_compact};
use tracing::trace;

use super::scanner::{ByteSource, StreamScanner};
use crate::{domain::FeedEvent, id::EventId};

/// Longest string value kept. Ids, event types and logins are far shorter.
pub const MAX_FIELD_LEN: usize = 256;

/// Finds `"name":"` and returns the string value up to the closing quote.
///
/// Escape sequences are returned as-is. `None` when the key is not ahead of
/// the cursor, the value is cut off, or it is longer than [`MAX_FIELD_LEN`].
pub async fn extract_string_field<S: ByteSource>(
    scanner: &mut StreamScanner<S>,
    name: &str,
) -> Option<CompactString> {
    let key = format_compact!("\"{name}\":\"");
    if !scanner.find(key.as_bytes()).await {
        return None;
    }

    let raw = scanner.read_until_unescaped(b'"', MAX_FIELD_LEN).await?;
    Some(String::from_utf8_lossy(&raw).into())
}

/// Finds `"name":` and reports whether the text up to the next comma starts
/// with `t`.
///
/// This is a heuristic, not a validator: a missing key, a value with no
/// trailing comma and `false` all read as false.
pub async fn extract_bool_field<S: ByteSource>(scanner: &mut StreamScanner<S>, name: &str) -> bool {
    let key = format_compact!("\"{name}\":");
    if !scanner.find(key.as_bytes()).await {
        return false;
    }

    // only the first byte matters, the rest is skipped without being kept
    match scanner.read_byte().await {
        Some(b',') | None => false,
        Some(first) => scanner.skip_until(b',').await && first == b't',
    }
}

/// Reads the first feed event in the payload.
///
/// Field order is `id`, `type`, then `merged`, which is the order GitHub
/// serializes events in. Missing `id` or `type` yields the sentinel.
pub async fn parse_feed_event<S: ByteSource>(scanner: &mut StreamScanner<S>) -> FeedEvent {
    let Some(raw_id) = extract_string_field(scanner, "id")
        .await
        .filter(|id| !id.is_empty())
    else {
        trace!("No id field in stream");
        return FeedEvent::sentinel();
    };

    let Some(kind) = extract_string_field(scanner, "type")
        .await
        .filter(|kind| !kind.is_empty())
    else {
        trace!(id = %raw_id, "No type field in stream");
        return FeedEvent::sentinel();
    };

    let id = EventId::parse_lossy(&raw_id);
    if id.is_sentinel() {
        trace!(id = %raw_id, "Event id is not numeric");
        return FeedEvent::sentinel();
    }

    let mut event = FeedEvent::new(id, kind, false);
    if event.is_pull_request() {
        event.is_merge = extract_bool_field(scanner, "merged").await;
    }

    trace!(
        id = %event.id,
        kind = %event.kind,
        is_merge = event.is_merge,
        bytes = scanner.consumed(),
        "Parsed feed event"
    );
    event
}
