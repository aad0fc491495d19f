use crate::filter::MessageFilter;
use crate::message::{ConsumedMessage, MessageError};
use tracing::{Level, debug, enabled, trace, warn};

/// Counters reported at the end of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub read: usize,
    pub matched: usize,
    pub skipped: usize,
}

/// Apply a filter to a stream of messages, handing each match to `on_match`
///
/// Undecodable envelopes and broker-side consume errors are logged and
/// skipped; I/O errors and errors from `on_match` stop the scan. Stops early once `limit` matches were handled.
pub fn scan_messages<I, F>(
    messages: I,
    filter: &MessageFilter,
    limit: Option<usize>,
    mut on_match: F,
) -> anyhow::Result<ScanStats>
where
    I: IntoIterator<Item = Result<ConsumedMessage, MessageError>>,
    F: FnMut(&ConsumedMessage) -> anyhow::Result<()>,
{
    let mut stats = ScanStats::default();
    if limit == Some(0) {
        return Ok(stats);
    }

    for result in messages {
        let msg = match result {
            Ok(msg) => msg,
            Err(e @ (MessageError::InvalidEnvelope { .. } | MessageError::Consume(_))) => {
                warn!("Skipping message: {e}");
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        stats.read += 1;

        if !filter.matches(msg.body()) {
            trace!(topic = %msg.topic, offset = msg.offset, "message does not match filter");
            continue;
        }

        stats.matched += 1;
        if enabled!(Level::DEBUG) {
            debug!(offset = msg.offset, hits = ?filter.explain(msg.body()), "message matched");
        }
        on_match(&msg)?;

        if limit.is_some_and(|n| stats.matched >= n) {
            break;
        }
    }

    Ok(stats)
}
