//! AOF Replay
//!
//! Decodes records one after another and hands each to a callback.

use std::io::BufRead;

use tracing::{trace, warn};

use crate::error::{KvError, Result};
use crate::protocol::{Decoder, Value};

/// Result of a replay pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    /// Number of complete records handed to the callback
    pub records_replayed: u64,

    /// Offset just past the last complete record
    pub bytes_replayed: u64,

    /// Length of the incomplete tail removed from the file
    pub bytes_discarded: u64,

    /// Whether the file ended in the middle of a record
    pub was_truncated: bool,
}

/// Decode records until the stream ends
///
/// - clean end at a record boundary: stop
/// - end inside a record: stop, `was_truncated = true`
/// - anything else: `ReplayFailure`
pub(super) fn replay_records<R, F>(reader: R, callback: &mut F) -> Result<ReplayResult>
where
    R: BufRead,
    F: FnMut(Value),
{
    let mut decoder = Decoder::new(reader);
    let mut result = ReplayResult::default();

    loop {
        match decoder.read_value() {
            Ok(value) => {
                trace!(
                    "Replaying record {} at offset {}",
                    result.records_replayed + 1,
                    result.bytes_replayed
                );
                callback(value);
                result.records_replayed += 1;
                result.bytes_replayed = decoder.position();
            }
            Err(KvError::EndOfStream) => break,
            Err(KvError::UnexpectedEndOfStream) => {
                warn!(
                    "Incomplete record at offset {} after {} complete records",
                    result.bytes_replayed, result.records_replayed
                );
                result.was_truncated = true;
                break;
            }
            Err(e) => {
                return Err(KvError::ReplayFailure(format!(
                    "record {} at offset {}: {}",
                    result.records_replayed + 1,
                    result.bytes_replayed,
                    e
                )));
            }
        }
    }

    Ok(result)
}
