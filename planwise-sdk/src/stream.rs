use futures_util::StreamExt;
use thiserror::Error;

use crate::{client::ReplyStream, error::PlannerError};

/// Mid-stream failure. The accumulated text survives so the caller can keep
/// showing whatever the assistant already said.
#[derive(Debug, Error)]
#[error("reply stream failed: {source}")]
pub struct StreamFailure {
    pub partial: String,
    #[source]
    pub source: PlannerError,
}

/// Consume a reply stream to completion, invoking `on_chunk` with the full
/// accumulated text after every chunk.
///
/// Chunks are raw bytes and may split multi-byte UTF-8 sequences; the split
/// tail is carried over to the next chunk instead of being decoded lossily.
pub async fn read_reply<F>(mut stream: ReplyStream, mut on_chunk: F) -> Result<String, StreamFailure>
where
    F: FnMut(&str),
{
    let mut text = String::new();
    let mut pending: Vec<u8> = Vec::new();

    while let Some(next) = stream.next().await {
        match next {
            Ok(bytes) => {
                pending.extend_from_slice(&bytes);
                drain_valid_utf8(&mut pending, &mut text);
                on_chunk(&text);
            }
            Err(source) => {
                return Err(StreamFailure {
                    partial: text,
                    source,
                });
            }
        }
    }

    // A truncated sequence at end-of-stream has no continuation coming.
    if !pending.is_empty() {
        text.push_str(&String::from_utf8_lossy(&pending));
        on_chunk(&text);
    }

    Ok(text)
}

/// Move every complete UTF-8 sequence from `pending` into `text`, replacing
/// invalid sequences and keeping a truncated trailing sequence buffered.
fn drain_valid_utf8(pending: &mut Vec<u8>, text: &mut String) {
    loop {
        match std::str::from_utf8(pending) {
            Ok(s) => {
                text.push_str(s);
                pending.clear();
                return;
            }
            Err(err) => {
                let valid = err.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match err.error_len() {
                    Some(invalid) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + invalid);
                    }
                    None => {
                        // Truncated sequence; wait for the next chunk.
                        pending.drain(..valid);
                        return;
                    }
                }
            }
        }
    }
}
