//! Incremental relay of the upstream body to the client.
//!
//! Each upstream chunk is decoded and handed to the client before the next one
//! is pulled, so the client socket sets the pace. Output chunks are capped at
//! `chunk_size` bytes and never split a UTF-8 character.

use std::fmt::Display;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt};

use crate::config::UpstreamConfig;
use crate::observability::metrics;

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    pub chunk_size: usize,
    /// Longest wait for the next upstream chunk; `None` waits forever.
    pub chunk_timeout: Option<Duration>,
}

impl RelayOptions {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_timeout: config.chunk_timeout(),
        }
    }
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_timeout: None,
        }
    }
}

/// Streaming UTF-8 decoder that holds back an incomplete trailing sequence.
#[derive(Debug, Default)]
struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, chunk: &[u8], out: &mut BytesMut) {
        if self.carry.is_empty() {
            self.decode_from(chunk, out);
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.extend_from_slice(chunk);
            self.decode_from(&joined, out);
        }
    }

    fn decode_from(&mut self, mut rest: &[u8], out: &mut BytesMut) {
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.extend_from_slice(text.as_bytes());
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.extend_from_slice(&rest[..valid]);
                    match e.error_len() {
                        Some(invalid) => {
                            out.extend_from_slice(REPLACEMENT);
                            rest = &rest[valid + invalid..];
                        }
                        None => {
                            self.carry.extend_from_slice(&rest[valid..]);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Flush at end of stream; a dangling partial character becomes U+FFFD.
    fn finish(&mut self, out: &mut BytesMut) {
        if !self.carry.is_empty() {
            self.carry.clear();
            out.extend_from_slice(REPLACEMENT);
        }
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Split off at most `max` bytes of UTF-8 text, ending on a character boundary.
///
/// A single character longer than `max` is emitted whole.
fn take_chunk(pending: &mut BytesMut, max: usize) -> Bytes {
    if pending.len() <= max {
        return pending.split().freeze();
    }

    let mut end = max;
    while end > 0 && is_continuation(pending[end]) {
        end -= 1;
    }
    if end == 0 {
        end = max;
        while end < pending.len() && is_continuation(pending[end]) {
            end += 1;
        }
    }
    pending.split_to(end).freeze()
}

enum Pull<E> {
    Chunk(Bytes),
    End,
    Failed(E),
    Stalled,
}

struct RelayState<S> {
    upstream: S,
    decoder: Utf8Decoder,
    pending: BytesMut,
    options: RelayOptions,
    done: bool,
}

impl<S, E> RelayState<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    async fn pull(&mut self) -> Pull<E> {
        let next = match self.options.chunk_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.upstream.next()).await {
                Ok(next) => next,
                Err(_) => return Pull::Stalled,
            },
            None => self.upstream.next().await,
        };

        match next {
            Some(Ok(bytes)) => Pull::Chunk(bytes),
            Some(Err(e)) => Pull::Failed(e),
            None => Pull::End,
        }
    }
}

/// Turn an upstream byte stream into the client body stream.
///
/// Upstream failures end the stream with an error, which the HTTP layer turns
/// into an aborted (truncated) response. Dropping the returned stream drops the
/// upstream stream and with it the upstream connection.
pub fn relay<S, E>(upstream: S, options: RelayOptions) -> impl Stream<Item = io::Result<Bytes>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        upstream,
        decoder: Utf8Decoder::default(),
        pending: BytesMut::new(),
        options,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if !state.pending.is_empty() {
                let chunk = take_chunk(&mut state.pending, state.options.chunk_size);
                metrics::record_stream_bytes(chunk.len());
                return Some((Ok(chunk), state));
            }
            if state.done {
                return None;
            }

            match state.pull().await {
                Pull::Chunk(bytes) => state.decoder.decode(&bytes, &mut state.pending),
                Pull::End => {
                    state.decoder.finish(&mut state.pending);
                    state.done = true;
                }
                Pull::Failed(e) => {
                    tracing::warn!(error = %e, "Upstream stream failed, truncating response");
                    state.done = true;
                    return Some((Err(io::Error::other(e.to_string())), state));
                }
                Pull::Stalled => {
                    tracing::warn!(
                        timeout = ?state.options.chunk_timeout,
                        "Upstream stalled between chunks, truncating response"
                    );
                    state.done = true;
                    return Some((
                        Err(io::Error::new(io::ErrorKind::TimedOut, "upstream chunk timeout")),
                        state,
                    ));
                }
            }
        }
    })
}
