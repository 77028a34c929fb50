//! Pull-based decoding of byte streams.
//!
//! For callers that prefer a `Stream` of events over the callback session.
//! Transport errors end the stream after being yielded; no flush happens in
//! that case, matching the session's failure path.

use futures_util::{Stream, StreamExt};
use std::pin::Pin;

use super::{DecoderConfig, StreamDecoder, Utf8StreamDecoder};
use crate::error::LlmError;
use crate::types::StreamEvent;

pub type UiEventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Decode a byte stream into events with the given configuration.
pub fn decode_event_stream<S, B>(byte_stream: S, config: DecoderConfig) -> UiEventStream
where
    S: Stream<Item = Result<B, LlmError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let out = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut utf8 = Utf8StreamDecoder::new();
        let mut decoder = StreamDecoder::with_config(config);

        while let Some(item) = byte_stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let text = utf8.decode(chunk.as_ref());
            for event in decoder.feed_collect(&text) {
                yield Ok(event);
            }
        }

        let tail = utf8.finish();
        let mut events = decoder.feed_collect(&tail);
        events.extend(decoder.flush_collect());
        for event in events {
            yield Ok(event);
        }
    };

    Box::pin(out)
}

/// Extension for turning a byte stream into a [`UiEventStream`].
pub trait UiEventStreamExt<B>: Stream<Item = Result<B, LlmError>> + Sized + Send + 'static
where
    B: AsRef<[u8]> + Send + 'static,
{
    fn into_ui_events(self) -> UiEventStream {
        decode_event_stream(self, DecoderConfig::default())
    }

    fn into_ui_events_with(self, config: DecoderConfig) -> UiEventStream {
        decode_event_stream(self, config)
    }
}

impl<S, B> UiEventStreamExt<B> for S
where
    S: Stream<Item = Result<B, LlmError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
}
