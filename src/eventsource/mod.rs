//! Server-sent event framing for streaming generation responses.

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use log::warn;
use reqwest::Response;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

const FRAME_DELIMITERS: [&str; 2] = ["\r\n\r\n", "\n\n"];
const FIELD_SEPARATOR: char = ':';

pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event, reqwest::Error>> + Send>>;

#[derive(Error, Debug)]
pub enum EventError {
    #[error("failed to parse retry value: {0}")]
    RetryParse(#[from] std::num::ParseIntError),
    #[error("invalid event format: event contains no data")]
    InvalidFormat,
}

/// A single dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub id: Option<String>,
    pub event_type: Option<String>,
    /// Payload, with multiple `data:` lines joined by `\n`
    pub data: String,
    pub retry: Option<Duration>,
}

impl Event {
    /// Parses one frame (the text between two blank lines).
    ///
    /// Lines starting with `:` are comments and unknown fields are ignored.
    /// A frame without any `data` field is rejected.
    pub fn parse(frame: &str) -> Result<Self, EventError> {
        let mut event = Self::default();
        let mut data_lines: Vec<&str> = Vec::new();

        for line in frame.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with(FIELD_SEPARATOR) {
                continue;
            }

            let (field, value) = line.split_once(FIELD_SEPARATOR).unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "id" => event.id = Some(value.to_string()),
                "event" => event.event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                "retry" => event.retry = Some(Duration::from_millis(value.parse()?)),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return Err(EventError::InvalidFormat);
        }

        event.data = data_lines.join("\n");
        Ok(event)
    }
}

/// Finds the end of the first complete frame in `buffer`.
///
/// Returns the frame length and the length of the delimiter that closed it.
fn next_frame(buffer: &[u8]) -> Option<(usize, usize)> {
    FRAME_DELIMITERS
        .iter()
        .filter_map(|delimiter| {
            buffer
                .windows(delimiter.len())
                .position(|window| window == delimiter.as_bytes())
                .map(|at| (at, delimiter.len()))
        })
        .min_by_key(|(at, _)| *at)
}

fn dispatch(frame: &[u8]) -> Option<Event> {
    // Frames end on ASCII delimiters, so a complete frame never splits a character.
    match Event::parse(&String::from_utf8_lossy(frame)) {
        Ok(event) => Some(event),
        Err(EventError::InvalidFormat) => None,
        Err(e) => {
            warn!("[SSE] dropping malformed frame: {e}");
            None
        }
    }
}

/// Accumulates raw body bytes and hands out complete events.
#[derive(Debug, Default)]
struct FrameBuffer {
    bytes: Vec<u8>,
}

impl FrameBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Pops the next complete frame that carries data.
    fn next_event(&mut self) -> Option<Event> {
        while let Some((frame_len, delimiter_len)) = next_frame(&self.bytes) {
            let event = dispatch(&self.bytes[..frame_len]);
            self.bytes.drain(..frame_len + delimiter_len);
            if event.is_some() {
                return event;
            }
        }
        None
    }

    /// Parses whatever is left once the body has ended.
    fn finish(self) -> Option<Event> {
        dispatch(&self.bytes)
    }
}

pub trait EventSourceExt {
    /// Converts a streaming response body into parsed events.
    fn events(self) -> EventStream;
}

impl EventSourceExt for Response {
    fn events(self) -> EventStream {
        Box::pin(try_stream! {
            let mut body = self.bytes_stream();
            let mut frames = FrameBuffer::default();

            while let Some(chunk) = body.next().await {
                frames.push(&chunk?);
                while let Some(event) = frames.next_event() {
                    yield event;
                }
            }

            if let Some(event) = frames.finish() {
                yield event;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_parse_empty() {
        assert!(matches!(Event::parse(""), Err(EventError::InvalidFormat)));
    }

    #[test]
    fn test_event_parse_comment_only() {
        assert!(matches!(
            Event::parse(": keep-alive\n"),
            Err(EventError::InvalidFormat)
        ));
    }

    #[test]
    fn test_event_parse_simple() {
        let event = Event::parse("data: {\"token\":1}\n\n").unwrap();
        assert_eq!(event.data, "{\"token\":1}");
        assert!(event.id.is_none());
        assert!(event.event_type.is_none());
    }

    #[test]
    fn test_event_parse_crlf_and_multiline() {
        let event = Event::parse("id: 7\r\nevent: token\r\ndata:a\r\ndata: b\r\nretry: 250\r\n").unwrap();
        assert_eq!(event.id.as_deref(), Some("7"));
        assert_eq!(event.event_type.as_deref(), Some("token"));
        assert_eq!(event.data, "a\nb");
        assert_eq!(event.retry, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_event_parse_invalid_retry() {
        assert!(matches!(
            Event::parse("retry: soon\ndata: x\n"),
            Err(EventError::RetryParse(_))
        ));
    }

    #[test]
    fn test_next_frame_picks_earliest_delimiter() {
        assert_eq!(next_frame(b"data: a\n\ndata: b\r\n\r\n"), Some((7, 2)));
        assert_eq!(next_frame(b"data: a\r\n\r\ndata: b\n\n"), Some((7, 4)));
        assert_eq!(next_frame(b"data: partial"), None);
    }

    #[test]
    fn test_frame_buffer_keeps_characters_split_across_chunks() {
        let body = "data: caf\u{e9}\n\n".as_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut frames = FrameBuffer::default();
        frames.push(&body[..split]);
        assert!(frames.next_event().is_none());
        frames.push(&body[split..]);

        assert_eq!(frames.next_event().unwrap().data, "caf\u{e9}");
        assert!(frames.next_event().is_none());
    }

    #[test]
    fn test_frame_buffer_skips_comment_frames() {
        let mut frames = FrameBuffer::default();
        frames.push(b": keep-alive\n\ndata: a\n\ndata: b");

        assert_eq!(frames.next_event().unwrap().data, "a");
        assert!(frames.next_event().is_none());
        assert_eq!(frames.finish().unwrap().data, "b");
    }
}
