//! Decoder for the `text/event-stream` live-update channel.
//!
//! Bytes arrive in arbitrary chunks; [`EventStreamDecoder::push`] buffers
//! partial lines and yields each frame once its terminating blank line is seen.

use crate::error::AppResult;
use crate::models::{ActivityEvent, LiveEvent, RsvpEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

impl SseFrame {
    /// Frames without an `event:` field are plain messages.
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_event_id: Option<String>,
    retry_ms: Option<u64>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recent frame that carried one; sent back on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay requested by the server, if any.
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => log::trace!("Ignoring unknown event-stream field {field}"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event,
            id: self.last_event_id.clone(),
            data,
        })
    }
}

/// Maps a frame onto the events the client understands.
pub fn decode_event(frame: &SseFrame) -> AppResult<LiveEvent> {
    Ok(match frame.event_name() {
        "activity" => LiveEvent::Activity(serde_json::from_str::<ActivityEvent>(&frame.data)?),
        "rsvp" => LiveEvent::Rsvp(serde_json::from_str::<RsvpEvent>(&frame.data)?),
        "keepalive" => LiveEvent::Keepalive,
        other => LiveEvent::Other {
            event: other.to_string(),
            data: frame.data.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.push(b"event: keepalive\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event_name(), "keepalive");
        assert_eq!(frames[0].data, "{}");
        assert_eq!(decode_event(&frames[0]).unwrap(), LiveEvent::Keepalive);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: activ").is_empty());
        assert!(decoder.push(b"ity\r\nid: 7\r\ndata: {\"votes\":").is_empty());
        let frames = decoder.push(b"[{\"id\":\"a\",\"votes\":3}]}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id.as_deref(), Some("7"));
        assert_eq!(decoder.last_event_id(), Some("7"));

        match decode_event(&frames[0]).unwrap() {
            LiveEvent::Activity(activity) => {
                assert_eq!(activity.votes.len(), 1);
                assert_eq!(activity.votes[0].votes, 3);
            }
            other => panic!("expected activity, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.push(b": ping\ndata: first\ndata:second\nretry: 3000\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event_name(), "message");
        assert_eq!(frames[0].data, "first\nsecond");
        assert_eq!(decoder.retry_ms(), Some(3000));
    }

    #[test]
    fn test_frame_without_data_is_dropped() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: lonely\n\n").is_empty());
        // the dropped frame's event name must not leak into the next one
        let frames = decoder.push(b"data: hi\n\n");
        assert_eq!(frames[0].event_name(), "message");
    }

    #[test]
    fn test_several_frames_in_one_chunk() {
        let mut decoder = EventStreamDecoder::new();
        let frames = decoder.push(
            b"event: rsvp\ndata: {\"user\":{\"name\":\"Kim\"},\"value\":\"yes\"}\n\n\
              event: connectioncount\ndata: 3\n\n",
        );
        assert_eq!(frames.len(), 2);
        match decode_event(&frames[0]).unwrap() {
            LiveEvent::Rsvp(rsvp) => assert_eq!(rsvp.value, "yes"),
            other => panic!("expected rsvp, got {other:?}"),
        }
        assert_eq!(
            decode_event(&frames[1]).unwrap(),
            LiveEvent::Other {
                event: "connectioncount".into(),
                data: "3".into()
            }
        );
    }

    #[test]
    fn test_malformed_activity_is_an_error() {
        let frame = SseFrame {
            event: Some("activity".into()),
            id: None,
            data: "{not json".into(),
        };
        assert!(decode_event(&frame).is_err());
    }
}
