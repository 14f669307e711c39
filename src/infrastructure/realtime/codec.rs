//! STOMP 1.2 frame encoding.

use super::error::{ChannelError, ChannelResult};

const NULL: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompCommand {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl StompCommand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Send => "SEND",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CONNECT" | "STOMP" => Some(Self::Connect),
            "CONNECTED" => Some(Self::Connected),
            "SUBSCRIBE" => Some(Self::Subscribe),
            "UNSUBSCRIBE" => Some(Self::Unsubscribe),
            "SEND" => Some(Self::Send),
            "MESSAGE" => Some(Self::Message),
            "RECEIPT" => Some(Self::Receipt),
            "ERROR" => Some(Self::Error),
            "DISCONNECT" => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// CONNECT and CONNECTED headers are never escaped.
    const fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    #[must_use]
    pub const fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of a header; repeated headers keep the first occurrence.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());

        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(NULL);
        out
    }
}

/// Splits one websocket text message into frames. Heart-beat EOLs between
/// frames yield nothing.
///
/// # Errors
///
/// Returns `Protocol` for an unknown command or a malformed header.
pub fn decode(data: &str) -> ChannelResult<Vec<StompFrame>> {
    let mut frames = Vec::new();

    for chunk in data.split(NULL) {
        let chunk = chunk.trim_start_matches(['\r', '\n']);
        if chunk.is_empty() {
            continue;
        }
        frames.push(decode_frame(chunk)?);
    }

    Ok(frames)
}

fn decode_frame(chunk: &str) -> ChannelResult<StompFrame> {
    let (head, body) = chunk
        .split_once("\n\n")
        .or_else(|| chunk.split_once("\r\n\r\n"))
        .unwrap_or((chunk, ""));

    let mut lines = head.lines();
    let command_line = lines.next().unwrap_or_default().trim_end_matches('\r');
    let command = StompCommand::parse(command_line)
        .ok_or_else(|| ChannelError::protocol(format!("unknown command {command_line:?}")))?;

    let unescape = command.escapes_headers();
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ChannelError::protocol(format!("malformed header {line:?}")))?;
        if unescape {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let mut frame = StompFrame {
        command,
        headers,
        body: body.to_string(),
    };

    if let Some(length) = frame
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        && length < frame.body.len()
        && frame.body.is_char_boundary(length)
    {
        frame.body.truncate(length);
    }

    Ok(frame)
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> ChannelResult<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(ChannelError::protocol(format!(
                    "invalid header escape \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_connect_frame() {
        let frame = StompFrame::new(StompCommand::Connect)
            .header("accept-version", "1.2")
            .header("heart-beat", "4000,4000");

        assert_eq!(
            frame.encode(),
            "CONNECT\naccept-version:1.2\nheart-beat:4000,4000\n\n\0"
        );
    }

    #[test]
    fn test_decode_message_frame() {
        let data = "MESSAGE\ndestination:/topic/albums\nsubscription:sub-0\nmessage-id:1\ncontent-type:application/json\n\n{\"type\":\"NEW_ALBUM\"}\0\n";

        let frames = decode(data).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, StompCommand::Message);
        assert_eq!(frames[0].get("destination"), Some("/topic/albums"));
        assert_eq!(frames[0].body, r#"{"type":"NEW_ALBUM"}"#);
    }

    #[test]
    fn test_heartbeat_only_message_yields_no_frames() {
        assert!(decode("\n").unwrap().is_empty());
        assert!(decode("\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_header_escaping() {
        let frame = StompFrame::new(StompCommand::Send).header("note", "a:b\nc\\d");

        let decoded = decode(&frame.encode()).unwrap();

        assert_eq!(decoded[0].get("note"), Some("a:b\nc\\d"));
        assert!(frame.encode().contains("note:a\\cb\\nc\\\\d"));
    }

    #[test]
    fn test_connected_headers_are_raw() {
        let frames = decode("CONNECTED\nversion:1.2\nheart-beat:0,0\nserver:a\\cb\n\n\0").unwrap();

        assert_eq!(frames[0].get("server"), Some("a\\cb"));
        assert_eq!(frames[0].get("heart-beat"), Some("0,0"));
    }

    #[test]
    fn test_content_length_bounds_body() {
        let frames = decode("MESSAGE\ncontent-length:2\n\nokpadding\0").unwrap();
        assert_eq!(frames[0].body, "ok");
    }

    #[test]
    fn test_unknown_command_is_protocol_error() {
        assert!(matches!(
            decode("HELLO\n\n\0"),
            Err(ChannelError::Protocol { .. })
        ));
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let frames = decode("ERROR\nmessage:first\nmessage:second\n\nboom\0").unwrap();
        assert_eq!(frames[0].get("message"), Some("first"));
        assert_eq!(frames[0].body, "boom");
    }
}
