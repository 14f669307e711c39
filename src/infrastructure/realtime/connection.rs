use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace, warn};

use super::codec::{self, StompCommand, StompFrame};
use super::constants::{
    CONNECTION_TIMEOUT, HANDSHAKE_TIMEOUT, HEARTBEAT_INCOMING, HEARTBEAT_OUTGOING, STOMP_VERSION,
};
use super::error::{ChannelError, ChannelResult};
use super::heartbeat::Heartbeat;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

const HEARTBEAT_FRAME: &str = "\n";

/// Opens broker sessions. One call per connection attempt.
#[async_trait]
pub trait BusConnector: Send + Sync {
    async fn connect(&self) -> ChannelResult<Box<dyn BusConnection>>;
}

/// An established, handshaken broker session.
#[async_trait]
pub trait BusConnection: Send {
    async fn subscribe(&mut self, destination: &str) -> ChannelResult<()>;

    /// Waits for the next `MESSAGE` body. Keeps heart-beats flowing while
    /// waiting.
    async fn next_message(&mut self) -> ChannelResult<String>;

    /// Sends `DISCONNECT` and closes the socket. Never fails.
    async fn close(&mut self);
}

/// STOMP over a plain WebSocket.
#[derive(Debug, Clone)]
pub struct StompConnector {
    url: String,
    host: String,
    heartbeat_outgoing: Duration,
    heartbeat_incoming: Duration,
}

impl StompConnector {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let host = virtual_host(&url);
        Self {
            url,
            host,
            heartbeat_outgoing: HEARTBEAT_OUTGOING,
            heartbeat_incoming: HEARTBEAT_INCOMING,
        }
    }

    #[must_use]
    pub const fn with_heartbeats(mut self, outgoing: Duration, incoming: Duration) -> Self {
        self.heartbeat_outgoing = outgoing;
        self.heartbeat_incoming = incoming;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn handshake(&self, writer: &mut WsWriter, reader: &mut WsReader) -> ChannelResult<Heartbeat> {
        let connect = StompFrame::new(StompCommand::Connect)
            .header("accept-version", STOMP_VERSION)
            .header("host", self.host.as_str())
            .header(
                "heart-beat",
                Heartbeat::offer(self.heartbeat_outgoing, self.heartbeat_incoming),
            );
        send_text(writer, connect.encode()).await?;

        loop {
            let text = read_text(writer, reader).await?;
            for frame in codec::decode(&text)? {
                match frame.command {
                    StompCommand::Connected => {
                        debug!(
                            version = frame.get("version"),
                            server = frame.get("server"),
                            "STOMP session established"
                        );
                        return Heartbeat::negotiate(
                            self.heartbeat_outgoing,
                            self.heartbeat_incoming,
                            frame.get("heart-beat"),
                        );
                    }
                    StompCommand::Error => return Err(broker_error(&frame)),
                    other => trace!(command = other.as_str(), "Ignoring frame before CONNECTED"),
                }
            }
        }
    }
}

#[async_trait]
impl BusConnector for StompConnector {
    async fn connect(&self) -> ChannelResult<Box<dyn BusConnection>> {
        debug!(url = %self.url, "Opening broker connection");

        let (stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .map_err(|_| ChannelError::timeout("connection"))?
            .map_err(|e| ChannelError::connection_failed(e.to_string()))?;

        let (mut writer, mut reader) = stream.split();

        let heartbeat = timeout(HANDSHAKE_TIMEOUT, self.handshake(&mut writer, &mut reader))
            .await
            .map_err(|_| ChannelError::timeout("CONNECTED frame"))??;

        debug!(
            outgoing = ?heartbeat.outgoing,
            incoming = ?heartbeat.incoming,
            "Negotiated heart-beats"
        );

        Ok(Box::new(StompConnection::new(writer, reader, heartbeat)))
    }
}

pub struct StompConnection {
    writer: WsWriter,
    reader: WsReader,
    heartbeat: Heartbeat,
    last_sent: Instant,
    last_received: Instant,
    pending: VecDeque<String>,
    subscription: Option<String>,
    closed: bool,
}

impl StompConnection {
    fn new(writer: WsWriter, reader: WsReader, heartbeat: Heartbeat) -> Self {
        let now = Instant::now();
        Self {
            writer,
            reader,
            heartbeat,
            last_sent: now,
            last_received: now,
            pending: VecDeque::new(),
            subscription: None,
            closed: false,
        }
    }

    async fn send_frame(&mut self, frame: &StompFrame) -> ChannelResult<()> {
        send_text(&mut self.writer, frame.encode()).await?;
        self.last_sent = Instant::now();
        Ok(())
    }

    fn accept(&mut self, text: &str) -> ChannelResult<()> {
        for frame in codec::decode(text)? {
            match frame.command {
                StompCommand::Message => {
                    if let (Some(expected), Some(actual)) =
                        (self.subscription.as_deref(), frame.get("subscription"))
                        && expected != actual
                    {
                        debug!(subscription = actual, "Dropping message for unknown subscription");
                        continue;
                    }
                    self.pending.push_back(frame.body);
                }
                StompCommand::Error => return Err(broker_error(&frame)),
                other => trace!(command = other.as_str(), "Ignoring frame"),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BusConnection for StompConnection {
    async fn subscribe(&mut self, destination: &str) -> ChannelResult<()> {
        let id = format!("sub-{}", uuid::Uuid::new_v4().simple());
        let frame = StompFrame::new(StompCommand::Subscribe)
            .header("id", id.as_str())
            .header("destination", destination)
            .header("ack", "auto");

        self.send_frame(&frame).await?;
        debug!(destination, id = %id, "Subscribed");
        self.subscription = Some(id);
        Ok(())
    }

    async fn next_message(&mut self) -> ChannelResult<String> {
        loop {
            if let Some(body) = self.pending.pop_front() {
                return Ok(body);
            }

            let beat_at = self.heartbeat.outgoing.map(|interval| self.last_sent + interval);
            let dead_at = self
                .heartbeat
                .incoming_timeout()
                .map(|grace| self.last_received + grace);

            tokio::select! {
                received = self.reader.next() => {
                    self.last_received = Instant::now();
                    match received {
                        Some(Ok(WsMessage::Text(text))) => self.accept(text.as_str())?,
                        Some(Ok(WsMessage::Binary(data))) => {
                            let text = std::str::from_utf8(&data)
                                .map_err(|e| ChannelError::protocol(e.to_string()))?;
                            self.accept(text)?;
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            let _ = self.writer.send(WsMessage::Pong(data)).await;
                        }
                        Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                        Some(Ok(WsMessage::Close(frame))) => {
                            self.closed = true;
                            return Err(close_error(frame));
                        }
                        Some(Err(e)) => {
                            self.closed = true;
                            return Err(ChannelError::websocket(e.to_string()));
                        }
                        None => {
                            self.closed = true;
                            return Err(ChannelError::closed(1000, "Stream ended"));
                        }
                    }
                }
                () = sleep_until_some(beat_at) => {
                    send_text(&mut self.writer, HEARTBEAT_FRAME.to_string()).await?;
                    self.last_sent = Instant::now();
                    trace!("Sent heart-beat");
                }
                () = sleep_until_some(dead_at) => {
                    warn!("No heart-beat from broker");
                    return Err(ChannelError::HeartbeatTimeout);
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.send_frame(&StompFrame::new(StompCommand::Disconnect)).await {
            debug!(error = %e, "DISCONNECT not delivered");
        }
        let _ = self.writer.close().await;
        debug!("Broker connection closed");
    }
}

async fn sleep_until_some(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn send_text(writer: &mut WsWriter, text: String) -> ChannelResult<()> {
    writer
        .send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| ChannelError::websocket(e.to_string()))
}

async fn read_text(writer: &mut WsWriter, reader: &mut WsReader) -> ChannelResult<String> {
    loop {
        match reader.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(text.as_str().to_string()),
            Some(Ok(WsMessage::Binary(data))) => {
                return String::from_utf8(data.to_vec())
                    .map_err(|e| ChannelError::protocol(e.to_string()));
            }
            Some(Ok(WsMessage::Ping(data))) => {
                let _ = writer.send(WsMessage::Pong(data)).await;
            }
            Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
            Some(Ok(WsMessage::Close(frame))) => return Err(close_error(frame)),
            Some(Err(e)) => return Err(ChannelError::websocket(e.to_string())),
            None => return Err(ChannelError::closed(1000, "Stream ended")),
        }
    }
}

fn close_error(
    frame: Option<tokio_tungstenite::tungstenite::protocol::CloseFrame>,
) -> ChannelError {
    let (code, reason) = frame.map_or_else(
        || (1000, "Normal closure".to_string()),
        |f| (f.code.into(), f.reason.to_string()),
    );
    ChannelError::ConnectionClosed { code, reason }
}

fn broker_error(frame: &StompFrame) -> ChannelError {
    let message = frame
        .get("message")
        .map(str::to_string)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| frame.body.trim().to_string());
    ChannelError::Broker { message }
}

/// Host used for the STOMP `host` header.
fn virtual_host(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    type ServerStream = WebSocketStream<TcpStream>;

    async fn broker() -> (String, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws/websocket", listener.local_addr().unwrap());
        (url, listener)
    }

    async fn next_frame(stream: &mut ServerStream) -> StompFrame {
        loop {
            let message = stream.next().await.unwrap().unwrap();
            if let WsMessage::Text(text) = message
                && let Some(frame) = codec::decode(text.as_str()).unwrap().into_iter().next()
            {
                return frame;
            }
        }
    }

    async fn reply(stream: &mut ServerStream, frame: StompFrame) {
        stream
            .send(WsMessage::Text(frame.encode().into()))
            .await
            .unwrap();
    }

    fn connector(url: &str) -> StompConnector {
        StompConnector::new(url).with_heartbeats(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_handshake_subscribe_and_receive() {
        let (url, listener) = broker().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = accept_async(socket).await.unwrap();

            let connect = next_frame(&mut stream).await;
            assert_eq!(connect.command, StompCommand::Connect);
            assert_eq!(connect.get("accept-version"), Some("1.2"));
            assert_eq!(connect.get("host"), Some("127.0.0.1"));
            reply(
                &mut stream,
                StompFrame::new(StompCommand::Connected)
                    .header("version", "1.2")
                    .header("heart-beat", "0,0"),
            )
            .await;

            let subscribe = next_frame(&mut stream).await;
            assert_eq!(subscribe.command, StompCommand::Subscribe);
            assert_eq!(subscribe.get("destination"), Some("/topic/albums"));
            let id = subscribe.get("id").unwrap().to_string();

            reply(
                &mut stream,
                StompFrame::new(StompCommand::Message)
                    .header("subscription", id)
                    .header("destination", "/topic/albums")
                    .body(r#"{"type":"NEW_ALBUM","message":"hi"}"#),
            )
            .await;

            let disconnect = next_frame(&mut stream).await;
            assert_eq!(disconnect.command, StompCommand::Disconnect);
        });

        let mut connection = connector(&url).connect().await.unwrap();
        connection.subscribe("/topic/albums").await.unwrap();
        let body = connection.next_message().await.unwrap();
        connection.close().await;

        assert_eq!(body, r#"{"type":"NEW_ALBUM","message":"hi"}"#);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_frame_is_broker_failure() {
        let (url, listener) = broker().await;
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = accept_async(socket).await.unwrap();
            next_frame(&mut stream).await;
            reply(
                &mut stream,
                StompFrame::new(StompCommand::Error).header("message", "access denied"),
            )
            .await;
        });

        let result = connector(&url).connect().await;

        assert!(matches!(
            result,
            Err(ChannelError::Broker { ref message }) if message == "access denied"
        ));
    }

    #[tokio::test]
    async fn test_server_close_surfaces_as_closed() {
        let (url, listener) = broker().await;
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = accept_async(socket).await.unwrap();
            next_frame(&mut stream).await;
            reply(
                &mut stream,
                StompFrame::new(StompCommand::Connected).header("heart-beat", "0,0"),
            )
            .await;
            stream.close(None).await.unwrap();
        });

        let mut connection = connector(&url).connect().await.unwrap();
        let result = connection.next_message().await;

        assert!(matches!(result, Err(ChannelError::ConnectionClosed { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_broker() {
        let result = connector("ws://127.0.0.1:1/ws/websocket").connect().await;
        assert!(matches!(result, Err(ChannelError::ConnectionFailed { .. })));
    }

    #[test]
    fn test_virtual_host() {
        assert_eq!(virtual_host("ws://localhost:8080/ws/websocket"), "localhost");
        assert_eq!(virtual_host("wss://catalog.example.org/ws"), "catalog.example.org");
        assert_eq!(virtual_host("not a url"), "localhost");
    }
}
