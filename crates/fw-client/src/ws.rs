//! WebSocket implementation of the stream channel.
//!
//! Wire format: an outbound frame is one text message carrying the tagged
//! `frame` meta (conf/iou/imgsz) immediately followed by one binary message
//! with the JPEG payload. Inbound binary messages are annotated frames;
//! inbound text messages must parse as a tagged meta, anything else is a
//! protocol fault rejected here before it reaches application logic.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use fw_models::{InboundEvent, OutboundFrame, StreamMeta};

use crate::error::{ChannelError, ChannelResult};
use crate::stream::{EventSource, FrameSink, StreamConnector};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the detection service's streaming endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self) -> ChannelResult<(Box<dyn FrameSink>, Box<dyn EventSource>)> {
        debug!(url = %self.url, "opening stream channel");
        let (ws, _response) = connect_async(&self.url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        let (sink, stream) = ws.split();

        Ok((
            Box::new(WsFrameSink { sink, closed: false }),
            Box::new(WsEventSource { stream }),
        ))
    }
}

struct WsFrameSink {
    sink: SplitSink<WsStream, Message>,
    closed: bool,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_frame(&mut self, frame: OutboundFrame) -> ChannelResult<()> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        let meta = serde_json::to_string(&StreamMeta::for_frame(&frame.params))
            .map_err(|e| ChannelError::Protocol(e.to_string()))?;

        self.sink
            .send(Message::Text(meta))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        self.sink
            .send(Message::Binary(frame.payload))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        trace!("frame sent");
        Ok(())
    }

    async fn close(&mut self) -> ChannelResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Best-effort close handshake; the peer may already be gone.
        let _ = self.sink.send(Message::Close(None)).await;
        self.sink
            .close()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }
}

struct WsEventSource {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl EventSource for WsEventSource {
    async fn next_event(&mut self) -> Option<ChannelResult<InboundEvent>> {
        loop {
            match self.stream.next().await? {
                Ok(msg) => match decode_inbound(msg) {
                    Decoded::Event(event) => return Some(Ok(event)),
                    Decoded::Ignore => continue,
                    Decoded::Closed => return None,
                    Decoded::Fault(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
            }
        }
    }
}

enum Decoded {
    Event(InboundEvent),
    Ignore,
    Closed,
    Fault(ChannelError),
}

/// Validate one inbound message at the transport boundary.
fn decode_inbound(msg: Message) -> Decoded {
    match msg {
        Message::Binary(bytes) => Decoded::Event(InboundEvent::AnnotatedFrame(bytes)),
        Message::Text(text) => match serde_json::from_str::<StreamMeta>(&text) {
            Ok(StreamMeta::Error { message }) => Decoded::Event(InboundEvent::Error { message }),
            Ok(StreamMeta::Frame { .. }) => Decoded::Fault(ChannelError::Protocol(
                "server sent a client-only frame meta".into(),
            )),
            Err(e) => Decoded::Fault(ChannelError::Protocol(format!(
                "unparseable text message: {e}"
            ))),
        },
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Decoded::Ignore,
        Message::Close(_) => Decoded::Closed,
    }
}
