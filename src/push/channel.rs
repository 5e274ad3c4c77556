//! The push channel: a persistent websocket the server uses to deliver
//! events, distinct from request/response calls.
//!
//! The client emits `join` on connect and `leave` on exit; the server
//! emits `new_message` and `user_typing`. Frames are a JSON-tagged
//! envelope. The connection task forwards parsed events into an mpsc the
//! merger drains; no history is replayed over the channel — history is a
//! separate fetch issued immediately after connecting.

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use super::PushEvent;
use crate::model::ChatMessage;
use crate::remote::RemoteError;

/// Frames the client sends to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    Join {
        project_id: i64,
        user_id: i64,
    },
    Leave {
        project_id: i64,
    },
    Typing {
        project_id: i64,
        user_id: i64,
        username: String,
    },
}

/// Frames the server pushes to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    NewMessage(ChatMessage),
    UserTyping {
        username: String,
        #[serde(default)]
        user_id: Option<i64>,
    },
}

impl From<ServerFrame> for PushEvent {
    fn from(frame: ServerFrame) -> Self {
        match frame {
            ServerFrame::NewMessage(message) => PushEvent::NewMessage(message),
            ServerFrame::UserTyping { username, .. } => PushEvent::UserTyping { username },
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live push connection for one project.
pub struct PushChannel {
    project_id: i64,
    user_id: i64,
    events: mpsc::Receiver<PushEvent>,
    outbound: mpsc::Sender<ClientFrame>,
    task: JoinHandle<()>,
}

impl PushChannel {
    /// Connect, announce `join`, and start the forwarding loop.
    pub async fn connect(
        endpoint: &str,
        project_id: i64,
        user_id: i64,
    ) -> Result<Self, RemoteError> {
        let (mut ws, _) = connect_async(endpoint)
            .await
            .map_err(RemoteError::transport)?;
        let join = ClientFrame::Join {
            project_id,
            user_id,
        };
        let json = serde_json::to_string(&join).map_err(RemoteError::decode)?;
        ws.send(Message::Text(json))
            .await
            .map_err(RemoteError::transport)?;
        debug!(project_id, "joined push channel");

        let (events_tx, events) = mpsc::channel(64);
        let (outbound, outbound_rx) = mpsc::channel(16);
        let task = tokio::spawn(run_channel_loop(ws, events_tx, outbound_rx));

        Ok(Self {
            project_id,
            user_id,
            events,
            outbound,
            task,
        })
    }

    /// Next pushed event; `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Announce that the local user is typing.
    pub async fn send_typing(&self, username: &str) -> Result<(), RemoteError> {
        self.outbound
            .send(ClientFrame::Typing {
                project_id: self.project_id,
                user_id: self.user_id,
                username: username.to_string(),
            })
            .await
            .map_err(|_| RemoteError::ChannelClosed)
    }

    /// Announce `leave` and tear the connection down.
    pub async fn disconnect(self) {
        let _ = self
            .outbound
            .send(ClientFrame::Leave {
                project_id: self.project_id,
            })
            .await;
        let _ = self.task.await;
    }
}

/// Core channel loop: forwards parsed server frames into the event mpsc
/// and outbound frames onto the wire. Exits on `leave`, close, or error;
/// unparseable frames are logged and skipped rather than killing the
/// connection.
async fn run_channel_loop(
    mut ws: WsStream,
    events_tx: mpsc::Sender<PushEvent>,
    mut outbound_rx: mpsc::Receiver<ClientFrame>,
) {
    loop {
        tokio::select! {
            frame = outbound_rx.recv() => {
                let Some(frame) = frame else {
                    let _ = ws.close(None).await;
                    break;
                };
                let leaving = matches!(frame, ClientFrame::Leave { .. });
                match serde_json::to_string(&frame) {
                    Ok(json) => {
                        if ws.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, "failed to serialize client frame"),
                }
                if leaving {
                    let _ = ws.close(None).await;
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerFrame>(&text) {
                            Ok(frame) => {
                                if events_tx.send(frame.into()).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => warn!(%err, "skipping unparseable push frame"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Ping/pong and binary frames carry no events.
                    }
                    Some(Err(err)) => {
                        warn!(%err, "push channel error");
                        break;
                    }
                }
            }
        }
    }
    debug!("push channel loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frames_serialize_tagged_envelopes() {
        let join = ClientFrame::Join {
            project_id: 1,
            user_id: 2,
        };
        let json = serde_json::to_string(&join).unwrap();
        assert!(json.contains(r#""event":"join""#));
        assert!(json.contains(r#""project_id":1"#));

        let parsed: ClientFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, join);
    }

    #[test]
    fn leave_frame_roundtrip() {
        let leave = ClientFrame::Leave { project_id: 9 };
        let json = serde_json::to_string(&leave).unwrap();
        assert!(json.contains(r#""event":"leave""#));
        assert_eq!(serde_json::from_str::<ClientFrame>(&json).unwrap(), leave);
    }

    #[test]
    fn server_new_message_frame_parses() {
        let json = r#"{
            "event": "new_message",
            "data": {"id": 5, "project_id": 1, "user_id": 2, "content": "收到"}
        }"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        match PushEvent::from(frame) {
            PushEvent::NewMessage(msg) => {
                assert_eq!(msg.id, 5);
                assert_eq!(msg.content.as_deref(), Some("收到"));
            }
            _ => panic!("Expected NewMessage"),
        }
    }

    #[test]
    fn server_typing_frame_parses_without_user_id() {
        let json = r#"{"event": "user_typing", "data": {"username": "Bob"}}"#;
        let frame: ServerFrame = serde_json::from_str(json).unwrap();
        match PushEvent::from(frame) {
            PushEvent::UserTyping { username } => assert_eq!(username, "Bob"),
            _ => panic!("Expected UserTyping"),
        }
    }

    #[test]
    fn unknown_event_tags_fail_to_parse() {
        let json = r#"{"event": "server_restart", "data": {}}"#;
        assert!(serde_json::from_str::<ServerFrame>(json).is_err());
    }
}
