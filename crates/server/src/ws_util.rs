//! Forwarding a realtime feed to a WebSocket with server-side heartbeats.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::time::{Instant, MissedTickBehavior, interval};
use utils::feed_msg::FeedMsg;

#[derive(Debug, Clone)]
pub struct WsKeepAlive {
    /// Interval between server-initiated ping frames.
    pub ping_interval: Duration,
    /// Silence after which the peer is considered gone.
    pub pong_timeout: Duration,
}

impl Default for WsKeepAlive {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(90),
        }
    }
}

/// Feed messages as JSON text frames.
pub fn feed_frames<S>(feed: S) -> impl Stream<Item = Result<Message, serde_json::Error>> + Unpin
where
    S: Stream<Item = FeedMsg> + Unpin,
{
    feed.map(|msg| msg.to_ws_message())
}

/// Pump `data_stream` into `socket` until either side finishes.
///
/// Pings go out every `ping_interval`; the socket is closed once no pong arrived for
/// `pong_timeout`. Client pings are answered, client text/binary frames ignored.
pub async fn run_ws_stream<S, E>(
    socket: WebSocket,
    mut data_stream: S,
    keep_alive: WsKeepAlive,
) -> anyhow::Result<()>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display + Send + Sync + 'static,
{
    let (mut sender, mut receiver) = socket.split();

    let mut ping_interval = interval(keep_alive.ping_interval);
    ping_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last_pong = Instant::now();

    loop {
        tokio::select! {
            item = data_stream.next() => {
                match item {
                    Some(Ok(msg)) => {
                        if sender.send(msg).await.is_err() {
                            tracing::debug!("client disconnected during send");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!("feed stream error: {}", e);
                        break;
                    }
                    None => {
                        tracing::debug!("feed stream ended");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("client sent close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::debug!(?e, "websocket receive error");
                        break;
                    }
                    None => {
                        tracing::debug!("websocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }

            _ = ping_interval.tick() => {
                if last_pong.elapsed() > keep_alive.pong_timeout {
                    tracing::warn!(
                        elapsed_secs = last_pong.elapsed().as_secs(),
                        "WebSocket pong timeout, closing connection"
                    );
                    break;
                }

                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    tracing::debug!("failed to send ping, client disconnected");
                    break;
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use utils::feed_msg::FeedChannel;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn keep_alive_defaults() {
        let ka = WsKeepAlive::default();
        assert_eq!(ka.ping_interval, Duration::from_secs(30));
        assert_eq!(ka.pong_timeout, Duration::from_secs(90));
    }

    #[tokio::test]
    async fn feed_messages_become_text_frames() {
        let msg = FeedMsg::insert(
            FeedChannel::Messages,
            Uuid::new_v4(),
            &serde_json::json!({"content": "hi"}),
        )
        .unwrap();
        let mut frames = feed_frames(stream::iter(vec![msg]));

        let Some(Ok(Message::Text(text))) = frames.next().await else {
            panic!("expected a text frame");
        };
        assert!(text.as_str().contains("\"content\":\"hi\""));
        assert!(frames.next().await.is_none());
    }
}
