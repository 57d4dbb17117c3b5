//! In-process realtime hub for board chat and activity inserts.

use futures::{StreamExt, future, stream::BoxStream};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use utils::feed_msg::{FeedChannel, FeedMsg};
use uuid::Uuid;

const FEED_CAPACITY: usize = 1024;

/// Fan-out of insert events to every open subscription.
///
/// Subscribers filter by channel and board on their side of the channel, so one sender
/// serves every board.
#[derive(Clone)]
pub struct FeedHub {
    sender: broadcast::Sender<FeedMsg>,
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    /// Returns how many subscriptions the message was handed to.
    pub fn publish(&self, msg: FeedMsg) -> usize {
        self.sender.send(msg).unwrap_or(0)
    }

    /// Serialize `record` and publish it as an insert on `channel` for `board_id`.
    pub fn publish_insert<T: Serialize>(&self, channel: FeedChannel, board_id: Uuid, record: &T) {
        match FeedMsg::insert(channel, board_id, record) {
            Ok(msg) => {
                let receivers = self.publish(msg);
                tracing::trace!(topic = %channel.topic(board_id), receivers, "Published insert");
            }
            Err(e) => {
                tracing::warn!(topic = %channel.topic(board_id), "Failed to serialize feed record: {}", e);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Live inserts for one channel of one board. A subscriber that falls behind gets a
    /// [`FeedMsg::Lagged`] in place of the dropped events.
    pub fn subscribe(&self, channel: FeedChannel, board_id: Uuid) -> BoxStream<'static, FeedMsg> {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(move |res| {
                future::ready(match res {
                    Ok(msg) if msg.matches(channel, board_id) => Some(msg),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        Some(FeedMsg::Lagged { skipped })
                    }
                })
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_board_and_channel() {
        let hub = FeedHub::new();
        let board = Uuid::new_v4();
        let other_board = Uuid::new_v4();

        let mut stream = hub.subscribe(FeedChannel::Messages, board);
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish_insert(FeedChannel::Messages, other_board, &json!({"content": "elsewhere"}));
        hub.publish_insert(FeedChannel::Activities, board, &json!({"action": "created"}));
        hub.publish_insert(FeedChannel::Messages, board, &json!({"content": "hello"}));

        let msg = tokio::time::timeout(Duration::from_secs(1), stream.next())
            .await
            .unwrap()
            .unwrap();
        match msg {
            FeedMsg::Insert {
                channel,
                board_id,
                record,
            } => {
                assert_eq!(channel, FeedChannel::Messages);
                assert_eq!(board_id, board);
                assert_eq!(record["content"], "hello");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropping_the_stream_unsubscribes() {
        let hub = FeedHub::new();
        let stream = hub.subscribe(FeedChannel::Activities, Uuid::new_v4());
        assert_eq!(hub.subscriber_count(), 1);
        drop(stream);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(FeedMsg::Lagged { skipped: 0 }), 0);
    }
}
