use axum::{extract::ws::Message, response::sse::Event};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub const EV_INSERT: &str = "insert";
pub const EV_LAGGED: &str = "lagged";

/// Table a realtime subscriber listens on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum FeedChannel {
    Messages,
    Activities,
}

impl FeedChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedChannel::Messages => "messages",
            FeedChannel::Activities => "activities",
        }
    }

    /// Channel topic name, e.g. `messages:<board id>`.
    pub fn topic(&self, board_id: Uuid) -> String {
        format!("{}:{}", self.as_str(), board_id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedMsg {
    /// A row was inserted into `channel` for `board_id`.
    Insert {
        channel: FeedChannel,
        board_id: Uuid,
        #[ts(type = "unknown")]
        record: serde_json::Value,
    },
    /// The subscriber fell behind and missed `skipped` events.
    Lagged { skipped: u64 },
}

impl FeedMsg {
    pub fn insert<T: Serialize>(
        channel: FeedChannel,
        board_id: Uuid,
        record: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(FeedMsg::Insert {
            channel,
            board_id,
            record: serde_json::to_value(record)?,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeedMsg::Insert { .. } => EV_INSERT,
            FeedMsg::Lagged { .. } => EV_LAGGED,
        }
    }

    /// Whether a subscriber on `channel` for `board_id` should see this message.
    pub fn matches(&self, channel: FeedChannel, board_id: Uuid) -> bool {
        match self {
            FeedMsg::Insert {
                channel: c,
                board_id: b,
                ..
            } => *c == channel && *b == board_id,
            FeedMsg::Lagged { .. } => true,
        }
    }

    pub fn to_sse_event(&self) -> Event {
        let data = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        Event::default().event(self.name()).data(data)
    }

    pub fn to_ws_message(&self) -> Result<Message, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(Message::Text(json.into()))
    }
}
