use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_items::{ItemKind, Role};

/// A pending invitation, stored under the recipient at
/// `users/{recipient}/invites/{itemID}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    #[serde(rename = "itemID")]
    pub item_id: String,
    #[serde(rename = "itemType")]
    pub item_kind: ItemKind,
    pub item_name: String,
    pub sender: String,
    pub recipient: String,
    pub role: Role,
    #[serde(with = "shared_items::dates::timestamp")]
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteAction {
    Accept,
    Reject,
}

impl InviteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        }
    }
}
