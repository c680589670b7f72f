use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SyncResult;
use crate::remote::FRIENDS_FIELD;
use crate::store::Document;

/// A pending friend request, stored under the recipient at
/// `users/{recipient}/friendRequests/{sender}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub sender: String,
    pub recipient: String,
    #[serde(with = "shared_items::dates::timestamp")]
    pub sent_at: DateTime<Utc>,
}

/// One entry of the `friends` map on an account document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub email: String,
}

/// Friends of one account keyed by account id
pub type FriendList = BTreeMap<String, Friend>;

/// The `friends` field of an account document; missing document or field is empty
pub(crate) fn friends_of(document: Option<Document>) -> SyncResult<FriendList> {
    match document.and_then(|mut doc| doc.remove(FRIENDS_FIELD)) {
        Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
        _ => Ok(FriendList::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_friends_are_empty() {
        assert!(friends_of(None).unwrap().is_empty());
        assert!(friends_of(Some(Document::new())).unwrap().is_empty());
    }

    #[test]
    fn test_friends_field_is_parsed() {
        let mut doc = Document::new();
        doc.insert(
            FRIENDS_FIELD.to_string(),
            json!({"ben@example.com": {"email": "ben@example.com"}}),
        );
        let friends = friends_of(Some(doc)).unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends["ben@example.com"].email, "ben@example.com");
    }
}
