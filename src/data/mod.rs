//! Friend record data model
//!
//! Records are stored on disk as a JSON object keyed by the string form of
//! each user id. Friend entries may nest their own `friends` list, so the
//! format is a recursive encoding of a friend-of-friend graph.

pub mod records;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric user identifier
pub type UserId = i64;

/// Raw, untyped records document as read from disk
pub type RawRecords = serde_json::Map<String, serde_json::Value>;

/// Typed records keyed by user id
pub type Records = BTreeMap<UserId, UserRecord>;

/// A user together with the friends fetched for them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub friends: Vec<FriendEdge>,
}

/// A friend reference, possibly carrying that friend's own friends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendEdge {
    pub id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friends: Option<Vec<FriendEdge>>,
}

impl FriendEdge {
    pub fn new(id: UserId, first_name: &str, last_name: &str) -> Self {
        Self {
            id,
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            friends: None,
        }
    }
}
