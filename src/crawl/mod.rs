//! Friend crawling over an external friends service
//!
//! The service itself (paginated HTTP, authentication, retries) lives behind
//! [`FriendSource`]. The crawler only sequences requests, paces them and
//! assembles the nested records document the graph builder reads.
//!
//! This is a library entry point: the binary analyzes records already on
//! disk, and callers with a service client pair [`Crawler`] with
//! [`crate::storage::save_records`] to produce them.

use std::collections::HashMap;
use std::thread;

use thiserror::Error;

use crate::config::CrawlConfig;
use crate::data::{FriendEdge, Records, UserId, UserRecord};

/// A user's name as reported by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("user {0} not found")]
    NotFound(UserId),

    /// Error reported by the service, e.g. a private profile
    #[error("service error for user {id}: {message}")]
    Service { id: UserId, message: String },
}

/// Source of profiles and friend lists
pub trait FriendSource {
    fn profile(&self, id: UserId) -> Result<Profile, FetchError>;

    /// All friends of a user, pagination already resolved
    fn friends(&self, id: UserId) -> Result<Vec<FriendEdge>, FetchError>;
}

/// Sequences friend requests against a [`FriendSource`]
pub struct Crawler<S> {
    source: S,
    config: CrawlConfig,
}

impl<S: FriendSource> Crawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self { source, config }
    }

    /// Fetch the friends of each seed user
    ///
    /// Users without a full name, without friends, or whose requests fail
    /// are left out.
    pub fn collect_users(&self, ids: &[UserId]) -> Records {
        let mut records = Records::new();

        for &id in ids {
            let profile = match self.source.profile(id) {
                Ok(profile) => profile,
                Err(e) => {
                    log::warn!("Error fetching profile: {}", e);
                    continue;
                }
            };
            if profile.first_name.is_empty() || profile.last_name.is_empty() {
                log::debug!("Skipping user {} without a full name", id);
                continue;
            }

            self.pause();
            log::info!("Fetching friends for user {}", id);
            match self.source.friends(id) {
                Ok(friends) if !friends.is_empty() => {
                    log::info!("Fetched {} friends for user {}", friends.len(), id);
                    records.insert(
                        id,
                        UserRecord {
                            first_name: profile.first_name,
                            last_name: profile.last_name,
                            friends,
                        },
                    );
                }
                Ok(_) => log::debug!("User {} has no friends to save", id),
                Err(e) => log::warn!("Error fetching friends: {}", e),
            }
        }

        records
    }

    /// Nest each friend's own friend list under the friend entry
    ///
    /// A failed request leaves that friend with an empty nested list.
    pub fn expand_friends_of_friends(&self, records: &Records) -> Records {
        let mut expanded = records.clone();

        for (user_id, record) in expanded.iter_mut() {
            log::info!("Expanding {} friends of user {}", record.friends.len(), user_id);
            for friend in record.friends.iter_mut() {
                self.pause();
                let nested = match self.source.friends(friend.id) {
                    Ok(nested) => nested,
                    Err(e) => {
                        log::warn!("Error fetching friends: {}", e);
                        Vec::new()
                    }
                };
                log::debug!("Fetched {} friends of friend {}", nested.len(), friend.id);
                friend.friends = Some(nested);
            }
        }

        expanded
    }

    fn pause(&self) {
        if !self.config.request_interval.is_zero() {
            thread::sleep(self.config.request_interval);
        }
    }
}

/// In-memory [`FriendSource`] for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    profiles: HashMap<UserId, Profile>,
    friends: HashMap<UserId, Vec<FriendEdge>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user with their friends (names of friends are taken from
    /// previously added users when known)
    pub fn with_user(mut self, id: UserId, first_name: &str, last_name: &str, friends: &[UserId]) -> Self {
        self.profiles.insert(
            id,
            Profile {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
            },
        );
        let edges = friends
            .iter()
            .map(|&friend| match self.profiles.get(&friend) {
                Some(p) => FriendEdge::new(friend, &p.first_name, &p.last_name),
                None => FriendEdge {
                    id: friend,
                    first_name: None,
                    last_name: None,
                    friends: None,
                },
            })
            .collect();
        self.friends.insert(id, edges);
        self
    }
}

impl FriendSource for MemorySource {
    fn profile(&self, id: UserId) -> Result<Profile, FetchError> {
        self.profiles.get(&id).cloned().ok_or(FetchError::NotFound(id))
    }

    fn friends(&self, id: UserId) -> Result<Vec<FriendEdge>, FetchError> {
        self.friends.get(&id).cloned().ok_or(FetchError::NotFound(id))
    }
}
