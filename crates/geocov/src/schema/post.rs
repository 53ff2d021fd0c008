//! Canonical post records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical column order of a normalized batch.
pub const CANONICAL_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "reshare_of_id",
    "author_handle",
    "author_follower_count",
    "author_following_count",
    "reshare_count",
    "favorite_count",
    "hashtags",
    "author_verified",
    "text",
];

/// Checkpoint column order: the canonical columns without `reshare_of_id`.
pub const PRUNED_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "author_handle",
    "author_follower_count",
    "author_following_count",
    "reshare_count",
    "favorite_count",
    "hashtags",
    "author_verified",
    "text",
];

/// One social-media post in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub author_handle: String,
    /// Unknown counts stay `None`; zero is a real observation.
    pub author_follower_count: Option<u64>,
    pub author_following_count: Option<u64>,
    pub reshare_count: Option<u64>,
    pub favorite_count: Option<u64>,
    pub hashtags: Option<String>,
    pub author_verified: Option<bool>,
    pub text: String,
}

/// A normalized post that still carries its re-share reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPost {
    /// Set iff the post is a re-share of another post.
    pub reshare_of_id: Option<String>,
    #[serde(flatten)]
    pub post: Post,
}

impl RawPost {
    /// Whether this row is an original post.
    pub fn is_original(&self) -> bool {
        self.reshare_of_id.is_none()
    }

    /// Drop the re-share reference.
    pub fn into_post(self) -> Post {
        self.post
    }
}
