//! Raw column layouts and their mapping onto the canonical schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeocovError;
use crate::input::DataTable;

/// Raw column schema produced by a particular collection tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Carries `hashtags` and `user_verified`.
    Rich,
    /// Converted exports without `hashtags` or `user_verified`.
    Lean,
}

/// A column of the canonical in-memory schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Id,
    CreatedAt,
    ReshareOfId,
    AuthorHandle,
    AuthorFollowerCount,
    AuthorFollowingCount,
    ReshareCount,
    FavoriteCount,
    Hashtags,
    AuthorVerified,
    Text,
}

impl CanonicalColumn {
    /// Every canonical column, in canonical order.
    pub const ALL: [CanonicalColumn; 11] = [
        CanonicalColumn::Id,
        CanonicalColumn::CreatedAt,
        CanonicalColumn::ReshareOfId,
        CanonicalColumn::AuthorHandle,
        CanonicalColumn::AuthorFollowerCount,
        CanonicalColumn::AuthorFollowingCount,
        CanonicalColumn::ReshareCount,
        CanonicalColumn::FavoriteCount,
        CanonicalColumn::Hashtags,
        CanonicalColumn::AuthorVerified,
        CanonicalColumn::Text,
    ];

    /// Canonical column name, as written to checkpoints.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalColumn::Id => "id",
            CanonicalColumn::CreatedAt => "created_at",
            CanonicalColumn::ReshareOfId => "reshare_of_id",
            CanonicalColumn::AuthorHandle => "author_handle",
            CanonicalColumn::AuthorFollowerCount => "author_follower_count",
            CanonicalColumn::AuthorFollowingCount => "author_following_count",
            CanonicalColumn::ReshareCount => "reshare_count",
            CanonicalColumn::FavoriteCount => "favorite_count",
            CanonicalColumn::Hashtags => "hashtags",
            CanonicalColumn::AuthorVerified => "author_verified",
            CanonicalColumn::Text => "text",
        }
    }

    /// Raw header names accepted for this column, preferred name first.
    pub fn raw_names(&self) -> &'static [&'static str] {
        match self {
            CanonicalColumn::Id => &["id"],
            CanonicalColumn::CreatedAt => &["created_at"],
            CanonicalColumn::ReshareOfId => &["reweet_id", "retweet_id"],
            CanonicalColumn::AuthorHandle => &["user_screen_name"],
            CanonicalColumn::AuthorFollowerCount => &["user_followers_count"],
            CanonicalColumn::AuthorFollowingCount => &["user_friends_count"],
            CanonicalColumn::ReshareCount => &["retweet_count"],
            CanonicalColumn::FavoriteCount => &["favourite_count", "favorite_count"],
            CanonicalColumn::Hashtags => &["hashtags"],
            CanonicalColumn::AuthorVerified => &["user_verified"],
            CanonicalColumn::Text => &["text"],
        }
    }
}

/// Whether a layout must carry a canonical column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub column: CanonicalColumn,
    pub required: bool,
}

const fn required(column: CanonicalColumn) -> ColumnSpec {
    ColumnSpec {
        column,
        required: true,
    }
}

const fn optional(column: CanonicalColumn) -> ColumnSpec {
    ColumnSpec {
        column,
        required: false,
    }
}

const RICH_COLUMNS: &[ColumnSpec] = &[
    required(CanonicalColumn::Id),
    required(CanonicalColumn::CreatedAt),
    required(CanonicalColumn::Hashtags),
    required(CanonicalColumn::ReshareOfId),
    required(CanonicalColumn::AuthorHandle),
    required(CanonicalColumn::AuthorFollowerCount),
    required(CanonicalColumn::AuthorFollowingCount),
    required(CanonicalColumn::AuthorVerified),
    optional(CanonicalColumn::ReshareCount),
    optional(CanonicalColumn::FavoriteCount),
    required(CanonicalColumn::Text),
];

// `hashtags` and `author_verified` carry no raw data in this layout.
const LEAN_COLUMNS: &[ColumnSpec] = &[
    required(CanonicalColumn::Id),
    required(CanonicalColumn::CreatedAt),
    required(CanonicalColumn::ReshareOfId),
    required(CanonicalColumn::AuthorHandle),
    required(CanonicalColumn::AuthorFollowerCount),
    required(CanonicalColumn::AuthorFollowingCount),
    optional(CanonicalColumn::ReshareCount),
    optional(CanonicalColumn::FavoriteCount),
    required(CanonicalColumn::Text),
];

impl Layout {
    /// Canonical columns this layout selects from raw data.
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            Layout::Rich => RICH_COLUMNS,
            Layout::Lean => LEAN_COLUMNS,
        }
    }

    /// Column selection, minus `reshare_of_id` when the batch was pruned upstream.
    pub fn selection(self, already_pruned: bool) -> impl Iterator<Item = &'static ColumnSpec> {
        self.columns().iter().filter(move |spec| {
            !(already_pruned && spec.column == CanonicalColumn::ReshareOfId)
        })
    }

    /// Whether this layout carries `hashtags`/`author_verified` raw data.
    pub fn carries_profile_extras(&self) -> bool {
        matches!(self, Layout::Rich)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Rich => write!(f, "rich"),
            Layout::Lean => write!(f, "lean"),
        }
    }
}

impl FromStr for Layout {
    type Err = GeocovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rich" => Ok(Layout::Rich),
            "lean" => Ok(Layout::Lean),
            other => Err(GeocovError::Config(format!("unknown layout '{}'", other))),
        }
    }
}

/// Raw column positions for each canonical column, resolved once per table.
#[derive(Debug, Clone, Default)]
pub struct ResolvedColumns {
    pub id: Option<usize>,
    pub created_at: Option<usize>,
    pub reshare_of_id: Option<usize>,
    pub author_handle: Option<usize>,
    pub author_follower_count: Option<usize>,
    pub author_following_count: Option<usize>,
    pub reshare_count: Option<usize>,
    pub favorite_count: Option<usize>,
    pub hashtags: Option<usize>,
    pub author_verified: Option<usize>,
    pub text: Option<usize>,
}

impl ResolvedColumns {
    /// Resolve a layout against the headers of a raw table.
    ///
    /// Returns the canonical names of required columns that are absent.
    pub fn resolve(
        table: &DataTable,
        layout: Layout,
        already_pruned: bool,
    ) -> Result<Self, Vec<String>> {
        let mut resolved = Self::default();
        let mut missing = Vec::new();

        for spec in layout.selection(already_pruned) {
            let position = table.find_column(spec.column.raw_names());
            if position.is_none() && spec.required {
                missing.push(spec.column.raw_names()[0].to_string());
                continue;
            }
            *resolved.slot(spec.column) = position;
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }

    /// Resolve the canonical (checkpoint) headers of a pruned batch.
    pub fn resolve_checkpoint(table: &DataTable) -> Result<Self, Vec<String>> {
        let mut resolved = Self::default();
        let mut missing = Vec::new();

        for column in CanonicalColumn::ALL {
            if column == CanonicalColumn::ReshareOfId {
                continue;
            }
            match table.column_index(column.name()) {
                Some(position) => *resolved.slot(column) = Some(position),
                None => missing.push(column.name().to_string()),
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(missing)
        }
    }

    fn slot(&mut self, column: CanonicalColumn) -> &mut Option<usize> {
        match column {
            CanonicalColumn::Id => &mut self.id,
            CanonicalColumn::CreatedAt => &mut self.created_at,
            CanonicalColumn::ReshareOfId => &mut self.reshare_of_id,
            CanonicalColumn::AuthorHandle => &mut self.author_handle,
            CanonicalColumn::AuthorFollowerCount => &mut self.author_follower_count,
            CanonicalColumn::AuthorFollowingCount => &mut self.author_following_count,
            CanonicalColumn::ReshareCount => &mut self.reshare_count,
            CanonicalColumn::FavoriteCount => &mut self.favorite_count,
            CanonicalColumn::Hashtags => &mut self.hashtags,
            CanonicalColumn::AuthorVerified => &mut self.author_verified,
            CanonicalColumn::Text => &mut self.text,
        }
    }
}
