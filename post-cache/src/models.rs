use crate::schema::post_cache;
use anyhow::{Context, Result, bail};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Triage state of a cached post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Downloaded to staging, waiting for a keep/discard decision.
    #[default]
    Pending,
    /// Moved into the archive.
    Saved,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Saved => "saved",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PostStatus::Pending),
            "saved" => Ok(PostStatus::Saved),
            other => bail!("unknown post status: {other:?}"),
        }
    }
}

/// One row of the post cache, as the rest of the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPost {
    pub post_id: i64,
    pub status: PostStatus,
    pub title: String,
    pub owner: String,
    pub score: i64,
    pub rating: String,
    pub width: i64,
    pub height: i64,
    pub file_type: String,
    pub tags: Vec<String>,
    pub date_folder: String,
    /// Seconds since the Unix epoch, when the post was first seen.
    pub timestamp: f64,
    pub file_path: String,
    pub downloaded_at: String,
    pub created_at: String,
    /// Bytes on disk.
    pub file_size: i64,
    /// Seconds, for videos only.
    pub duration: Option<f64>,
}

impl CachedPost {
    /// A pending post with only an id and tags set.
    pub fn new(post_id: i64, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            post_id,
            status: PostStatus::Pending,
            title: String::new(),
            owner: String::new(),
            score: 0,
            rating: String::new(),
            width: 0,
            height: 0,
            file_type: String::new(),
            tags: tags.into_iter().map(Into::into).collect(),
            date_folder: String::new(),
            timestamp: 0.0,
            file_path: String::new(),
            downloaded_at: String::new(),
            created_at: String::new(),
            file_size: 0,
            duration: None,
        }
    }
}

/// Storage shape of [`CachedPost`]: tags are a JSON array in a text column.
///
/// Field order follows the table definition.
#[derive(Debug, Clone, Queryable, QueryableByName, Insertable)]
#[diesel(table_name = post_cache)]
pub(crate) struct PostRow {
    pub post_id: i64,
    pub status: String,
    pub title: String,
    pub owner: String,
    pub score: i64,
    pub rating: String,
    pub width: i64,
    pub height: i64,
    pub file_type: String,
    pub tags: String,
    pub date_folder: String,
    pub timestamp: f64,
    pub file_path: String,
    pub downloaded_at: String,
    pub created_at: String,
    pub file_size: i64,
    pub duration: Option<f64>,
}

impl PostRow {
    pub fn from_post(post: &CachedPost) -> Result<Self> {
        let tags = serde_json::to_string(&post.tags)
            .with_context(|| format!("Encode tags of post {} failed.", post.post_id))?;
        Ok(Self {
            post_id: post.post_id,
            status: post.status.as_str().to_string(),
            title: post.title.clone(),
            owner: post.owner.clone(),
            score: post.score,
            rating: post.rating.clone(),
            width: post.width,
            height: post.height,
            file_type: post.file_type.clone(),
            tags,
            date_folder: post.date_folder.clone(),
            timestamp: post.timestamp,
            file_path: post.file_path.clone(),
            downloaded_at: post.downloaded_at.clone(),
            created_at: post.created_at.clone(),
            file_size: post.file_size,
            duration: post.duration,
        })
    }

    pub fn into_post(self) -> Result<CachedPost> {
        let status = self
            .status
            .parse()
            .with_context(|| format!("Decode status of post {} failed.", self.post_id))?;
        let tags = if self.tags.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.tags)
                .with_context(|| format!("Decode tags of post {} failed.", self.post_id))?
        };
        Ok(CachedPost {
            post_id: self.post_id,
            status,
            title: self.title,
            owner: self.owner,
            score: self.score,
            rating: self.rating,
            width: self.width,
            height: self.height,
            file_type: self.file_type,
            tags,
            date_folder: self.date_folder,
            timestamp: self.timestamp,
            file_path: self.file_path,
            downloaded_at: self.downloaded_at,
            created_at: self.created_at,
            file_size: self.file_size,
            duration: self.duration,
        })
    }
}
