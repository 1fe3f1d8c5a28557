use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ConcertId = i64;
pub type PhotoId = i64;

/// Opaque per-session actor identifier. Never parsed, never authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct VoterId(String);

impl VoterId {
    /// Accepts any non-blank string.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== Records =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Concert {
    pub id: ConcertId,
    pub band_name: String,
    pub concert_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Photo {
    pub id: PhotoId,
    pub concert_id: ConcertId,
    pub photo_url: String,
    pub uploader_id: Option<VoterId>,
    pub created_at: DateTime<Utc>,
}

/// A vote as read back from storage. Rows are weakly validated, so the
/// photo reference may be missing and the voter may be blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoteRow {
    pub id: i64,
    pub photo_id: Option<PhotoId>,
    pub voter_id: String,
    pub vote_type: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub photo_id: PhotoId,
    pub voter_id: VoterId,
    pub vote_type: bool, // true = up
    pub created_at: DateTime<Utc>,
}

// ===== Requests / Responses =====

#[derive(Debug, Serialize, Deserialize)]
pub struct NewConcert {
    pub band_name: String,
    #[serde(default)]
    pub concert_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewPhoto {
    pub photo_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhotosQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub vote_type: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub photo_id: PhotoId,
    /// The voter's effective polarity after the call; `None` once toggled off.
    pub vote: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventVote {
    pub photo_id: PhotoId,
    pub voter_id: VoterId,
    pub vote_type: bool,
}

impl From<Vote> for EventVote {
    fn from(vote: Vote) -> Self {
        Self {
            photo_id: vote.photo_id,
            voter_id: vote.voter_id,
            vote_type: vote.vote_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    #[serde(flatten)]
    pub photo: Photo,
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub your_vote: Option<bool>,
}
