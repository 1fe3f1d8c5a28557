use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concert {
    pub band_name: String,
    pub concert_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub photo_url: String,
}

/// One ranked gallery row, as served by `/concerts/{band}/gallery`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub id: i64,
    pub photo_url: String,
    pub uploader_id: Option<String>,
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub your_vote: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NewConcert {
    pub band_name: String,
    pub concert_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewPhoto {
    pub photo_url: String,
}

#[derive(Debug, Serialize)]
pub struct VoteRequest {
    pub vote_type: bool,
}

#[derive(Debug, Deserialize)]
pub struct VoteResponse {
    pub vote: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub retry: bool,
}
