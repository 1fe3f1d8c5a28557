use std::{future::Future, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Concert, ConcertId, Photo, PhotoId, VoteRow, VoterId};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),

    #[error("store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(Box::new(err))
    }
}

/// Persistence collaborator for events, photos and votes.
///
/// No multi-call transaction is assumed between operations; `cast_vote` is
/// the only operation that must be atomic, and only for its own
/// (photo, voter) pair.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_concert(
        &self,
        band_name: &str,
        concert_date: Option<NaiveDate>,
    ) -> Result<Concert, StoreError>;

    async fn list_concerts(&self) -> Result<Vec<Concert>, StoreError>;

    async fn find_concert(&self, band_name: &str) -> Result<Option<Concert>, StoreError>;

    async fn insert_photo(
        &self,
        concert_id: ConcertId,
        photo_url: &str,
        uploader_id: Option<&VoterId>,
    ) -> Result<Photo, StoreError>;

    /// Newest first. `limit` of `None` returns every photo of the event.
    async fn list_photos(
        &self,
        concert_id: ConcertId,
        limit: Option<i64>,
    ) -> Result<Vec<Photo>, StoreError>;

    /// Applies the toggle contract and returns the voter's new polarity,
    /// `None` when the vote was retracted. Fails with `NotFound` for an
    /// unknown photo.
    async fn cast_vote(
        &self,
        photo_id: PhotoId,
        voter_id: &VoterId,
        polarity: bool,
    ) -> Result<Option<bool>, StoreError>;

    /// Every vote on every photo of the event, in no particular order.
    async fn list_votes_for_concert(&self, concert_id: ConcertId)
    -> Result<Vec<VoteRow>, StoreError>;
}

/// Runs a store call with an upper bound on how long it may stall.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}
