use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::{
    models::{Concert, ConcertId, Photo, PhotoId, VoteRow, VoterId},
    store::{Store, StoreError},
    votes::{Transition, transition},
};

#[derive(Default)]
struct Tables {
    concerts: Vec<Concert>,
    photos: Vec<Photo>,
    votes: Vec<VoteRow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. One lock guards all tables, so every call, including
/// the read-decide-write of `cast_vote`, is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    /// Number of stored rows for a (photo, voter) pair.
    pub async fn vote_rows(&self, photo_id: PhotoId, voter_id: &VoterId) -> usize {
        self.tables
            .lock()
            .await
            .votes
            .iter()
            .filter(|v| v.photo_id == Some(photo_id) && v.voter_id == voter_id.as_str())
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn create_concert(
        &self,
        band_name: &str,
        concert_date: Option<NaiveDate>,
    ) -> Result<Concert, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        if tables.concerts.iter().any(|c| c.band_name == band_name) {
            return Err(StoreError::AlreadyExists(band_name.to_string()));
        }
        let concert = Concert {
            id: tables.next_id(),
            band_name: band_name.to_string(),
            concert_date,
            created_at: Utc::now(),
        };
        tables.concerts.push(concert.clone());
        Ok(concert)
    }

    async fn list_concerts(&self) -> Result<Vec<Concert>, StoreError> {
        self.check_online()?;
        let mut concerts = self.tables.lock().await.concerts.clone();
        concerts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(concerts)
    }

    async fn find_concert(&self, band_name: &str) -> Result<Option<Concert>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables.concerts.iter().find(|c| c.band_name == band_name).cloned())
    }

    async fn insert_photo(
        &self,
        concert_id: ConcertId,
        photo_url: &str,
        uploader_id: Option<&VoterId>,
    ) -> Result<Photo, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        if !tables.concerts.iter().any(|c| c.id == concert_id) {
            return Err(StoreError::NotFound("concert"));
        }
        let photo = Photo {
            id: tables.next_id(),
            concert_id,
            photo_url: photo_url.to_string(),
            uploader_id: uploader_id.cloned(),
            created_at: Utc::now(),
        };
        tables.photos.push(photo.clone());
        Ok(photo)
    }

    async fn list_photos(
        &self,
        concert_id: ConcertId,
        limit: Option<i64>,
    ) -> Result<Vec<Photo>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        let mut photos: Vec<Photo> = tables
            .photos
            .iter()
            .filter(|p| p.concert_id == concert_id)
            .cloned()
            .collect();
        photos.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        if let Some(limit) = limit {
            photos.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(photos)
    }

    async fn cast_vote(
        &self,
        photo_id: PhotoId,
        voter_id: &VoterId,
        polarity: bool,
    ) -> Result<Option<bool>, StoreError> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        if !tables.photos.iter().any(|p| p.id == photo_id) {
            return Err(StoreError::NotFound("photo"));
        }

        let is_pair =
            |v: &VoteRow| v.photo_id == Some(photo_id) && v.voter_id == voter_id.as_str();
        let current = tables
            .votes
            .iter()
            .filter(|&v| is_pair(v))
            .max_by_key(|v| (v.created_at, v.id))
            .map(|v| v.vote_type);

        let step = transition(current, polarity);
        if matches!(step, Transition::Retract | Transition::Replace(_)) {
            tables.votes.retain(|v| !is_pair(v));
        }
        if let Transition::Insert(vote_type) | Transition::Replace(vote_type) = step {
            let id = tables.next_id();
            tables.votes.push(VoteRow {
                id,
                photo_id: Some(photo_id),
                voter_id: voter_id.as_str().to_string(),
                vote_type,
                created_at: Utc::now(),
            });
        }
        Ok(step.outcome())
    }

    async fn list_votes_for_concert(
        &self,
        concert_id: ConcertId,
    ) -> Result<Vec<VoteRow>, StoreError> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        let photo_ids: Vec<PhotoId> = tables
            .photos
            .iter()
            .filter(|p| p.concert_id == concert_id)
            .map(|p| p.id)
            .collect();
        Ok(tables
            .votes
            .iter()
            .filter(|v| v.photo_id.is_some_and(|id| photo_ids.contains(&id)))
            .cloned()
            .collect())
    }
}
