use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    models::{Concert, ConcertId, Photo, PhotoId, VoteRow, VoterId},
    store::{Store, StoreError},
    votes::{Transition, transition},
};

/// Idempotent DDL, run once per statement at startup.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS concerts (
        id           BIGSERIAL PRIMARY KEY,
        band_name    TEXT NOT NULL UNIQUE,
        concert_date DATE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS photos (
        id          BIGSERIAL PRIMARY KEY,
        concert_id  BIGINT NOT NULL REFERENCES concerts(id),
        photo_url   TEXT NOT NULL,
        uploader_id TEXT,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    // photo_id is nullable so removing a photo out of band keeps the vote log.
    "CREATE TABLE IF NOT EXISTS votes (
        id         BIGSERIAL PRIMARY KEY,
        photo_id   BIGINT REFERENCES photos(id) ON DELETE SET NULL,
        voter_id   TEXT NOT NULL,
        vote_type  BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (photo_id, voter_id)
    )",
    "CREATE INDEX IF NOT EXISTS photos_concert_idx ON photos(concert_id, created_at DESC)",
];

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self { db })
    }

    pub async fn apply_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.db).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn create_concert(
        &self,
        band_name: &str,
        concert_date: Option<NaiveDate>,
    ) -> Result<Concert, StoreError> {
        let created: Option<Concert> = sqlx::query_as(
            "INSERT INTO concerts (band_name, concert_date)
             VALUES ($1, $2)
             ON CONFLICT (band_name) DO NOTHING
             RETURNING id, band_name, concert_date, created_at",
        )
        .bind(band_name)
        .bind(concert_date)
        .fetch_optional(&self.db)
        .await?;

        created.ok_or_else(|| StoreError::AlreadyExists(band_name.to_string()))
    }

    async fn list_concerts(&self) -> Result<Vec<Concert>, StoreError> {
        let concerts = sqlx::query_as(
            "SELECT id, band_name, concert_date, created_at FROM concerts
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(concerts)
    }

    async fn find_concert(&self, band_name: &str) -> Result<Option<Concert>, StoreError> {
        let concert = sqlx::query_as(
            "SELECT id, band_name, concert_date, created_at FROM concerts WHERE band_name = $1",
        )
        .bind(band_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(concert)
    }

    async fn insert_photo(
        &self,
        concert_id: ConcertId,
        photo_url: &str,
        uploader_id: Option<&VoterId>,
    ) -> Result<Photo, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM concerts WHERE id = $1)")
            .bind(concert_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(StoreError::NotFound("concert"));
        }

        let photo = sqlx::query_as(
            "INSERT INTO photos (concert_id, photo_url, uploader_id)
             VALUES ($1, $2, $3)
             RETURNING id, concert_id, photo_url, uploader_id, created_at",
        )
        .bind(concert_id)
        .bind(photo_url)
        .bind(uploader_id)
        .fetch_one(&self.db)
        .await?;
        Ok(photo)
    }

    async fn list_photos(
        &self,
        concert_id: ConcertId,
        limit: Option<i64>,
    ) -> Result<Vec<Photo>, StoreError> {
        // LIMIT NULL means no limit.
        let photos = sqlx::query_as(
            "SELECT id, concert_id, photo_url, uploader_id, created_at FROM photos
             WHERE concert_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
        )
        .bind(concert_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(photos)
    }

    async fn cast_vote(
        &self,
        photo_id: PhotoId,
        voter_id: &VoterId,
        polarity: bool,
    ) -> Result<Option<bool>, StoreError> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.db.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM photos WHERE id = $1)")
            .bind(photo_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StoreError::NotFound("photo"));
        }

        // Serializes toggles for this (photo, voter) pair until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text || '/' || $2, 0))")
            .bind(photo_id)
            .bind(voter_id)
            .execute(&mut *tx)
            .await?;

        let current: Option<bool> = sqlx::query_scalar(
            "SELECT vote_type FROM votes
             WHERE photo_id = $1 AND voter_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(photo_id)
        .bind(voter_id)
        .fetch_optional(&mut *tx)
        .await?;

        let step = transition(current, polarity);
        if matches!(step, Transition::Retract | Transition::Replace(_)) {
            sqlx::query("DELETE FROM votes WHERE photo_id = $1 AND voter_id = $2")
                .bind(photo_id)
                .bind(voter_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Transition::Insert(vote_type) | Transition::Replace(vote_type) = step {
            sqlx::query("INSERT INTO votes (photo_id, voter_id, vote_type) VALUES ($1, $2, $3)")
                .bind(photo_id)
                .bind(voter_id)
                .bind(vote_type)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(step.outcome())
    }

    async fn list_votes_for_concert(
        &self,
        concert_id: ConcertId,
    ) -> Result<Vec<VoteRow>, StoreError> {
        let votes = sqlx::query_as(
            "SELECT v.id, v.photo_id, v.voter_id, v.vote_type, v.created_at
             FROM votes v
             JOIN photos p ON p.id = v.photo_id
             WHERE p.concert_id = $1",
        )
        .bind(concert_id)
        .fetch_all(&self.db)
        .await?;
        Ok(votes)
    }
}
