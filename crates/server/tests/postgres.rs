//! Runs the Postgres store against a live database.
//!
//! `DATABASE_URL=postgres://... cargo test -p frontrow --test postgres -- --ignored`

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use frontrow::{
    models::{Photo, VoterId},
    postgres::PgStore,
    ranking,
    store::{Store, StoreError},
};

async fn connect() -> Option<PgStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping postgres store tests: DATABASE_URL not set");
        return None;
    };
    let store = PgStore::connect(&url, 16, Duration::from_secs(5))
        .await
        .expect("connect to DATABASE_URL");
    store.apply_schema().await.expect("apply schema");
    Some(store)
}

/// A fresh concert with one photo, named uniquely so runs never collide.
async fn fresh_photo(store: &PgStore) -> Photo {
    let band = format!("pg-test-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let concert = store.create_concert(&band, None).await.expect("create concert");
    store
        .insert_photo(concert.id, "https://photos.example/pg.jpg", None)
        .await
        .expect("insert photo")
}

async fn rows_for(store: &PgStore, photo: &Photo, voter: &VoterId) -> Vec<bool> {
    let rows = store
        .list_votes_for_concert(photo.concert_id)
        .await
        .expect("list votes");
    ranking::well_formed(rows)
        .into_iter()
        .filter(|v| v.photo_id == photo.id && &v.voter_id == voter)
        .map(|v| v.vote_type)
        .collect()
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn toggle_and_flip_against_postgres() {
    let Some(store) = connect().await else {
        return;
    };
    let photo = fresh_photo(&store).await;
    let u1 = VoterId::parse("pg-u1").unwrap();

    assert_eq!(store.cast_vote(photo.id, &u1, true).await.unwrap(), Some(true));
    assert_eq!(rows_for(&store, &photo, &u1).await, vec![true]);

    assert_eq!(store.cast_vote(photo.id, &u1, false).await.unwrap(), Some(false));
    assert_eq!(rows_for(&store, &photo, &u1).await, vec![false]);

    assert_eq!(store.cast_vote(photo.id, &u1, false).await.unwrap(), None);
    assert!(rows_for(&store, &photo, &u1).await.is_empty());

    let err = store.cast_vote(-1, &u1, true).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound("photo")));

    let dup = store.create_concert(&format!("dup-{}", photo.id), None).await.unwrap();
    assert!(matches!(
        store.create_concert(&dup.band_name, None).await,
        Err(StoreError::AlreadyExists(_))
    ));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_toggles_serialize_against_postgres() {
    let Some(store) = connect().await else {
        return;
    };
    let store = Arc::new(store);
    let photo = fresh_photo(&store).await;
    let u1 = VoterId::parse("pg-racer").unwrap();
    let photo_id = photo.id;

    // An even number of identical toggles must end with no vote and no duplicates.
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let u1 = u1.clone();
            tokio::spawn(async move { store.cast_vote(photo_id, &u1, true).await })
        })
        .collect();

    let mut on = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == Some(true) {
            on += 1;
        }
    }

    assert_eq!(on, 4);
    assert!(rows_for(&store, &photo, &u1).await.is_empty());
}
