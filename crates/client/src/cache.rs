use crate::models::GalleryEntry;

/// Where the gallery and vote mutations go. The server in production, a fake in tests.
pub(crate) trait GallerySource {
    async fn fetch_gallery(&self, band_name: &str) -> anyhow::Result<Vec<GalleryEntry>>;

    async fn cast_vote(&self, photo_id: i64, vote_type: bool) -> anyhow::Result<Option<bool>>;
}

/// Read-through cache of one event's ranked gallery.
///
/// Scores are never patched locally: a confirmed vote invalidates the cache and
/// the next read refetches the whole gallery. A failed vote leaves the cached
/// entries untouched. A failed refetch surfaces from `get`, never from `vote`,
/// since the vote itself is already committed by then.
pub(crate) struct GalleryCache<S> {
    source: S,
    band_name: String,
    entries: Option<Vec<GalleryEntry>>,
}

impl<S: GallerySource> GalleryCache<S> {
    pub fn new(source: S, band_name: impl Into<String>) -> Self {
        Self {
            source,
            band_name: band_name.into(),
            entries: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn band_name(&self) -> &str {
        &self.band_name
    }

    /// Entries from the last successful fetch, if still valid.
    pub fn cached(&self) -> Option<&[GalleryEntry]> {
        self.entries.as_deref()
    }

    pub fn invalidate(&mut self) {
        self.entries = None;
    }

    pub async fn get(&mut self) -> anyhow::Result<&[GalleryEntry]> {
        if self.entries.is_none() {
            self.entries = Some(self.source.fetch_gallery(&self.band_name).await?);
        }
        Ok(self.entries.as_deref().unwrap_or_default())
    }

    /// Sends the vote and invalidates on success. Returns the voter's new
    /// polarity on the photo.
    pub async fn vote(&mut self, photo_id: i64, vote_type: bool) -> anyhow::Result<Option<bool>> {
        let outcome = self.source.cast_vote(photo_id, vote_type).await?;
        self.invalidate();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        collections::HashMap,
    };

    use super::*;

    /// Toggle-voting fake for a single voter.
    #[derive(Default)]
    struct FakeSource {
        votes: RefCell<HashMap<i64, bool>>,
        fetches: Cell<usize>,
        fail_votes: Cell<bool>,
        fail_fetches: Cell<bool>,
    }

    impl GallerySource for FakeSource {
        async fn fetch_gallery(&self, _band_name: &str) -> anyhow::Result<Vec<GalleryEntry>> {
            if self.fail_fetches.get() {
                anyhow::bail!("Store unavailable: request timed out");
            }
            self.fetches.set(self.fetches.get() + 1);
            let votes = self.votes.borrow();
            let mut entries: Vec<GalleryEntry> = [1, 2]
                .into_iter()
                .map(|id| {
                    let your_vote = votes.get(&id).copied();
                    let score = match your_vote {
                        Some(true) => 1,
                        Some(false) => -1,
                        None => 0,
                    };
                    GalleryEntry {
                        id,
                        photo_url: format!("https://photos.example/{id}.jpg"),
                        uploader_id: None,
                        score,
                        upvotes: i64::from(your_vote == Some(true)),
                        downvotes: i64::from(your_vote == Some(false)),
                        your_vote,
                    }
                })
                .collect();
            entries.sort_by_key(|e| (std::cmp::Reverse(e.score), std::cmp::Reverse(e.id)));
            Ok(entries)
        }

        async fn cast_vote(&self, photo_id: i64, vote_type: bool) -> anyhow::Result<Option<bool>> {
            if self.fail_votes.get() {
                anyhow::bail!("Store unavailable: request timed out");
            }
            let mut votes = self.votes.borrow_mut();
            if votes.get(&photo_id) == Some(&vote_type) {
                votes.remove(&photo_id);
                Ok(None)
            } else {
                votes.insert(photo_id, vote_type);
                Ok(Some(vote_type))
            }
        }
    }

    #[tokio::test]
    async fn reads_through_once_until_invalidated() {
        let mut cache = GalleryCache::new(FakeSource::default(), "Low");
        assert!(cache.cached().is_none());

        cache.get().await.unwrap();
        cache.get().await.unwrap();
        assert_eq!(cache.source().fetches.get(), 1);

        cache.invalidate();
        cache.get().await.unwrap();
        assert_eq!(cache.source().fetches.get(), 2);
    }

    #[tokio::test]
    async fn confirmed_vote_refetches_the_ranking() {
        let mut cache = GalleryCache::new(FakeSource::default(), "Low");
        let ids: Vec<i64> = cache.get().await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1]);

        assert_eq!(cache.vote(1, true).await.unwrap(), Some(true));
        assert!(cache.cached().is_none());

        let entries = cache.get().await.unwrap();
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[0].your_vote, Some(true));
        assert_eq!(cache.source().fetches.get(), 2);

        assert_eq!(cache.vote(1, true).await.unwrap(), None);
        assert_eq!(cache.get().await.unwrap()[1].your_vote, None);
    }

    #[tokio::test]
    async fn failed_vote_keeps_prior_state() {
        let mut cache = GalleryCache::new(FakeSource::default(), "Low");
        cache.vote(2, false).await.unwrap();
        let before = cache.get().await.unwrap().to_vec();
        let fetches = cache.source().fetches.get();

        cache.source().fail_votes.set(true);
        assert!(cache.vote(2, true).await.is_err());

        assert_eq!(cache.cached().unwrap(), before.as_slice());
        assert_eq!(cache.source().fetches.get(), fetches);
    }

    #[tokio::test]
    async fn committed_vote_survives_a_failed_refresh() {
        let mut cache = GalleryCache::new(FakeSource::default(), "Low");
        cache.get().await.unwrap();

        cache.source().fail_fetches.set(true);
        assert_eq!(cache.vote(1, true).await.unwrap(), Some(true));
        assert!(cache.cached().is_none());
        assert!(cache.get().await.is_err());
        assert!(cache.cached().is_none());

        // Retrying the read shows the vote; nothing needs to be sent again.
        cache.source().fail_fetches.set(false);
        let entries = cache.get().await.unwrap();
        assert_eq!(entries[0].id, 1);
        assert_eq!(entries[0].your_vote, Some(true));
        assert_eq!(cache.source().votes.borrow().len(), 1);
    }
}
