//! Scores and display order for an event's photos.
//!
//! Everything here is a pure function of its inputs. Ties in score are broken
//! newest-first by `created_at`, then by descending id, so the order never
//! depends on how the inputs happened to be sorted.

use std::{cmp::Reverse, collections::HashMap};

use crate::models::{GalleryEntry, Photo, PhotoId, Vote, VoteRow, VoterId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl Tally {
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    fn add(&mut self, vote_type: bool) {
        if vote_type {
            self.upvotes += 1;
        } else {
            self.downvotes += 1;
        }
    }
}

/// Drops rows without a photo reference or with a blank voter.
pub fn well_formed(rows: Vec<VoteRow>) -> Vec<Vote> {
    let total = rows.len();
    let votes: Vec<Vote> = rows
        .into_iter()
        .filter_map(|row| {
            Some(Vote {
                id: row.id,
                photo_id: row.photo_id?,
                voter_id: VoterId::parse(&row.voter_id)?,
                vote_type: row.vote_type,
                created_at: row.created_at,
            })
        })
        .collect();

    let dropped = total - votes.len();
    if dropped > 0 {
        tracing::debug!(dropped, "ignoring malformed vote rows");
    }
    votes
}

pub fn tally(votes: &[Vote]) -> HashMap<PhotoId, Tally> {
    let mut tallies: HashMap<PhotoId, Tally> = HashMap::new();
    for vote in votes {
        tallies.entry(vote.photo_id).or_default().add(vote.vote_type);
    }
    tallies
}

/// Upvotes minus downvotes for one photo; 0 when it has no votes.
pub fn score(photo_id: PhotoId, votes: &[Vote]) -> i64 {
    votes
        .iter()
        .filter(|v| v.photo_id == photo_id)
        .map(|v| if v.vote_type { 1 } else { -1 })
        .sum()
}

fn ordered<'a>(photos: &'a [Photo], tallies: &HashMap<PhotoId, Tally>) -> Vec<&'a Photo> {
    let mut ordered: Vec<&Photo> = photos.iter().collect();
    ordered.sort_by_key(|p| {
        let score = tallies.get(&p.id).map(Tally::score).unwrap_or(0);
        (Reverse(score), Reverse(p.created_at), Reverse(p.id))
    });
    ordered
}

/// Photo ids by descending score. Votes for photos outside `photos` are ignored.
pub fn rank(photos: &[Photo], votes: &[Vote]) -> Vec<PhotoId> {
    let tallies = tally(votes);
    ordered(photos, &tallies).into_iter().map(|p| p.id).collect()
}

/// The voter's live polarity on a photo. If duplicates exist for the pair the
/// most recent one wins.
pub fn current_user_polarity(photo_id: PhotoId, voter_id: &VoterId, votes: &[Vote]) -> Option<bool> {
    votes
        .iter()
        .filter(|v| v.photo_id == photo_id && &v.voter_id == voter_id)
        .max_by_key(|v| (v.created_at, v.id))
        .map(|v| v.vote_type)
}

/// Ranked photos with their tallies and, when a voter is given, that voter's polarity.
pub fn gallery(photos: &[Photo], votes: &[Vote], voter_id: Option<&VoterId>) -> Vec<GalleryEntry> {
    let tallies = tally(votes);
    ordered(photos, &tallies)
        .into_iter()
        .map(|photo| {
            let t = tallies.get(&photo.id).copied().unwrap_or_default();
            GalleryEntry {
                photo: photo.clone(),
                score: t.score(),
                upvotes: t.upvotes,
                downvotes: t.downvotes,
                your_vote: voter_id.and_then(|voter| current_user_polarity(photo.id, voter, votes)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap()
    }

    fn photo(id: PhotoId, minutes: i64) -> Photo {
        Photo {
            id,
            concert_id: 1,
            photo_url: format!("https://photos.example/{id}.jpg"),
            uploader_id: None,
            created_at: t0() + Duration::minutes(minutes),
        }
    }

    fn voter(name: &str) -> VoterId {
        VoterId::parse(name).unwrap()
    }

    fn vote(id: i64, photo_id: PhotoId, who: &str, up: bool) -> Vote {
        Vote {
            id,
            photo_id,
            voter_id: voter(who),
            vote_type: up,
            created_at: t0() + Duration::seconds(id),
        }
    }

    /// `ups` upvotes and `downs` downvotes on one photo from distinct voters.
    fn votes_for(photo_id: PhotoId, ups: usize, downs: usize, next_id: &mut i64) -> Vec<Vote> {
        let mut out = Vec::new();
        for (n, up) in std::iter::repeat(true)
            .take(ups)
            .chain(std::iter::repeat(false).take(downs))
            .enumerate()
        {
            *next_id += 1;
            out.push(vote(*next_id, photo_id, &format!("u{photo_id}-{n}"), up));
        }
        out
    }

    #[test]
    fn unreferenced_photo_scores_zero() {
        let votes = vec![vote(1, 10, "a", true), vote(2, 11, "b", false)];
        assert_eq!(score(99, &votes), 0);
        assert_eq!(score(99, &[]), 0);
    }

    #[test]
    fn score_is_upvotes_minus_downvotes() {
        let mut id = 0;
        let mut votes = votes_for(1, 4, 1, &mut id);
        votes.extend(votes_for(2, 1, 3, &mut id));
        assert_eq!(score(1, &votes), 3);
        assert_eq!(score(2, &votes), -2);

        let tallies = tally(&votes);
        assert_eq!(tallies[&1], Tally { upvotes: 4, downvotes: 1 });
        assert_eq!(tallies[&2].score(), -2);
    }

    #[test]
    fn rank_orders_by_descending_score() {
        // P1 = 3, P2 = 5, P3 = 0
        let photos = vec![photo(1, 0), photo(2, 1), photo(3, 2)];
        let mut id = 0;
        let mut votes = votes_for(1, 3, 0, &mut id);
        votes.extend(votes_for(2, 6, 1, &mut id));

        assert_eq!(rank(&photos, &votes), vec![2, 1, 3]);
    }

    #[test]
    fn rank_is_repeatable() {
        let photos = vec![photo(1, 0), photo(2, 0), photo(3, 5), photo(4, 1)];
        let mut id = 0;
        let mut votes = votes_for(1, 1, 0, &mut id);
        votes.extend(votes_for(3, 1, 0, &mut id));
        votes.extend(votes_for(4, 0, 2, &mut id));

        let first = rank(&photos, &votes);
        for _ in 0..10 {
            assert_eq!(rank(&photos, &votes), first);
        }
    }

    #[test]
    fn equal_scores_put_the_newer_photo_first() {
        let older = photo(1, 0);
        let newer = photo(2, 30);
        let mut id = 0;
        let mut votes = votes_for(1, 2, 0, &mut id);
        votes.extend(votes_for(2, 3, 1, &mut id));

        // Input order must not matter.
        for photos in [vec![older.clone(), newer.clone()], vec![newer.clone(), older.clone()]] {
            for _ in 0..5 {
                assert_eq!(rank(&photos, &votes), vec![2, 1]);
            }
        }
    }

    #[test]
    fn same_timestamp_falls_back_to_higher_id() {
        let photos = vec![photo(7, 0), photo(9, 0), photo(8, 0)];
        assert_eq!(rank(&photos, &[]), vec![9, 8, 7]);
    }

    #[test]
    fn votes_for_unknown_photos_are_ignored_by_rank() {
        let photos = vec![photo(1, 0)];
        let votes = vec![vote(1, 42, "a", true)];
        assert_eq!(rank(&photos, &votes), vec![1]);
    }

    #[test]
    fn polarity_is_found_per_photo_and_voter() {
        let votes = vec![
            vote(1, 1, "alice", true),
            vote(2, 1, "bob", false),
            vote(3, 2, "alice", false),
        ];
        assert_eq!(current_user_polarity(1, &voter("alice"), &votes), Some(true));
        assert_eq!(current_user_polarity(1, &voter("bob"), &votes), Some(false));
        assert_eq!(current_user_polarity(2, &voter("alice"), &votes), Some(false));
        assert_eq!(current_user_polarity(2, &voter("bob"), &votes), None);
    }

    #[test]
    fn duplicate_votes_resolve_to_the_most_recent() {
        let votes = vec![vote(5, 1, "alice", false), vote(3, 1, "alice", true)];
        assert_eq!(current_user_polarity(1, &voter("alice"), &votes), Some(false));

        let mut same_time = vec![vote(3, 1, "alice", true), vote(4, 1, "alice", false)];
        for v in &mut same_time {
            v.created_at = t0();
        }
        assert_eq!(current_user_polarity(1, &voter("alice"), &same_time), Some(false));
    }

    #[test]
    fn malformed_rows_are_filtered() {
        let row = |id, photo_id, voter: &str| VoteRow {
            id,
            photo_id,
            voter_id: voter.to_string(),
            vote_type: true,
            created_at: t0(),
        };
        let votes = well_formed(vec![row(1, Some(1), "a"), row(2, None, "b"), row(3, Some(1), "  ")]);
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].id, 1);
    }

    #[test]
    fn gallery_carries_tallies_and_viewer_polarity() {
        let photos = vec![photo(1, 0), photo(2, 1)];
        let votes = vec![
            vote(1, 1, "alice", true),
            vote(2, 1, "bob", true),
            vote(3, 2, "alice", false),
        ];

        let entries = gallery(&photos, &votes, Some(&voter("alice")));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].photo.id, 1);
        assert_eq!((entries[0].score, entries[0].upvotes, entries[0].downvotes), (2, 2, 0));
        assert_eq!(entries[0].your_vote, Some(true));
        assert_eq!(entries[1].score, -1);
        assert_eq!(entries[1].your_vote, Some(false));

        let anonymous = gallery(&photos, &votes, None);
        assert!(anonymous.iter().all(|e| e.your_vote.is_none()));
    }
}
