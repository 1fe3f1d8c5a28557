//! Per (photo, voter) vote state machine.
//!
//! ```text
//! NoVote ──up──▶ Upvoted ──up──▶ NoVote
//! NoVote ─down─▶ Downvoted ─down─▶ NoVote
//! Upvoted ◀──────────────▶ Downvoted   (delete + insert)
//! ```

/// What a store has to do to move from the current polarity to the result of
/// a vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No live vote: insert one.
    Insert(bool),
    /// Same polarity again: delete the live vote.
    Retract,
    /// Opposite polarity: delete the live vote, then insert a new one.
    Replace(bool),
}

impl Transition {
    /// Effective polarity once the transition is applied.
    pub fn outcome(self) -> Option<bool> {
        match self {
            Transition::Insert(polarity) | Transition::Replace(polarity) => Some(polarity),
            Transition::Retract => None,
        }
    }
}

pub fn transition(current: Option<bool>, requested: bool) -> Transition {
    match current {
        None => Transition::Insert(requested),
        Some(live) if live == requested => Transition::Retract,
        Some(_) => Transition::Replace(requested),
    }
}
