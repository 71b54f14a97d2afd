//! Classification of relay events into projection mutations.
//!
//! The record namespace is open: anyone can write records under the tracked
//! collections, so anything that does not decode and validate is rejected
//! rather than treated as an error.

use thiserror::Error;
use time::OffsetDateTime;
use crate::event::{EventKind, RepoEvent};
use crate::models::{Poll, Vote, POLL_COLLECTION, VOTE_COLLECTION};
use crate::validation::{
    check_no_nul, decode_poll_record, decode_vote_record, validate_poll_record, validate_vote_record, ValidationError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    UpsertPoll(Poll),
    DeletePoll { uri: String },
    UpsertVote(Vote),
    DeleteVote { uri: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Collection not tracked: {0}")]
    ForeignCollection(String),
    #[error("Missing record payload")]
    MissingRecord,
    #[error("Missing record cid")]
    MissingCid,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Accepted(Mutation),
    Rejected(Rejection),
}

impl From<Result<Mutation, Rejection>> for Classified {
    fn from(result: Result<Mutation, Rejection>) -> Self {
        match result {
            Ok(mutation) => Classified::Accepted(mutation),
            Err(rejection) => Classified::Rejected(rejection),
        }
    }
}

/// Total over every input; `now` becomes the row's `indexed_at`.
pub fn classify(event: &RepoEvent, now: OffsetDateTime) -> Classified {
    let tracked = event.collection == POLL_COLLECTION || event.collection == VOTE_COLLECTION;
    if !tracked {
        return Classified::Rejected(Rejection::ForeignCollection(event.collection.clone()));
    }

    let identity = [event.uri.as_str(), event.author.as_str()].into_iter().chain(event.cid.as_deref());
    if let Err(e) = check_no_nul(identity) {
        return Classified::Rejected(e.into());
    }

    let is_poll = event.collection == POLL_COLLECTION;
    match event.kind {
        EventKind::Delete if is_poll => Classified::Accepted(Mutation::DeletePoll { uri: event.uri.clone() }),
        EventKind::Delete => Classified::Accepted(Mutation::DeleteVote { uri: event.uri.clone() }),
        EventKind::Create | EventKind::Update if is_poll => poll_mutation(event, now).into(),
        EventKind::Create | EventKind::Update => vote_mutation(event, now).into(),
    }
}

fn poll_mutation(event: &RepoEvent, now: OffsetDateTime) -> Result<Mutation, Rejection> {
    let value = event.record.as_ref().ok_or(Rejection::MissingRecord)?;
    let record = decode_poll_record(value)?;
    let created_at = validate_poll_record(&record)?;
    let cid = event.cid.clone().ok_or(Rejection::MissingCid)?;

    Ok(Mutation::UpsertPoll(Poll {
        uri: event.uri.clone(),
        author_did: event.author.clone(),
        cid,
        question: record.question,
        options: record.options,
        created_at,
        indexed_at: now,
    }))
}

fn vote_mutation(event: &RepoEvent, now: OffsetDateTime) -> Result<Mutation, Rejection> {
    let value = event.record.as_ref().ok_or(Rejection::MissingRecord)?;
    let record = decode_vote_record(value)?;
    let created_at = validate_vote_record(&record)?;
    let option_index = i32::try_from(record.option_index)
        .map_err(|_| ValidationError::InvalidOptionIndex(record.option_index))?;

    Ok(Mutation::UpsertVote(Vote {
        uri: event.uri.clone(),
        author_did: event.author.clone(),
        poll_uri: record.poll.uri,
        option_index,
        created_at,
        indexed_at: now,
    }))
}
