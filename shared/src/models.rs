use serde::{Serialize, Deserialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::validation::ValidationError;

pub const POLL_COLLECTION: &str = "pt.anto.polls.poll";
pub const VOTE_COLLECTION: &str = "pt.anto.polls.vote";

/// Projected row for a `pt.anto.polls.poll` record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub uri: String,
    pub author_did: String,
    pub cid: String,
    pub question: String,
    pub options: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub indexed_at: OffsetDateTime,
}

/// Projected row for a `pt.anto.polls.vote` record.
///
/// `option_index` is not checked against the poll's options here; see
/// [`crate::tally::PollResults`] for how out-of-range votes are read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub uri: String,
    pub author_did: String,
    pub poll_uri: String,
    pub option_index: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub indexed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub question: String,
    pub options: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrongRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(rename = "$type")]
    pub record_type: String,
    pub poll: StrongRef,
    pub option_index: i64,
    pub created_at: String,
}

fn format_datetime(at: OffsetDateTime) -> Result<String, ValidationError> {
    at.format(&Rfc3339)
        .map_err(|e| ValidationError::InvalidDatetime(e.to_string()))
}

impl PollRecord {
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        created_at: OffsetDateTime,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            record_type: POLL_COLLECTION.into(),
            question: question.into(),
            options,
            created_at: format_datetime(created_at)?,
        })
    }
}

impl VoteRecord {
    pub fn new(poll: &Poll, option_index: i32, created_at: OffsetDateTime) -> Result<Self, ValidationError> {
        Ok(Self {
            record_type: VOTE_COLLECTION.into(),
            poll: StrongRef {
                uri: poll.uri.clone(),
                cid: poll.cid.clone(),
            },
            option_index: i64::from(option_index),
            created_at: format_datetime(created_at)?,
        })
    }
}

impl Vote {
    pub fn is_for(&self, author_did: &str, poll_uri: &str) -> bool {
        self.author_did == author_did && self.poll_uri == poll_uri
    }
}
