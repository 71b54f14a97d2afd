use serde::de::DeserializeOwned;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use crate::models::{PollRecord, VoteRecord, POLL_COLLECTION, VOTE_COLLECTION};
use crate::uri::AtUri;

pub const MAX_QUESTION_LENGTH: usize = 300;
pub const MAX_OPTION_LENGTH: usize = 100;
pub const MAX_OPTIONS: usize = 20;
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unexpected record type: {0}")]
    WrongType(String),
    #[error("Malformed record: {0}")]
    Malformed(String),
    #[error("Empty question text")]
    EmptyQuestion,
    #[error("Question exceeds maximum length of {MAX_QUESTION_LENGTH}")]
    QuestionTooLong,
    #[error("Too many options (maximum {MAX_OPTIONS})")]
    TooManyOptions,
    #[error("Too few options (minimum {MIN_OPTIONS})")]
    TooFewOptions,
    #[error("Empty option text")]
    EmptyOption,
    #[error("Option text exceeds maximum length of {MAX_OPTION_LENGTH}")]
    OptionTooLong,
    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
    #[error("Invalid option index: {0}")]
    InvalidOptionIndex(i64),
    #[error("Invalid poll reference: {0}")]
    InvalidPollRef(String),
    #[error("Record contains a NUL character")]
    NulCharacter,
}

/// Accepts both `<nsid>` and `<nsid>#main` as the `$type` of a record.
pub fn is_record_type(record_type: &str, nsid: &str) -> bool {
    match record_type.strip_prefix(nsid) {
        Some("") | Some("#main") => true,
        _ => false,
    }
}

fn decode<T: DeserializeOwned>(value: &Value, nsid: &str) -> Result<T, ValidationError> {
    let record_type = value
        .get("$type")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::WrongType("<missing>".into()))?;

    if !is_record_type(record_type, nsid) {
        return Err(ValidationError::WrongType(record_type.to_string()));
    }

    serde_json::from_value(value.clone()).map_err(|e| ValidationError::Malformed(e.to_string()))
}

/// Postgres text columns cannot hold NUL, so any stored string containing one
/// is rejected up front.
pub fn check_no_nul<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<(), ValidationError> {
    if fields.into_iter().any(|field| field.contains('\0')) {
        return Err(ValidationError::NulCharacter);
    }
    Ok(())
}

fn parse_datetime(value: &str) -> Result<OffsetDateTime, ValidationError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| ValidationError::InvalidDatetime(value.to_string()))
}

/// Checks the `$type` discriminant and decodes the record shape. Field
/// constraints are left to [`validate_poll_record`].
pub fn decode_poll_record(value: &Value) -> Result<PollRecord, ValidationError> {
    decode(value, POLL_COLLECTION)
}

pub fn decode_vote_record(value: &Value) -> Result<VoteRecord, ValidationError> {
    decode(value, VOTE_COLLECTION)
}

/// Returns the parsed `createdAt` on success.
pub fn validate_poll_record(record: &PollRecord) -> Result<OffsetDateTime, ValidationError> {
    if !is_record_type(&record.record_type, POLL_COLLECTION) {
        return Err(ValidationError::WrongType(record.record_type.clone()));
    }

    check_no_nul(std::iter::once(record.question.as_str()).chain(record.options.iter().map(String::as_str)))?;

    let question = record.question.trim();
    if question.is_empty() { return Err(ValidationError::EmptyQuestion); }
    if question.chars().count() > MAX_QUESTION_LENGTH { return Err(ValidationError::QuestionTooLong); }
    if record.options.len() > MAX_OPTIONS { return Err(ValidationError::TooManyOptions); }
    if record.options.len() < MIN_OPTIONS { return Err(ValidationError::TooFewOptions); }
    if record.options.iter().any(|opt| opt.trim().is_empty()) { return Err(ValidationError::EmptyOption); }
    if record.options.iter().any(|opt| opt.chars().count() > MAX_OPTION_LENGTH) { return Err(ValidationError::OptionTooLong); }

    parse_datetime(&record.created_at)
}

/// Returns the parsed `createdAt` on success. The option index is only
/// checked for sign and width here; the poll's option count is not known.
pub fn validate_vote_record(record: &VoteRecord) -> Result<OffsetDateTime, ValidationError> {
    if !is_record_type(&record.record_type, VOTE_COLLECTION) {
        return Err(ValidationError::WrongType(record.record_type.clone()));
    }

    check_no_nul([record.poll.uri.as_str(), record.poll.cid.as_str()])?;

    if i32::try_from(record.option_index).map_or(true, |i| i < 0) {
        return Err(ValidationError::InvalidOptionIndex(record.option_index));
    }

    let poll = AtUri::parse(&record.poll.uri)
        .map_err(|_| ValidationError::InvalidPollRef(record.poll.uri.clone()))?;
    if poll.collection != POLL_COLLECTION || record.poll.cid.trim().is_empty() {
        return Err(ValidationError::InvalidPollRef(record.poll.uri.clone()));
    }

    parse_datetime(&record.created_at)
}
