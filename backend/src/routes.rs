use std::sync::Arc;
use rocket::{State, get, serde::json::Json};
use serde::Serialize;
use shared::models::*;
use shared::tally::PollResults;
use shared::uri::AtUri;
use tracing::instrument;
use crate::error::ApiError;
use crate::store::ProjectionStore;

pub struct AppState {
    pub store: Arc<dyn ProjectionStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProjectionStore>) -> Self {
        Self { store }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    pub poll: Poll,
    pub results: PollResults,
}

fn check_uri(uri: &str) -> Result<(), ApiError> {
    AtUri::parse(uri).map(|_| ()).map_err(|_| ApiError::InvalidUri)
}

#[get("/health")]
pub async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state))]
#[get("/polls?<uri>")]
pub async fn get_poll(state: &State<AppState>, uri: &str) -> Result<Json<PollView>, ApiError> {
    check_uri(uri)?;

    let poll = state.store.get_poll(uri).await?.ok_or(ApiError::NotFound)?;
    let votes = state.store.votes_for_poll(uri).await?;
    let results = PollResults::tally(&poll, &votes);

    Ok(Json(PollView { poll, results }))
}

#[instrument(skip(state))]
#[get("/polls/votes?<uri>")]
pub async fn list_votes(state: &State<AppState>, uri: &str) -> Result<Json<Vec<Vote>>, ApiError> {
    check_uri(uri)?;
    Ok(Json(state.store.votes_for_poll(uri).await?))
}

#[instrument(skip(state))]
#[get("/polls/vote?<uri>&<author>")]
pub async fn get_author_vote(state: &State<AppState>, uri: &str, author: &str) -> Result<Json<Vote>, ApiError> {
    check_uri(uri)?;

    state.store
        .vote_by_author(author, uri)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}
