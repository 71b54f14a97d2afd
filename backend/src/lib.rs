pub mod actions;
pub mod catchers;
pub mod config;
pub mod error;
pub mod ingester;
pub mod optimistic;
pub mod queries;
pub mod reconciler;
pub mod repo;
pub mod routes;
pub mod store;

use rocket::{Build, Rocket};
use crate::catchers::{bad_request, internal_error, not_found};
use crate::routes::{get_author_vote, get_poll, health, list_votes, AppState};

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/api", rocket::routes![health, get_poll, list_votes, get_author_vote])
        .register("/", rocket::catchers![bad_request, not_found, internal_error])
}
