use sqlx::PgPool;
use shared::models::*;
use crate::error::StoreError;
use crate::store::ProjectionStore;

const POLL_COLUMNS: &str = "uri, author_did, cid, question, options, created_at, indexed_at";
const VOTE_COLUMNS: &str = "uri, author_did, poll_uri, option_index, created_at, indexed_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[rocket::async_trait]
impl ProjectionStore for PgStore {
    async fn upsert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO polls (uri, author_did, cid, question, options, created_at, indexed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (uri) DO UPDATE SET
                author_did = EXCLUDED.author_did,
                cid = EXCLUDED.cid,
                question = EXCLUDED.question,
                options = EXCLUDED.options,
                created_at = EXCLUDED.created_at,
                indexed_at = EXCLUDED.indexed_at"
        )
        .bind(&poll.uri)
        .bind(&poll.author_did)
        .bind(&poll.cid)
        .bind(&poll.question)
        .bind(&poll.options)
        .bind(poll.created_at)
        .bind(poll.indexed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_poll(&self, uri: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM polls WHERE uri = $1")
            .bind(uri)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// One statement keyed two ways: a row holding this `uri` under another
    /// `(author_did, poll_uri)` pair is removed, then the pair is upserted.
    /// Counting `displaced` makes the delete finish before the insert runs.
    async fn upsert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        sqlx::query(
            "WITH displaced AS (
                DELETE FROM votes
                WHERE uri = $1 AND (author_did <> $2 OR poll_uri <> $3)
                RETURNING uri
             )
             INSERT INTO votes (uri, author_did, poll_uri, option_index, created_at, indexed_at)
             SELECT $1, $2, $3, $4, $5, $6
             FROM (SELECT COUNT(*) FROM displaced) AS d
             ON CONFLICT (author_did, poll_uri) DO UPDATE SET
                uri = EXCLUDED.uri,
                option_index = EXCLUDED.option_index,
                created_at = EXCLUDED.created_at,
                indexed_at = EXCLUDED.indexed_at"
        )
        .bind(&vote.uri)
        .bind(&vote.author_did)
        .bind(&vote.poll_uri)
        .bind(vote.option_index)
        .bind(vote.created_at)
        .bind(vote.indexed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_vote(&self, uri: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM votes WHERE uri = $1")
            .bind(uri)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_poll(&self, uri: &str) -> Result<Option<Poll>, StoreError> {
        let poll = sqlx::query_as::<_, Poll>(&format!("SELECT {POLL_COLUMNS} FROM polls WHERE uri = $1"))
            .bind(uri)
            .fetch_optional(&self.pool)
            .await?;

        Ok(poll)
    }

    async fn votes_for_poll(&self, poll_uri: &str) -> Result<Vec<Vote>, StoreError> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE poll_uri = $1 ORDER BY created_at, uri"
        ))
        .bind(poll_uri)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn vote_by_author(&self, author_did: &str, poll_uri: &str) -> Result<Option<Vote>, StoreError> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE author_did = $1 AND poll_uri = $2"
        ))
        .bind(author_did)
        .bind(poll_uri)
        .fetch_optional(&self.pool)
        .await?;

        Ok(vote)
    }

    async fn load_cursor(&self, service: &str) -> Result<Option<i64>, StoreError> {
        let cursor = sqlx::query_scalar::<_, i64>("SELECT cursor_us FROM ingest_cursors WHERE service = $1")
            .bind(service)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cursor)
    }

    async fn save_cursor(&self, service: &str, cursor: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO ingest_cursors (service, cursor_us, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (service) DO UPDATE SET
                cursor_us = EXCLUDED.cursor_us,
                updated_at = EXCLUDED.updated_at"
        )
        .bind(service)
        .bind(cursor)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
