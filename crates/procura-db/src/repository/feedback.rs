//! SurrealDB implementation of [`FeedbackRepository`].

use chrono::{DateTime, Utc};
use procura_core::error::ProcuraResult;
use procura_core::models::feedback::{CreateFeedback, Feedback};
use procura_core::repository::{FeedbackRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct FeedbackRow {
    record_id: String,
    tender_id: String,
    bid_id: String,
    user_id: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl FeedbackRow {
    fn try_into_feedback(self) -> Result<Feedback, DbError> {
        Ok(Feedback {
            id: parse_uuid(&self.record_id, "feedback")?,
            tender_id: parse_uuid(&self.tender_id, "tender")?,
            bid_id: parse_uuid(&self.bid_id, "bid")?,
            user_id: parse_uuid(&self.user_id, "employee")?,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

const AUTHOR_CLAUSE: &str = "\
    tender_id = $tender_id AND bid_id INSIDE (\
        SELECT VALUE meta::id(id) FROM bid WHERE author_id = $author_id\
    )";

/// SurrealDB implementation of the feedback ledger.
#[derive(Clone)]
pub struct SurrealFeedbackRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeedbackRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> FeedbackRepository for SurrealFeedbackRepository<C> {
    async fn append(&self, input: CreateFeedback) -> ProcuraResult<Feedback> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('bid_feedback', $id) SET \
                 tender_id = $tender_id, bid_id = $bid_id, \
                 user_id = $user_id, description = $description; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('bid_feedback', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tender_id", input.tender_id.to_string()))
            .bind(("bid_id", input.bid_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<FeedbackRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "bid_feedback".into(),
            id: id_str,
        })?;

        Ok(row.try_into_feedback()?)
    }

    async fn list_for_author(
        &self,
        tender_id: Uuid,
        author_id: Uuid,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Feedback>> {
        let tender_str = tender_id.to_string();
        let author_str = author_id.to_string();

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM bid_feedback WHERE {AUTHOR_CLAUSE} GROUP ALL"
            ))
            .bind(("tender_id", tender_str.clone()))
            .bind(("author_id", author_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM bid_feedback \
                 WHERE {AUTHOR_CLAUSE} \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tender_id", tender_str))
            .bind(("author_id", author_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeedbackRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_feedback())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
