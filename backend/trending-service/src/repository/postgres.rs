use super::ContentRepository;
use crate::error::{Result, TrendsError};
use crate::models::{Account, Reviewer, Status, StatusId, Visibility};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

/// Role permission bit granting trend moderation.
const MANAGE_TAXONOMIES: i64 = 1 << 8;

#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    id: i64,
    created_at: DateTime<Utc>,
    visibility: i16,
    spoiler_text: String,
    sensitive: bool,
    in_reply_to_id: Option<i64>,
    trendable: bool,
    reblogs_count: i64,
    favourites_count: i64,
    account_id: i64,
    username: String,
    discoverable: bool,
    silenced: bool,
    requested_review_at: Option<DateTime<Utc>>,
}

impl TryFrom<StatusRow> for Status {
    type Error = TrendsError;

    fn try_from(row: StatusRow) -> Result<Self> {
        let visibility = Visibility::from_i16(row.visibility).ok_or_else(|| {
            TrendsError::InvalidData(format!(
                "status {} has unknown visibility {}",
                row.id, row.visibility
            ))
        })?;

        Ok(Status {
            id: row.id,
            account: Account {
                id: row.account_id,
                username: row.username,
                discoverable: row.discoverable,
                silenced: row.silenced,
                requested_review_at: row.requested_review_at,
            },
            created_at: row.created_at,
            visibility,
            spoiler_text: row.spoiler_text,
            sensitive: row.sensitive,
            in_reply_to_id: row.in_reply_to_id,
            reblogs_count: row.reblogs_count,
            favourites_count: row.favourites_count,
            trendable: row.trendable,
            reblog: None,
        })
    }
}

/// Repository over the content database's `statuses` / `accounts` / `users` tables.
#[derive(Clone)]
pub struct PgContentRepository {
    pool: PgPool,
}

impl PgContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_statuses(&self, ids: &[StatusId]) -> Result<Vec<Status>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT s.id, s.created_at, s.visibility, COALESCE(s.spoiler_text, '') AS spoiler_text,
                   s.sensitive, s.in_reply_to_id,
                   COALESCE(s.trendable, a.trendable, FALSE) AS trendable,
                   COALESCE(ss.reblogs_count, 0) AS reblogs_count,
                   COALESCE(ss.favourites_count, 0) AS favourites_count,
                   a.id AS account_id, a.username,
                   COALESCE(a.discoverable, FALSE) AS discoverable,
                   a.silenced_at IS NOT NULL AS silenced,
                   a.requested_review_at
            FROM statuses s
            JOIN accounts a ON a.id = s.account_id
            LEFT JOIN status_stats ss ON ss.status_id = s.id
            WHERE s.id = ANY($1) AND s.deleted_at IS NULL
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        debug!(requested = ids.len(), found = rows.len(), "Fetched status snapshots");

        let mut statuses = Vec::with_capacity(rows.len());
        for row in rows {
            match Status::try_from(row) {
                Ok(status) => statuses.push(status),
                Err(e) => warn!(error = %e, "Skipping unreadable status row"),
            }
        }
        Ok(statuses)
    }

    async fn mark_review_requested(&self, status: &Status, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET requested_review_at = $2
            WHERE id = $1 AND requested_review_at IS NULL
            "#,
        )
        .bind(status.account.id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn trend_reviewers(&self) -> Result<Vec<Reviewer>> {
        let rows = sqlx::query_as::<_, (i64, String, String)>(
            r#"
            SELECT a.id, a.username, u.email
            FROM users u
            JOIN accounts a ON a.id = u.account_id
            JOIN user_roles r ON r.id = u.role_id
            WHERE u.disabled = FALSE
              AND u.trends_review_emails = TRUE
              AND (r.permissions & $1) <> 0
            ORDER BY a.id
            "#,
        )
        .bind(MANAGE_TAXONOMIES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(account_id, username, email)| Reviewer {
                account_id,
                username,
                email,
            })
            .collect())
    }
}
