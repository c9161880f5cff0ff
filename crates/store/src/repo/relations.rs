//! Issue credits and story arc links.

use super::Repository;
use crate::error::{ErrorKind, Result};
use crate::models::{Credit, CreditDraft, Entity, EntityRow};
use exn::ResultExt;
use sqlx::SqliteConnection;

#[derive(sqlx::FromRow)]
struct CreditRow {
    credit_id: i64,
    #[sqlx(flatten)]
    creator: EntityRow,
}

impl Repository {
    /// Replace every credit on an issue.
    ///
    /// Role names are shared across the library and created on first use.
    /// A creator listed twice has their roles merged.
    pub async fn set_issue_credits(&self, issue_id: i64, credits: &[CreditDraft]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../../queries/relations/delete_credits.sql"))
            .bind(issue_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for credit in credits {
            let (credit_id,): (i64,) = sqlx::query_as(include_str!("../../queries/relations/insert_credit.sql"))
                .bind(issue_id)
                .bind(credit.creator_id)
                .fetch_one(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            for role in credit.roles.iter().map(|role| role.trim()).filter(|role| !role.is_empty()) {
                let (role_id,): (i64,) = sqlx::query_as(include_str!("../../queries/relations/upsert_role.sql"))
                    .bind(role.to_lowercase())
                    .fetch_one(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                sqlx::query(include_str!("../../queries/relations/insert_credit_role.sql"))
                    .bind(credit_id)
                    .bind(role_id)
                    .execute(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(issue_id, credits = credits.len(), "Replaced issue credits");
        Ok(())
    }

    /// Replace every story arc an issue belongs to.
    ///
    /// Arcs left without any issue are deleted.
    pub async fn set_issue_arcs(&self, issue_id: i64, arc_ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../../queries/relations/delete_issue_arcs.sql"))
            .bind(issue_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for arc_id in arc_ids {
            sqlx::query(include_str!("../../queries/relations/insert_issue_arc.sql"))
                .bind(issue_id)
                .bind(arc_id)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Self::prune_orphan_arcs(&mut tx).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    /// Creators credited on an issue, ordered by name, each with their roles.
    pub async fn issue_credits(&self, issue_id: i64) -> Result<Vec<Credit>> {
        let rows: Vec<CreditRow> = sqlx::query_as(include_str!("../../queries/relations/issue_credits.sql"))
            .bind(issue_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut credits = Vec::with_capacity(rows.len());
        for row in rows {
            let roles: Vec<(String,)> = sqlx::query_as(include_str!("../../queries/relations/credit_roles.sql"))
                .bind(row.credit_id)
                .fetch_all(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
            credits.push(Credit {
                creator: row.creator.try_into()?,
                roles: roles.into_iter().map(|(name,)| name).collect(),
            });
        }
        Ok(credits)
    }

    /// Story arcs an issue belongs to, ordered by name.
    pub async fn issue_arcs(&self, issue_id: i64) -> Result<Vec<Entity>> {
        let rows: Vec<EntityRow> = sqlx::query_as(include_str!("../../queries/relations/issue_arcs.sql"))
            .bind(issue_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Entity::try_from).collect()
    }

    pub(crate) async fn prune_orphan_arcs(conn: &mut SqliteConnection) -> Result<u64> {
        let pruned = sqlx::query(include_str!("../../queries/relations/prune_orphan_arcs.sql"))
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "Deleted story arcs without issues");
        }
        Ok(pruned)
    }
}
