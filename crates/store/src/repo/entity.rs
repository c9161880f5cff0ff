use super::{Repository, slug_base, unique_slug};
use crate::error::{ErrorKind, Result};
use crate::models::{Entity, EntityDraft, EntityKind, EntityRow, Upsert, cvid_to_row};
use exn::ResultExt;
use sqlx::SqliteConnection;
use time::UtcDateTime;
use tracing::instrument;

fn entity_sql(template: &str, kind: EntityKind) -> String {
    template.replace("{table}", kind.table())
}

impl Repository {
    /// Get a publisher, creator or arc by its row id.
    pub async fn get_entity(&self, kind: EntityKind, id: i64) -> Result<Option<Entity>> {
        let row: Option<EntityRow> = sqlx::query_as(&entity_sql(include_str!("../../queries/entity/get.sql"), kind))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Entity::try_from).transpose()
    }

    /// Find a publisher, creator or arc by its external catalog id.
    pub async fn find_entity_by_cvid(&self, kind: EntityKind, cvid: u64) -> Result<Option<Entity>> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let row = Self::entity_by_cvid(&mut conn, kind, cvid_to_row(Some(cvid))?).await?;
        row.map(Entity::try_from).transpose()
    }

    /// Create or update a publisher, creator or arc.
    ///
    /// The slug is only assigned on creation; renaming an entity keeps its
    /// slug stable.
    #[instrument(level = "debug", skip_all, fields(%kind, name = %draft.name, cvid = ?draft.cvid))]
    pub async fn upsert_entity(&self, kind: EntityKind, draft: &EntityDraft) -> Result<Upsert<Entity>> {
        let cvid = cvid_to_row(draft.cvid)?;
        let now = UtcDateTime::now().unix_timestamp();
        let base = slug_base(&draft.name);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;

        let existing = match cvid {
            Some(_) => Self::entity_by_cvid(&mut tx, kind, cvid).await?,
            None => None,
        };
        let existing = match existing {
            Some(row) => Some(row),
            None => {
                let row: Option<EntityRow> =
                    sqlx::query_as(&entity_sql(include_str!("../../queries/entity/find_by_slug.sql"), kind))
                        .bind(&base)
                        .fetch_optional(&mut *tx)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                row.filter(|row| cvid.is_none() || row.cvid.is_none() || row.cvid == cvid)
            },
        };

        let upsert = match existing {
            Some(row) => {
                // What the catalog said outranks what a file said.
                let (name, description) = if cvid.is_none() && row.cvid.is_some() {
                    (&row.name, None)
                } else {
                    (&draft.name, draft.description.as_ref())
                };
                let row: EntityRow = sqlx::query_as(&entity_sql(include_str!("../../queries/entity/update.sql"), kind))
                    .bind(cvid)
                    .bind(name)
                    .bind(description)
                    .bind(now)
                    .bind(row.id)
                    .fetch_one(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                Upsert::Updated(row)
            },
            None => {
                let slug = unique_slug(&mut tx, kind.table(), &base).await?;
                let row: EntityRow = sqlx::query_as(&entity_sql(include_str!("../../queries/entity/insert.sql"), kind))
                    .bind(cvid)
                    .bind(&draft.name)
                    .bind(slug)
                    .bind(&draft.description)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                Upsert::Created(row)
            },
        };
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(match upsert {
            Upsert::Created(row) => Upsert::Created(row.try_into()?),
            Upsert::Updated(row) => Upsert::Updated(row.try_into()?),
        })
    }

    async fn entity_by_cvid(conn: &mut SqliteConnection, kind: EntityKind, cvid: Option<i64>) -> Result<Option<EntityRow>> {
        sqlx::query_as(&entity_sql(include_str!("../../queries/entity/find_by_cvid.sql"), kind))
            .bind(cvid)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn repo() -> Repository {
        Repository::from(&Database::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_then_update_by_cvid() {
        let repo = repo().await;
        let draft = EntityDraft { cvid: Some(10), name: "DC Comics".to_string(), description: None };
        let created = repo.upsert_entity(EntityKind::Publisher, &draft).await.unwrap();
        assert!(created.is_created());
        assert_eq!(created.get().slug, "dc-comics");

        let renamed = EntityDraft {
            cvid: Some(10),
            name: "DC".to_string(),
            description: Some("Detective Comics, Inc.".to_string()),
        };
        let updated = repo.upsert_entity(EntityKind::Publisher, &renamed).await.unwrap();
        assert!(!updated.is_created());
        let updated = updated.into_inner();
        assert_eq!(updated.id, created.get().id);
        assert_eq!(updated.name, "DC");
        // Slugs are stable across renames.
        assert_eq!(updated.slug, "dc-comics");
        assert_eq!(updated.description.as_deref(), Some("Detective Comics, Inc."));
    }

    #[tokio::test]
    async fn test_absent_description_keeps_existing() {
        let repo = repo().await;
        let draft = EntityDraft { cvid: Some(5), name: "Hush".to_string(), description: Some("Tommy".to_string()) };
        repo.upsert_entity(EntityKind::Arc, &draft).await.unwrap();
        let updated =
            repo.upsert_entity(EntityKind::Arc, &EntityDraft { cvid: Some(5), ..EntityDraft::named("Hush") }).await.unwrap();
        assert_eq!(updated.get().description.as_deref(), Some("Tommy"));
    }

    #[tokio::test]
    async fn test_slug_match_adopts_cvid() {
        let repo = repo().await;
        let local = repo.upsert_entity(EntityKind::Creator, &EntityDraft::named("Ed Brubaker")).await.unwrap();
        assert_eq!(local.get().cvid, None);
        let remote = EntityDraft { cvid: Some(40439), ..EntityDraft::named("Ed Brubaker") };
        let matched = repo.upsert_entity(EntityKind::Creator, &remote).await.unwrap();
        assert!(!matched.is_created());
        assert_eq!(matched.get().id, local.get().id);
        assert_eq!(matched.get().cvid, Some(40439));
        let found = repo.find_entity_by_cvid(EntityKind::Creator, 40439).await.unwrap().unwrap();
        assert_eq!(found.id, local.get().id);
    }

    #[tokio::test]
    async fn test_slug_match_without_cvid_reuses_remote_row() {
        let repo = repo().await;
        let remote = EntityDraft { cvid: Some(10), ..EntityDraft::named("DC Comics") };
        let created = repo.upsert_entity(EntityKind::Publisher, &remote).await.unwrap();
        let local = repo.upsert_entity(EntityKind::Publisher, &EntityDraft::named("DC Comics")).await.unwrap();
        assert!(!local.is_created());
        assert_eq!(local.get().id, created.get().id);
        assert_eq!(local.get().cvid, Some(10));
    }

    #[tokio::test]
    async fn test_slug_match_without_cvid_keeps_catalog_name() {
        let repo = repo().await;
        let local = repo.upsert_entity(EntityKind::Creator, &EntityDraft::named("Steve Ditko")).await.unwrap();
        let remote = EntityDraft {
            cvid: Some(2540),
            name: "Stephen J. Ditko".to_string(),
            description: Some("Co-creator of Spider-Man.".to_string()),
        };
        repo.upsert_entity(EntityKind::Creator, &remote).await.unwrap();

        let again = EntityDraft { description: Some("From a file.".to_string()), ..EntityDraft::named("Steve Ditko") };
        let matched = repo.upsert_entity(EntityKind::Creator, &again).await.unwrap().into_inner();
        assert_eq!(matched.id, local.get().id);
        assert_eq!(matched.name, "Stephen J. Ditko");
        assert_eq!(matched.slug, "steve-ditko");
        assert_eq!(matched.description.as_deref(), Some("Co-creator of Spider-Man."));
        assert_eq!(matched.cvid, Some(2540));
    }

    #[tokio::test]
    async fn test_different_cvids_with_same_name_get_distinct_slugs() {
        let repo = repo().await;
        let first = repo
            .upsert_entity(EntityKind::Arc, &EntityDraft { cvid: Some(1), ..EntityDraft::named("Secret Wars") })
            .await
            .unwrap();
        let second = repo
            .upsert_entity(EntityKind::Arc, &EntityDraft { cvid: Some(2), ..EntityDraft::named("Secret Wars") })
            .await
            .unwrap();
        assert!(second.is_created());
        assert_ne!(first.get().id, second.get().id);
        assert_eq!(first.get().slug, "secret-wars");
        assert_eq!(second.get().slug, "secret-wars-1");
    }

    #[tokio::test]
    async fn test_get_and_find_missing() {
        let repo = repo().await;
        assert!(repo.get_entity(EntityKind::Arc, 1).await.unwrap().is_none());
        assert!(repo.find_entity_by_cvid(EntityKind::Arc, 1).await.unwrap().is_none());
        let created = repo.upsert_entity(EntityKind::Arc, &EntityDraft::named("Knightfall")).await.unwrap();
        let fetched = repo.get_entity(EntityKind::Arc, created.get().id).await.unwrap().unwrap();
        assert_eq!(&fetched, created.get());
        // Kinds live in separate tables.
        assert!(repo.get_entity(EntityKind::Creator, created.get().id).await.unwrap().is_none());
    }
}
