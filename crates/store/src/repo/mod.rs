//! Repository over the library tables.
//!
//! Every write that touches more than one row runs in a transaction, so a
//! failure part-way through leaves the database as it was.

mod entity;
mod issue;
mod relations;
mod series;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::Counts;
use exn::ResultExt;
use rslug::slugify;
use sqlx::{SqliteConnection, SqlitePool};

/// Slug used when a name slugifies to nothing.
const EMPTY_SLUG: &str = "untitled";

/// Repository for the library database.
///
/// # Matching
///
/// Upserts look for an existing row in this order:
/// 1. the same external catalog id;
/// 2. the same slug, as long as that row doesn't belong to a *different*
///    external id (its id is adopted if it has none);
///
/// and otherwise insert a new row, suffixing the slug (`batman-1`,
/// `batman-2`, ...) until it is unique.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of rows in each table.
    pub async fn counts(&self) -> Result<Counts> {
        sqlx::query_as(include_str!("../../queries/counts.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}

/// Base slug for a display name, before any uniqueness suffix.
///
/// Quotation marks are stripped first so that `"Hush"` doesn't become `-hush-`.
pub(crate) fn slug_base(name: &str) -> String {
    const MARKS: [char; 13] = [
        '\u{0027}', '\u{0022}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201B}', '\u{0060}',
        '\u{00AB}', '\u{00BB}', '\u{2039}', '\u{203A}',
    ];
    let stripped: String = name.chars().filter(|c| !MARKS.contains(c)).collect();
    let slug = slugify!(&stripped);
    if slug.is_empty() { EMPTY_SLUG.to_string() } else { slug }
}

/// First of `base`, `base-1`, `base-2`, ... not already used in `table`.
pub(crate) async fn unique_slug(conn: &mut SqliteConnection, table: &str, base: &str) -> Result<String> {
    let sql = include_str!("../../queries/slug_exists.sql").replace("{table}", table);
    let mut suffix = 0u32;
    loop {
        let candidate = if suffix == 0 { base.to_string() } else { format!("{base}-{suffix}") };
        let (exists,): (i64,) = sqlx::query_as(&sql)
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if exists == 0 {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityDraft, EntityKind};
    use rstest::rstest;

    #[rstest]
    #[case("Batman", "batman")]
    #[case("The Champions & Inhumans", "the-champions-inhumans")]
    #[case("\"Hush\"", "hush")]
    #[case("Spider-Man’s Tangled Web", "spider-mans-tangled-web")]
    #[case("???", "untitled")]
    #[case("", "untitled")]
    fn test_slug_base(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slug_base(name), expected);
    }

    #[tokio::test]
    async fn test_unique_slug_suffixes() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(unique_slug(&mut conn, "arcs", "hush").await.unwrap(), "hush");
        drop(conn);
        repo.upsert_entity(EntityKind::Arc, &EntityDraft { cvid: Some(1), ..EntityDraft::named("Hush") }).await.unwrap();
        repo.upsert_entity(EntityKind::Arc, &EntityDraft { cvid: Some(2), ..EntityDraft::named("Hush") }).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(unique_slug(&mut conn, "arcs", "hush").await.unwrap(), "hush-2");
        // Other tables are unaffected.
        assert_eq!(unique_slug(&mut conn, "creators", "hush").await.unwrap(), "hush");
    }

    #[tokio::test]
    async fn test_counts() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        assert_eq!(repo.counts().await.unwrap(), Counts::default());
        repo.upsert_entity(EntityKind::Publisher, &EntityDraft::named("DC Comics")).await.unwrap();
        assert_eq!(repo.counts().await.unwrap().publishers, 1);
    }
}
