use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    ColumnSet, Comment, Content, ContentKind, NewResource, Profile, ProfileChanges, Resource,
};
use super::store::{AuthoredCounts, ContentStore, LikeOutcome, Store};
use crate::filter::{Filter, ListFilter, SqlValue};

/// Embedded author of a joined `profiles a` row
const AUTHOR_JSON: &str = "CASE WHEN a.id IS NULL THEN NULL ELSE jsonb_build_object(\
    'id', a.id, 'full_name', a.full_name, 'username', a.username, 'avatar_url', a.avatar_url\
    ) END AS author";

/// Postgres-backed [`Store`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_all_as<O>(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<O>, DatabaseError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!(sql, params = params.len(), "fetch_all");
        let mut q = sqlx::query_as::<_, O>(sql);
        for p in params {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn fetch_optional_as<O>(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<O>, DatabaseError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!(sql, params = params.len(), "fetch_optional");
        let mut q = sqlx::query_as::<_, O>(sql);
        for p in params {
            q = bind_param_query_as(q, p);
        }
        Ok(q.fetch_optional(&self.pool).await?)
    }

    async fn fetch_one_as<O>(&self, sql: &str, params: &[SqlValue]) -> Result<O, DatabaseError>
    where
        O: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.fetch_optional_as(sql, params)
            .await?
            .ok_or_else(|| DatabaseError::QueryError("statement returned no row".to_string()))
    }
}

fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: &'q SqlValue,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::OptText(s) => q.bind(s.as_deref()),
        SqlValue::TextArray(items) => q.bind(items.as_slice()),
        SqlValue::BigInt(i) => q.bind(*i),
        SqlValue::Uuid(u) => q.bind(*u),
    }
}

/// `SELECT t.*, author FROM <source> t LEFT JOIN profiles a`
fn select_with_author(source: &str) -> String {
    format!(
        "SELECT t.*, {} FROM {} t LEFT JOIN profiles a ON a.id = t.author_id",
        AUTHOR_JSON, source
    )
}

fn select_comments(source: &str, parent_column: &str) -> String {
    format!(
        "SELECT c.id, c.\"{parent}\" AS parent_id, c.author_id, c.content, c.created_at, {author} \
         FROM {source} c LEFT JOIN profiles a ON a.id = c.author_id",
        parent = parent_column,
        author = AUTHOR_JSON,
        source = source
    )
}

/// `INSERT INTO <table> (author_id, ...) VALUES ($1, ...) RETURNING *`
fn insert_sql(
    table: &str,
    author_id: Uuid,
    columns: Vec<(&'static str, SqlValue)>,
) -> (String, Vec<SqlValue>) {
    let mut names = vec!["\"author_id\"".to_string()];
    let mut params = vec![SqlValue::Uuid(author_id)];
    for (column, value) in columns {
        names.push(format!("\"{}\"", column));
        params.push(value);
    }
    let placeholders = (1..=params.len())
        .map(|i| format!("${}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
        table,
        names.join(", "),
        placeholders
    );
    (sql, params)
}

/// `UPDATE <table> SET ..., updated_at = NOW() WHERE id = $1 RETURNING *`
fn update_sql(table: &str, id: Uuid, columns: Vec<(&'static str, SqlValue)>) -> (String, Vec<SqlValue>) {
    let mut params = vec![SqlValue::Uuid(id)];
    let mut assignments = Vec::with_capacity(columns.len() + 1);
    for (column, value) in columns {
        params.push(value);
        assignments.push(format!("\"{}\" = ${}", column, params.len()));
    }
    assignments.push("\"updated_at\" = NOW()".to_string());
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE id = $1 RETURNING *",
        table,
        assignments.join(", ")
    );
    (sql, params)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeChange {
    Add,
    Remove,
}

/// One statement that changes the like row and the counter together.
/// `$1` is the content id, `$2` the user id.
fn like_sql(kind: ContentKind, change: LikeChange) -> String {
    let table = kind.table();
    let likes = kind.likes_table();
    let parent = kind.parent_column();

    let (changed, counter) = match change {
        LikeChange::Add => (
            format!(
                "INSERT INTO \"{likes}\" (\"{parent}\", user_id) SELECT id, $2 FROM target \
                 ON CONFLICT (\"{parent}\", user_id) DO NOTHING RETURNING \"{parent}\" AS parent_id"
            ),
            "likes_count + 1",
        ),
        LikeChange::Remove => (
            format!(
                "DELETE FROM \"{likes}\" WHERE \"{parent}\" = $1 AND user_id = $2 \
                 RETURNING \"{parent}\" AS parent_id"
            ),
            "GREATEST(likes_count - 1, 0)",
        ),
    };

    format!(
        "WITH target AS (SELECT id, likes_count FROM \"{table}\" WHERE id = $1), \
         changed AS ({changed}), \
         bumped AS (UPDATE \"{table}\" SET likes_count = {counter} \
         WHERE id IN (SELECT parent_id FROM changed) RETURNING likes_count) \
         SELECT EXISTS (SELECT 1 FROM target) AS found, \
         (SELECT likes_count FROM bumped) AS bumped, \
         (SELECT likes_count FROM target) AS current"
    )
}

#[derive(Debug, FromRow)]
struct LikeRow {
    found: bool,
    bumped: Option<i32>,
    current: Option<i32>,
}

impl From<LikeRow> for LikeOutcome {
    fn from(row: LikeRow) -> Self {
        match row {
            LikeRow { found: false, .. } => LikeOutcome::Missing,
            LikeRow { bumped: Some(likes_count), .. } => LikeOutcome::Applied { likes_count },
            LikeRow { current, .. } => LikeOutcome::Unchanged {
                likes_count: current.unwrap_or(0),
            },
        }
    }
}

impl PgStore {
    async fn change_like(
        &self,
        kind: ContentKind,
        change: LikeChange,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, DatabaseError> {
        let sql = like_sql(kind, change);
        let row: LikeRow = self
            .fetch_one_as(&sql, &[SqlValue::Uuid(id), SqlValue::Uuid(user_id)])
            .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl<T: Content> ContentStore<T> for PgStore {
    async fn list(&self, filter: &ListFilter) -> Result<(Vec<T>, i64), DatabaseError> {
        let query = Filter::new(T::KIND.table(), "t")?
            .select(format!("t.*, {}", AUTHOR_JSON))
            .join("LEFT JOIN profiles a ON a.id = t.author_id")
            .assign(filter.clone());

        let page = query.to_sql();
        let rows: Vec<T> = self.fetch_all_as(&page.query, &page.params).await?;

        let count = query.to_count_sql();
        let (total,): (i64,) = self.fetch_one_as(&count.query, &count.params).await?;

        Ok((rows, total))
    }

    async fn find_and_count_view(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!(
            "WITH bumped AS (UPDATE \"{}\" SET views_count = views_count + 1 WHERE id = $1 RETURNING *) {}",
            T::KIND.table(),
            select_with_author("bumped")
        );
        self.fetch_optional_as(&sql, &[SqlValue::Uuid(id)]).await
    }

    async fn author_of(&self, id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let sql = format!("SELECT author_id FROM \"{}\" WHERE id = $1", T::KIND.table());
        let row: Option<(Uuid,)> = self.fetch_optional_as(&sql, &[SqlValue::Uuid(id)]).await?;
        Ok(row.map(|(author_id,)| author_id))
    }

    async fn insert(&self, author_id: Uuid, draft: &T::Draft) -> Result<T, DatabaseError> {
        let (insert, params) = insert_sql(T::KIND.table(), author_id, draft.columns());
        let sql = format!("WITH inserted AS ({}) {}", insert, select_with_author("inserted"));
        self.fetch_one_as(&sql, &params).await
    }

    async fn update(&self, id: Uuid, changes: &T::Changes) -> Result<Option<T>, DatabaseError> {
        let (update, params) = update_sql(T::KIND.table(), id, changes.columns());
        let sql = format!("WITH updated AS ({}) {}", update, select_with_author("updated"));
        self.fetch_optional_as(&sql, &params).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", T::KIND.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn liked_ids(&self, user_id: Uuid, ids: &[Uuid]) -> Result<HashSet<Uuid>, DatabaseError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let kind = T::KIND;
        let sql = format!(
            "SELECT \"{parent}\" FROM \"{likes}\" WHERE user_id = $1 AND \"{parent}\" = ANY($2)",
            parent = kind.parent_column(),
            likes = kind.likes_table()
        );
        let rows: Vec<(Uuid,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn like(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError> {
        self.change_like(T::KIND, LikeChange::Add, id, user_id).await
    }

    async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<LikeOutcome, DatabaseError> {
        self.change_like(T::KIND, LikeChange::Remove, id, user_id).await
    }

    async fn comments(&self, id: Uuid) -> Result<Vec<Comment>, DatabaseError> {
        let kind = T::KIND;
        let sql = format!(
            "{} WHERE c.\"{}\" = $1 ORDER BY c.created_at ASC",
            select_comments(&format!("\"{}\"", kind.comments_table()), kind.parent_column()),
            kind.parent_column()
        );
        self.fetch_all_as(&sql, &[SqlValue::Uuid(id)]).await
    }

    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, DatabaseError> {
        let kind = T::KIND;
        let mut tx = self.pool.begin().await?;

        // Bumping the counter first also locks the parent row until commit
        let bump = format!(
            "UPDATE \"{}\" SET comments_count = comments_count + 1 WHERE id = $1",
            kind.table()
        );
        let bumped = sqlx::query(&bump).bind(id).execute(&mut *tx).await?;
        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let insert = format!(
            "WITH inserted AS (INSERT INTO \"{comments}\" (\"{parent}\", author_id, content) \
             VALUES ($1, $2, $3) RETURNING *) {select}",
            comments = kind.comments_table(),
            parent = kind.parent_column(),
            select = select_comments("inserted", kind.parent_column())
        );
        let comment: Comment = sqlx::query_as(&insert)
            .bind(id)
            .bind(author_id)
            .bind(content)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(comment))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.fetch_optional_as("SELECT * FROM profiles WHERE id = $1", &[SqlValue::Uuid(user_id)])
            .await
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<Profile>, DatabaseError> {
        let (sql, params) = update_sql("profiles", user_id, changes.columns());
        self.fetch_optional_as(&sql, &params).await
    }

    async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<Option<Profile>, DatabaseError> {
        let (sql, params) = update_sql(
            "profiles",
            user_id,
            vec![("avatar_url", SqlValue::Text(url.to_string()))],
        );
        self.fetch_optional_as(&sql, &params).await
    }

    async fn resources_ready(&self) -> Result<bool, DatabaseError> {
        let (ready,): (bool,) = self
            .fetch_one_as("SELECT to_regclass('public.resources') IS NOT NULL", &[])
            .await?;
        Ok(ready)
    }

    async fn insert_resource(
        &self,
        author_id: Uuid,
        draft: &NewResource,
    ) -> Result<Resource, DatabaseError> {
        let (sql, params) = insert_sql("resources", author_id, draft.columns());
        self.fetch_one_as(&sql, &params).await
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, DatabaseError> {
        self.fetch_all_as("SELECT * FROM resources ORDER BY created_at DESC", &[])
            .await
    }

    async fn authored_counts(&self, user_id: Uuid) -> Result<AuthoredCounts, DatabaseError> {
        let (projects, ideas): (i64, i64) = self
            .fetch_one_as(
                "SELECT (SELECT COUNT(*) FROM projects WHERE author_id = $1), \
                 (SELECT COUNT(*) FROM ideas WHERE author_id = $1)",
                &[SqlValue::Uuid(user_id)],
            )
            .await?;
        Ok(AuthoredCounts { projects, ideas })
    }
}
