//! Embedded SQLite backend for the graph store
//!
//! Articles and tags live in plain rowid tables whose `identity` column
//! is the store-internal identity surfaced in result rows. Links are
//! join rows with a JSON attribute map. Regex predicates run through a
//! registered `regexp` scalar function so statements can match the
//! patterns built by the matching engine.

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use super::engine::{GraphEngine, OpenGraph, Statement, StoreError, StoreResult};
use super::pool::{SessionPool, DEFAULT_POOL_SIZE};
use super::row::{EdgeRecord, Field, NodeRecord, Properties, Row, Value};
use crate::graph::{color_property, Article, ArticleId, Color, TagId};

use async_trait::async_trait;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One joined (article, tag, link) row as read from SQLite.
type LinkTriple = (
    i64,
    String,
    String,
    String,
    String,
    i64,
    String,
    String,
    i64,
    i64,
    i64,
    String,
);

/// SQLite-backed graph store
///
/// Holds a bounded pool of connections; every statement checks one out
/// for its duration and runs on the blocking thread pool. All
/// connections share one database file (WAL mode), so concurrent reads
/// proceed during writes.
pub struct SqliteGraph {
    pool: SessionPool,
}

impl SqliteGraph {
    /// Open or create a store at the given path with a custom pool size.
    pub fn open_with(path: impl AsRef<Path>, pool_size: usize) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let first = Self::open_connection(path.as_ref())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init_schema(&first).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let mut connections = vec![first];
        for _ in 1..pool_size.max(1) {
            let conn = Self::open_connection(path.as_ref())
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            connections.push(conn);
        }

        Ok(Self {
            pool: SessionPool::new(connections),
        })
    }

    fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(conn)
    }

    /// Per-connection setup: regexp function, busy timeout, pragmas.
    fn configure(conn: &Connection) -> rusqlite::Result<()> {
        register_regexp(conn)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            r#"
            -- Article nodes. `identity` is the internal identity; `id`
            -- is the stable external identifier.
            CREATE TABLE IF NOT EXISTS articles (
                identity INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                text TEXT NOT NULL,
                date TEXT NOT NULL,
                UNIQUE (title, date)
            );

            -- Tag nodes. Display names are unique by value.
            CREATE TABLE IF NOT EXISTS tags (
                identity INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                tag TEXT NOT NULL UNIQUE
            );

            -- Article->Tag links with a JSON attribute map.
            CREATE TABLE IF NOT EXISTS article_tags (
                identity INTEGER PRIMARY KEY,
                article_identity INTEGER NOT NULL,
                tag_identity INTEGER NOT NULL,
                properties_json TEXT NOT NULL DEFAULT '{}',
                UNIQUE (article_identity, tag_identity),
                FOREIGN KEY (article_identity) REFERENCES articles(identity) ON DELETE CASCADE,
                FOREIGN KEY (tag_identity) REFERENCES tags(identity) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_article_tags_article
                ON article_tags(article_identity);
            CREATE INDEX IF NOT EXISTS idx_article_tags_tag
                ON article_tags(tag_identity);

            -- Tag->Tag hierarchy links, written during ingestion.
            CREATE TABLE IF NOT EXISTS tag_tags (
                identity INTEGER PRIMARY KEY,
                parent_identity INTEGER NOT NULL,
                child_identity INTEGER NOT NULL,
                UNIQUE (parent_identity, child_identity),
                FOREIGN KEY (parent_identity) REFERENCES tags(identity) ON DELETE CASCADE,
                FOREIGN KEY (child_identity) REFERENCES tags(identity) ON DELETE CASCADE
            );

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    fn run_statement(conn: &Connection, statement: &Statement) -> StoreResult<Vec<Row>> {
        Self::dispatch(conn, statement).map_err(|e| e.for_statement(statement.name()))
    }

    fn dispatch(conn: &Connection, statement: &Statement) -> StoreResult<Vec<Row>> {
        match statement {
            Statement::TagsByPattern { pattern } => Self::tags_by_pattern(conn, pattern.as_deref()),
            Statement::ArticlesByTagPattern { pattern } => {
                Self::articles_by_tag_pattern(conn, pattern)
            }
            Statement::ArticlesByText { pattern } => Self::articles_by_text(conn, pattern),
            Statement::ArticlesForTag { tag_id } => Self::articles_for_tag(conn, tag_id),
            Statement::TagsForArticle {
                article_id,
                include,
            } => Self::tags_for_article(conn, article_id, include),
            Statement::CountTagLinks { tag_id } => Self::count_tag_links(conn, tag_id),
            Statement::UpsertTag { id, name } => Self::upsert_tag(conn, id, name),
            Statement::UpsertArticle { article } => Self::upsert_article(conn, article),
            Statement::LinkArticleTag {
                article_id,
                tag_id,
            } => Self::link_article_tag(conn, article_id, tag_id),
            Statement::LinkMatchingArticles { tag_id, pattern } => {
                Self::link_matching_articles(conn, tag_id, pattern)
            }
            Statement::LinkSubtag {
                parent_id,
                child_id,
            } => Self::link_subtag(conn, parent_id, child_id),
            Statement::UnlinkArticleTag {
                article_id,
                tag_id,
            } => Self::unlink_article_tag(conn, article_id, tag_id),
            Statement::DeleteTag { tag_id } => Self::delete_tag(conn, tag_id),
            Statement::SetLinkColor {
                article_id,
                tag_id,
                username,
                color,
            } => Self::set_link_color(conn, article_id, tag_id, username, *color),
            Statement::RemoveLinkColor {
                article_id,
                tag_id,
                username,
            } => Self::remove_link_color(conn, article_id, tag_id, username),
        }
    }

    // === Row conversion helpers ===

    fn article_record(identity: i64, id: &str, title: &str, text: &str, date: &str) -> NodeRecord {
        NodeRecord::new(identity, "Article")
            .with_property("id", id)
            .with_property("title", title)
            .with_property("text", text)
            .with_property("date", date)
    }

    fn tag_record(identity: i64, id: &str, name: &str) -> NodeRecord {
        NodeRecord::new(identity, "Tag")
            .with_property("id", id)
            .with_property("tag", name)
    }

    fn link_record(
        identity: i64,
        start: i64,
        end: i64,
        properties_json: &str,
    ) -> StoreResult<EdgeRecord> {
        let properties: Properties = serde_json::from_str(properties_json)?;
        Ok(EdgeRecord {
            identity,
            edge_type: "Tag".to_string(),
            start,
            end,
            properties,
        })
    }

    fn read_link_triple(row: &rusqlite::Row<'_>) -> rusqlite::Result<LinkTriple> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ))
    }

    fn count_row(name: &str, value: usize) -> Vec<Row> {
        vec![Row::new().with_field(name, Field::Scalar(Value::Int(value as i64)))]
    }

    // === Reads ===

    fn tags_by_pattern(conn: &Connection, pattern: Option<&str>) -> StoreResult<Vec<Row>> {
        let (sql, filter) = match pattern {
            Some(p) => (
                "SELECT identity, id, tag FROM tags WHERE tag REGEXP ?1 ORDER BY tag",
                Some(p),
            ),
            None => ("SELECT identity, id, tag FROM tags ORDER BY tag", None),
        };

        let mut stmt = conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String, String)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        };
        let raw: Vec<(i64, String, String)> = match filter {
            Some(p) => stmt.query_map(params![p], map)?.collect::<Result<_, _>>()?,
            None => stmt.query_map([], map)?.collect::<Result<_, _>>()?,
        };

        Ok(raw
            .into_iter()
            .map(|(identity, id, name)| {
                Row::new().with_field("tag", Field::Node(Self::tag_record(identity, &id, &name)))
            })
            .collect())
    }

    fn articles_by_tag_pattern(conn: &Connection, pattern: &str) -> StoreResult<Vec<Row>> {
        let mut stmt = conn.prepare(
            "SELECT a.identity, a.id, a.title, a.text, a.date,
                    t.identity, t.id, t.tag,
                    l.identity, l.article_identity, l.tag_identity, l.properties_json
             FROM article_tags l
             JOIN articles a ON a.identity = l.article_identity
             JOIN tags t ON t.identity = l.tag_identity
             WHERE t.tag REGEXP ?1
             ORDER BY l.identity",
        )?;
        let raw: Vec<LinkTriple> = stmt
            .query_map(params![pattern], Self::read_link_triple)?
            .collect::<Result<_, _>>()?;

        raw.into_iter()
            .map(|(ai, aid, title, text, date, ti, tid, tag, li, ls, le, props)| {
                Ok(Row::new()
                    .with_field(
                        "article",
                        Field::Node(Self::article_record(ai, &aid, &title, &text, &date)),
                    )
                    .with_field("tag", Field::Node(Self::tag_record(ti, &tid, &tag)))
                    .with_field("link", Field::Edge(Self::link_record(li, ls, le, &props)?)))
            })
            .collect()
    }

    fn articles_by_text(conn: &Connection, pattern: &str) -> StoreResult<Vec<Row>> {
        let mut stmt = conn.prepare(
            "SELECT identity, id, title, text, date FROM articles
             WHERE title REGEXP ?1 OR text REGEXP ?1
             ORDER BY identity",
        )?;
        let raw: Vec<(i64, String, String, String, String)> = stmt
            .query_map(params![pattern], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        Ok(raw
            .into_iter()
            .map(|(identity, id, title, text, date)| {
                Row::new().with_field(
                    "article",
                    Field::Node(Self::article_record(identity, &id, &title, &text, &date)),
                )
            })
            .collect())
    }

    fn articles_for_tag(conn: &Connection, tag_id: &TagId) -> StoreResult<Vec<Row>> {
        let mut stmt = conn.prepare(
            "SELECT t.identity, t.id, t.tag,
                    a.identity, a.id, a.title, a.text, a.date
             FROM article_tags l
             JOIN tags t ON t.identity = l.tag_identity
             JOIN articles a ON a.identity = l.article_identity
             WHERE t.id = ?1
             ORDER BY l.identity",
        )?;
        let raw: Vec<(i64, String, String, i64, String, String, String, String)> = stmt
            .query_map(params![tag_id.as_str()], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        Ok(raw
            .into_iter()
            .map(|(ti, tid, tag, ai, aid, title, text, date)| {
                Row::new()
                    .with_field("tag", Field::Node(Self::tag_record(ti, &tid, &tag)))
                    .with_field(
                        "article",
                        Field::Node(Self::article_record(ai, &aid, &title, &text, &date)),
                    )
            })
            .collect())
    }

    fn tags_for_article(
        conn: &Connection,
        article_id: &ArticleId,
        include: &[ArticleId],
    ) -> StoreResult<Vec<Row>> {
        // Tags on the target article, then every link from the target
        // or an included article to one of those tags.
        let include_clause = if include.is_empty() {
            String::new()
        } else {
            let placeholders: Vec<&str> = include.iter().map(|_| "?").collect();
            format!(" OR a.id IN ({})", placeholders.join(","))
        };

        let sql = format!(
            "SELECT t.identity, t.id, t.tag,
                    a.identity, a.id, a.title, a.text, a.date,
                    l.identity, l.article_identity, l.tag_identity, l.properties_json
             FROM article_tags l
             JOIN tags t ON t.identity = l.tag_identity
             JOIN articles a ON a.identity = l.article_identity
             WHERE l.tag_identity IN (
                     SELECT l2.tag_identity FROM article_tags l2
                     JOIN articles a2 ON a2.identity = l2.article_identity
                     WHERE a2.id = ?1
                 )
               AND (a.id = ?1{})
             ORDER BY l.identity",
            include_clause
        );

        let mut params_vec: Vec<String> = vec![article_id.as_str().to_string()];
        params_vec.extend(include.iter().map(|id| id.as_str().to_string()));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let raw: Vec<(
            i64,
            String,
            String,
            i64,
            String,
            String,
            String,
            String,
            i64,
            i64,
            i64,
            String,
        )> = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        raw.into_iter()
            .map(|(ti, tid, tag, ai, aid, title, text, date, li, ls, le, props)| {
                Ok(Row::new()
                    .with_field("tag", Field::Node(Self::tag_record(ti, &tid, &tag)))
                    .with_field(
                        "article",
                        Field::Node(Self::article_record(ai, &aid, &title, &text, &date)),
                    )
                    .with_field("link", Field::Edge(Self::link_record(li, ls, le, &props)?)))
            })
            .collect()
    }

    fn count_tag_links(conn: &Connection, tag_id: &TagId) -> StoreResult<Vec<Row>> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM article_tags l
             JOIN tags t ON t.identity = l.tag_identity
             WHERE t.id = ?1",
            params![tag_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(vec![
            Row::new().with_field("count", Field::Scalar(Value::Int(count)))
        ])
    }

    // === Mutations ===

    fn upsert_tag(conn: &Connection, id: &TagId, name: &str) -> StoreResult<Vec<Row>> {
        conn.execute(
            "INSERT INTO tags (id, tag) VALUES (?1, ?2)
             ON CONFLICT(tag) DO NOTHING",
            params![id.as_str(), name],
        )?;

        // Merge semantics: an existing tag keeps its original id.
        let (identity, id, name): (i64, String, String) = conn.query_row(
            "SELECT identity, id, tag FROM tags WHERE tag = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(vec![Row::new().with_field(
            "tag",
            Field::Node(Self::tag_record(identity, &id, &name)),
        )])
    }

    fn upsert_article(conn: &Connection, article: &Article) -> StoreResult<Vec<Row>> {
        let date = article.date.to_string();
        conn.execute(
            "INSERT INTO articles (id, title, text, date) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(title, date) DO NOTHING",
            params![article.id.as_str(), article.title, article.text, date],
        )?;

        // Merge semantics: an existing article keeps its id and text.
        let raw: (i64, String, String, String, String) = conn.query_row(
            "SELECT identity, id, title, text, date FROM articles
             WHERE title = ?1 AND date = ?2",
            params![article.title, date],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

        let (identity, id, title, text, date) = raw;
        Ok(vec![Row::new().with_field(
            "article",
            Field::Node(Self::article_record(identity, &id, &title, &text, &date)),
        )])
    }

    fn link_article_tag(
        conn: &Connection,
        article_id: &ArticleId,
        tag_id: &TagId,
    ) -> StoreResult<Vec<Row>> {
        let created = conn.execute(
            "INSERT INTO article_tags (article_identity, tag_identity)
             SELECT a.identity, t.identity FROM articles a, tags t
             WHERE a.id = ?1 AND t.id = ?2
             ON CONFLICT(article_identity, tag_identity) DO NOTHING",
            params![article_id.as_str(), tag_id.as_str()],
        )?;
        Ok(Self::count_row("created", created))
    }

    fn link_matching_articles(
        conn: &Connection,
        tag_id: &TagId,
        pattern: &str,
    ) -> StoreResult<Vec<Row>> {
        let linked = conn.execute(
            "INSERT INTO article_tags (article_identity, tag_identity)
             SELECT a.identity, t.identity FROM articles a, tags t
             WHERE t.id = ?1 AND a.text REGEXP ?2
             ON CONFLICT(article_identity, tag_identity) DO NOTHING",
            params![tag_id.as_str(), pattern],
        )?;
        Ok(Self::count_row("linked", linked))
    }

    fn link_subtag(
        conn: &Connection,
        parent_id: &TagId,
        child_id: &TagId,
    ) -> StoreResult<Vec<Row>> {
        let created = conn.execute(
            "INSERT INTO tag_tags (parent_identity, child_identity)
             SELECT p.identity, c.identity FROM tags p, tags c
             WHERE p.id = ?1 AND c.id = ?2
             ON CONFLICT(parent_identity, child_identity) DO NOTHING",
            params![parent_id.as_str(), child_id.as_str()],
        )?;
        Ok(Self::count_row("created", created))
    }

    fn unlink_article_tag(
        conn: &Connection,
        article_id: &ArticleId,
        tag_id: &TagId,
    ) -> StoreResult<Vec<Row>> {
        let removed = conn.execute(
            "DELETE FROM article_tags
             WHERE article_identity IN (SELECT identity FROM articles WHERE id = ?1)
               AND tag_identity IN (SELECT identity FROM tags WHERE id = ?2)",
            params![article_id.as_str(), tag_id.as_str()],
        )?;
        Ok(Self::count_row("removed", removed))
    }

    fn delete_tag(conn: &Connection, tag_id: &TagId) -> StoreResult<Vec<Row>> {
        // Delete links first, then the node itself.
        conn.execute(
            "DELETE FROM article_tags
             WHERE tag_identity IN (SELECT identity FROM tags WHERE id = ?1)",
            params![tag_id.as_str()],
        )?;
        conn.execute(
            "DELETE FROM tag_tags
             WHERE parent_identity IN (SELECT identity FROM tags WHERE id = ?1)
                OR child_identity IN (SELECT identity FROM tags WHERE id = ?1)",
            params![tag_id.as_str()],
        )?;
        let removed = conn.execute("DELETE FROM tags WHERE id = ?1", params![tag_id.as_str()])?;
        Ok(Self::count_row("removed", removed))
    }

    fn set_link_color(
        conn: &Connection,
        article_id: &ArticleId,
        tag_id: &TagId,
        username: &str,
        color: Color,
    ) -> StoreResult<Vec<Row>> {
        Self::update_link_properties(conn, article_id, tag_id, |props| {
            props.insert(color_property(username), Value::from(color));
        })
    }

    fn remove_link_color(
        conn: &Connection,
        article_id: &ArticleId,
        tag_id: &TagId,
        username: &str,
    ) -> StoreResult<Vec<Row>> {
        Self::update_link_properties(conn, article_id, tag_id, |props| {
            props.remove(&color_property(username));
        })
    }

    /// Read-modify-write of one link's attribute map, returning the
    /// updated (article, tag, link) row. No rows when the link does not
    /// exist.
    fn update_link_properties(
        conn: &Connection,
        article_id: &ArticleId,
        tag_id: &TagId,
        apply: impl FnOnce(&mut Properties),
    ) -> StoreResult<Vec<Row>> {
        let found: Option<(i64, String)> = conn
            .query_row(
                "SELECT l.identity, l.properties_json FROM article_tags l
                 JOIN articles a ON a.identity = l.article_identity
                 JOIN tags t ON t.identity = l.tag_identity
                 WHERE a.id = ?1 AND t.id = ?2",
                params![article_id.as_str(), tag_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((identity, properties_json)) = found else {
            return Ok(Vec::new());
        };

        let mut props: Properties = serde_json::from_str(&properties_json)?;
        apply(&mut props);
        conn.execute(
            "UPDATE article_tags SET properties_json = ?1 WHERE identity = ?2",
            params![serde_json::to_string(&props)?, identity],
        )?;

        let raw: LinkTriple = conn.query_row(
            "SELECT a.identity, a.id, a.title, a.text, a.date,
                    t.identity, t.id, t.tag,
                    l.identity, l.article_identity, l.tag_identity, l.properties_json
             FROM article_tags l
             JOIN articles a ON a.identity = l.article_identity
             JOIN tags t ON t.identity = l.tag_identity
             WHERE l.identity = ?1",
            params![identity],
            Self::read_link_triple,
        )?;

        let (ai, aid, title, text, date, ti, tid, tag, li, ls, le, props) = raw;
        Ok(vec![Row::new()
            .with_field(
                "article",
                Field::Node(Self::article_record(ai, &aid, &title, &text, &date)),
            )
            .with_field("tag", Field::Node(Self::tag_record(ti, &tid, &tag)))
            .with_field("link", Field::Edge(Self::link_record(li, ls, le, &props)?))])
    }
}

impl OpenGraph for SqliteGraph {
    fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, DEFAULT_POOL_SIZE)
    }

    fn open_in_memory() -> StoreResult<Self> {
        // In-memory databases are private to their connection, so the
        // pool holds exactly one session.
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::configure(&conn).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init_schema(&conn).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            pool: SessionPool::new(vec![conn]),
        })
    }
}

#[async_trait]
impl GraphEngine for SqliteGraph {
    async fn execute(&self, statement: Statement) -> StoreResult<Vec<Row>> {
        let session = self.pool.acquire().await?;
        let (result, _session) = tokio::task::spawn_blocking(move || {
            let result = Self::run_statement(session.connection(), &statement);
            if let Err(ref e) = result {
                tracing::error!(statement = ?statement, error = %e, "statement failed");
            }
            (result, session)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        result
    }
}

/// Register the `regexp` scalar function, backed by the regex crate.
///
/// SQLite rewrites `x REGEXP y` as `regexp(y, x)`, so argument 0 is the
/// pattern. Patterns compile with full-string semantics: a literal
/// token matches only a value it covers entirely, wildcarded tokens
/// reach anywhere through their `.*` bounds. Compiled patterns are
/// cached per prepared statement via the auxiliary-data mechanism.
fn register_regexp(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let pattern: std::sync::Arc<Regex> =
                ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                    Ok(crate::query::compile_full_match(vr.as_str()?)?)
                })?;
            let matched = match ctx.get_raw(1) {
                ValueRef::Null => false,
                text => pattern.is_match(
                    text.as_str()
                        .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?,
                ),
            };
            Ok(matched)
        },
    )
}
