//! SQLite persistence for dashboard app records
//!
//! Owns the single `apps` table. Schema changes are an ordered list of
//! additive migrations applied idempotently at startup; column additions are
//! double-checked against the introspected schema so a database created by an
//! older build upgrades in place.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Current schema version for migrations
const SCHEMA_VERSION: i32 = 4;

/// One dashboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub favorite: bool,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

/// Fields accepted by create/update. `image_url = None` on update means
/// "keep the existing image" (COALESCE), not "clear it".
#[derive(Debug, Clone, Default)]
pub struct AppFields {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Database connection wrapper with thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;
        Ok(db)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        if current_version < SCHEMA_VERSION {
            info!(
                "Running migrations from v{} to v{}",
                current_version, SCHEMA_VERSION
            );

            if current_version < 1 {
                Self::migrate_v1(&conn)?;
            }

            if current_version < 2 {
                Self::migrate_v2(&conn)?;
            }

            if current_version < 3 {
                Self::migrate_v3(&conn)?;
            }

            if current_version < 4 {
                Self::migrate_v4(&conn)?;
            }
        }

        Ok(())
    }

    /// Migration v1: Initial schema
    fn migrate_v1(conn: &Connection) -> Result<()> {
        debug!("Applying migration v1: initial schema");

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS apps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_migrations (version) VALUES (1);
        "#,
        )?;

        Ok(())
    }

    /// Migration v2: Thumbnail images
    fn migrate_v2(conn: &Connection) -> Result<()> {
        debug!("Applying migration v2: image_url column");

        Self::add_column_if_missing(conn, "image_url", "TEXT")?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;

        Ok(())
    }

    /// Migration v3: Favorites
    fn migrate_v3(conn: &Connection) -> Result<()> {
        debug!("Applying migration v3: favorite column");

        Self::add_column_if_missing(conn, "favorite", "INTEGER NOT NULL DEFAULT 0")?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (3)", [])?;

        Ok(())
    }

    /// Migration v4: Categories and descriptions
    fn migrate_v4(conn: &Connection) -> Result<()> {
        debug!("Applying migration v4: category and description columns");

        Self::add_column_if_missing(conn, "category", "TEXT")?;
        Self::add_column_if_missing(conn, "description", "TEXT")?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (4)", [])?;

        Ok(())
    }

    /// Databases created before the migrations table existed may already have
    /// a column, so every addition is checked against PRAGMA table_info first.
    fn add_column_if_missing(conn: &Connection, column: &str, definition: &str) -> Result<()> {
        let mut stmt = conn.prepare("PRAGMA table_info(apps)")?;
        let exists = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|name| name.ok())
            .any(|name| name == column);

        if !exists {
            conn.execute(
                &format!("ALTER TABLE apps ADD COLUMN {} {}", column, definition),
                [],
            )?;
        }

        Ok(())
    }

    // ==================== App Operations ====================

    /// Create a new app, returning the assigned id
    pub fn create_app(&self, fields: &AppFields) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO apps (name, url, image_url, favorite, category, description)
             VALUES (?1, ?2, ?3, 0, ?4, ?5)",
            params![
                fields.name,
                fields.url,
                fields.image_url,
                fields.category,
                fields.description
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Get an app by id
    pub fn get_app(&self, id: i64) -> Result<Option<AppRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, url, image_url, favorite, category, description, created_at
             FROM apps WHERE id = ?1",
            params![id],
            row_to_record,
        )
        .optional()
        .context("Failed to get app")
    }

    /// List all apps, favorites first, then by name case-insensitively
    pub fn list_apps(&self) -> Result<Vec<AppRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, url, image_url, favorite, category, description, created_at
             FROM apps ORDER BY favorite DESC, name COLLATE NOCASE ASC",
        )?;

        let apps = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(apps)
    }

    /// Update an app. Returns the number of rows changed (0 means not found).
    /// A `None` image_url keeps the image already on the record.
    pub fn update_app(&self, id: i64, fields: &AppFields) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE apps SET name = ?1, url = ?2, image_url = COALESCE(?3, image_url),
                    category = ?4, description = ?5
             WHERE id = ?6",
            params![
                fields.name,
                fields.url,
                fields.image_url,
                fields.category,
                fields.description,
                id
            ],
        )?;
        Ok(rows)
    }

    /// Flip the favorite flag. Returns the number of rows changed.
    pub fn toggle_favorite(&self, id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE apps SET favorite = NOT favorite WHERE id = ?1",
            params![id],
        )?;
        Ok(rows)
    }

    /// Delete an app. Returns the number of rows changed.
    pub fn delete_app(&self, id: i64) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute("DELETE FROM apps WHERE id = ?1", params![id])?;
        Ok(rows)
    }

    /// Distinct categories in use, deduplicated case-insensitively (the first
    /// spelling encountered in sort order wins)
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM apps
             WHERE category IS NOT NULL AND category != ''
             ORDER BY category COLLATE NOCASE ASC",
        )?;

        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = std::collections::HashSet::new();
        let categories = raw
            .into_iter()
            .filter(|c| seen.insert(c.to_lowercase()))
            .collect();

        Ok(categories)
    }

    /// Cheap round-trip used by the health endpoint
    pub fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Flush the WAL before shutdown. The connection itself closes on drop.
    pub fn close(&self) {
        if let Ok(conn) = self.conn.lock() {
            let _ = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
        }
        info!("Database closed");
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppRecord> {
    Ok(AppRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        image_url: row.get(3)?,
        favorite: row.get(4)?,
        category: row.get(5)?,
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, url: &str) -> AppFields {
        AppFields {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_app(&fields("Jellyfin", "http://media.local")).unwrap();

        let app = db.get_app(id).unwrap().unwrap();
        assert_eq!(app.id, id);
        assert_eq!(app.name, "Jellyfin");
        assert_eq!(app.url, "http://media.local");
        assert!(app.image_url.is_none());
        assert!(!app.favorite);
        assert!(!app.created_at.is_empty());
    }

    #[test]
    fn test_get_missing_app() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_app(42).unwrap().is_none());
    }

    #[test]
    fn test_list_order_favorites_first_then_name() {
        let db = Database::open_in_memory().unwrap();
        db.create_app(&fields("zebra", "http://z")).unwrap();
        let fav = db.create_app(&fields("Router", "http://r")).unwrap();
        db.create_app(&fields("apple", "http://a")).unwrap();
        db.toggle_favorite(fav).unwrap();

        let apps = db.list_apps().unwrap();
        let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Router", "apple", "zebra"]);
    }

    #[test]
    fn test_update_changes_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_app(&fields("old", "http://old")).unwrap();

        let changed = db
            .update_app(
                id,
                &AppFields {
                    name: "new".to_string(),
                    url: "http://new".to_string(),
                    category: Some("media".to_string()),
                    description: Some("a thing".to_string()),
                    image_url: None,
                },
            )
            .unwrap();
        assert_eq!(changed, 1);

        let app = db.get_app(id).unwrap().unwrap();
        assert_eq!(app.name, "new");
        assert_eq!(app.category.as_deref(), Some("media"));
    }

    #[test]
    fn test_update_missing_app_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.update_app(99, &fields("x", "http://x")).unwrap(), 0);
    }

    #[test]
    fn test_update_without_image_keeps_existing() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_app(&AppFields {
                image_url: Some("/uploads/pic.png".to_string()),
                ..fields("app", "http://app")
            })
            .unwrap();

        db.update_app(id, &fields("app2", "http://app2")).unwrap();

        let app = db.get_app(id).unwrap().unwrap();
        assert_eq!(app.image_url.as_deref(), Some("/uploads/pic.png"));
    }

    #[test]
    fn test_update_with_image_replaces() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_app(&AppFields {
                image_url: Some("/uploads/old.png".to_string()),
                ..fields("app", "http://app")
            })
            .unwrap();

        db.update_app(
            id,
            &AppFields {
                image_url: Some("/uploads/new.png".to_string()),
                ..fields("app", "http://app")
            },
        )
        .unwrap();

        let app = db.get_app(id).unwrap().unwrap();
        assert_eq!(app.image_url.as_deref(), Some("/uploads/new.png"));
    }

    #[test]
    fn test_toggle_favorite_twice_restores() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_app(&fields("app", "http://app")).unwrap();

        assert_eq!(db.toggle_favorite(id).unwrap(), 1);
        assert!(db.get_app(id).unwrap().unwrap().favorite);

        assert_eq!(db.toggle_favorite(id).unwrap(), 1);
        assert!(!db.get_app(id).unwrap().unwrap().favorite);
    }

    #[test]
    fn test_toggle_favorite_missing_app() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.toggle_favorite(7).unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_app(&fields("app", "http://app")).unwrap();

        assert_eq!(db.delete_app(id).unwrap(), 1);
        assert!(db.get_app(id).unwrap().is_none());
        assert_eq!(db.delete_app(id).unwrap(), 0);
    }

    #[test]
    fn test_categories_deduped_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        for (name, category) in [
            ("a", Some("Media")),
            ("b", Some("media")),
            ("c", Some("Network")),
            ("d", None),
            ("e", Some("")),
        ] {
            db.create_app(&AppFields {
                category: category.map(String::from),
                ..fields(name, "http://x")
            })
            .unwrap();
        }

        let categories = db.list_categories().unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories[0].eq_ignore_ascii_case("media"));
        assert!(categories[1].eq_ignore_ascii_case("network"));
    }

    #[test]
    fn test_migrations_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_app(&fields("app", "http://app")).unwrap();
        }

        // Reopening must not re-run column additions
        let db = Database::open(&path).unwrap();
        assert_eq!(db.list_apps().unwrap().len(), 1);
    }

    #[test]
    fn test_ping() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.ping().is_ok());
    }
}
