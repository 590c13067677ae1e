use crate::catalog::ItemCatalog;
use crate::error::{LootError, Result};
use crate::models::{LootEntry, LootRow, decode_always_drop, encode_always_drop};
use rusqlite::{Connection, OpenFlags, Row, params};
use std::path::{Path, PathBuf};

/// Conventional file name of the server table database.
pub const DEFAULT_DATABASE_FILE: &str = "compact.server.table.sqlite3";

const SELECT_LOOTS: &str = "SELECT id, loot_pack_id, item_id, drop_rate, min_amount, max_amount,
                                   grade_id, [group], always_drop
                            FROM loots
                            ORDER BY id";

/// Access to the `loots` table of one database file.
///
/// No connection is held between calls. Every operation opens its own and
/// releases it when it returns, including on error.
#[derive(Debug, Clone)]
pub struct LootStore {
    db_path: PathBuf,
    catalog_path: PathBuf,
}

impl LootStore {
    pub fn new(db_path: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            catalog_path: catalog_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Open a connection to an existing database file. Never creates one.
    pub fn connection(&self) -> Result<Connection> {
        if !self.db_path.is_file() {
            return Err(LootError::DatabaseNotFound(self.db_path.clone()));
        }
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }

    /// Create the database file with an empty `loots` table.
    pub fn create_schema(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS loots (
                id INTEGER PRIMARY KEY,
                loot_pack_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                drop_rate INTEGER NOT NULL,
                min_amount INTEGER NOT NULL,
                max_amount INTEGER NOT NULL,
                grade_id INTEGER NOT NULL,
                [group] INTEGER NOT NULL,
                always_drop TEXT NOT NULL DEFAULT 'f'
            );
            "#,
        )?;
        tracing::info!("Created loots table in {}", self.db_path.display());
        Ok(())
    }

    fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LootEntry> {
        // Older tables may hold NULL or non-text flags; both read as false.
        let always_drop: Option<String> = match row.get_ref(8)? {
            rusqlite::types::ValueRef::Text(bytes) => {
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => None,
        };

        Ok(LootEntry {
            id: row.get(0)?,
            loot_pack_id: row.get(1)?,
            item_id: row.get(2)?,
            drop_rate: row.get(3)?,
            min_amount: row.get(4)?,
            max_amount: row.get(5)?,
            grade_id: row.get(6)?,
            group: row.get(7)?,
            always_drop: decode_always_drop(always_drop.as_deref()),
        })
    }

    /// Read every loot entry joined with its item name from the catalog.
    pub fn read_all(&self) -> Result<Vec<LootRow>> {
        let catalog = ItemCatalog::load(&self.catalog_path);
        let conn = self.connection()?;

        let mut stmt = conn.prepare(SELECT_LOOTS)?;
        let rows = stmt
            .query_map([], Self::row_to_entry)?
            .map(|entry| {
                entry.map(|entry| LootRow {
                    display_name: catalog.name_of(entry.item_id).to_string(),
                    entry,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!("Read {} loot rows from {}", rows.len(), self.db_path.display());
        Ok(rows)
    }

    /// Highest id in the table, or 0 when it is empty. Does not reserve the id.
    pub fn get_max_id(&self) -> Result<i32> {
        let conn = self.connection()?;
        let max_id: Option<i32> = conn.query_row("SELECT MAX(id) FROM loots", [], |row| row.get(0))?;
        Ok(max_id.unwrap_or(0))
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM loots", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert a new entry. A duplicate id fails with [`LootError::Constraint`].
    pub fn insert(&self, entry: &LootEntry) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO loots (id, [group], item_id, drop_rate, min_amount, max_amount,
                                loot_pack_id, grade_id, always_drop)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.group,
                entry.item_id,
                entry.drop_rate,
                entry.min_amount,
                entry.max_amount,
                entry.loot_pack_id,
                entry.grade_id,
                encode_always_drop(entry.always_drop),
            ],
        )
        .map_err(LootError::from_sqlite)?;

        tracing::info!("Inserted loot {} (item {}, pack {})", entry.id, entry.item_id, entry.loot_pack_id);
        Ok(())
    }

    /// Overwrite every field except `id` of the matching row.
    /// Returns the number of rows affected, 0 when no row has that id.
    pub fn update(&self, entry: &LootEntry) -> Result<usize> {
        let conn = self.connection()?;
        let affected = conn
            .execute(
                "UPDATE loots
                 SET [group] = ?2, item_id = ?3, drop_rate = ?4, min_amount = ?5, max_amount = ?6,
                     loot_pack_id = ?7, grade_id = ?8, always_drop = ?9
                 WHERE id = ?1",
                params![
                    entry.id,
                    entry.group,
                    entry.item_id,
                    entry.drop_rate,
                    entry.min_amount,
                    entry.max_amount,
                    entry.loot_pack_id,
                    entry.grade_id,
                    encode_always_drop(entry.always_drop),
                ],
            )
            .map_err(LootError::from_sqlite)?;

        if affected == 0 {
            tracing::warn!("Update of loot {} matched no rows", entry.id);
        } else {
            tracing::info!("Updated loot {}", entry.id);
        }
        Ok(affected)
    }

    /// Delete the row with `id`. Returns the number of rows removed.
    pub fn delete(&self, id: i32) -> Result<usize> {
        let conn = self.connection()?;
        let affected = conn
            .execute("DELETE FROM loots WHERE id = ?1", params![id])
            .map_err(LootError::from_sqlite)?;

        if affected == 0 {
            tracing::warn!("Delete of loot {} matched no rows", id);
        } else {
            tracing::info!("Deleted loot {}", id);
        }
        Ok(affected)
    }
}
