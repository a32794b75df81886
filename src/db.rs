use std::fs;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};

use crate::config::StoreConfig;
use crate::models::MatchReport;

const SCHEMA_SQL: &str = include_str!("../schema.sql");

/// Append-only sink for match report documents.
pub trait DocumentStore {
    /// Inserts every document or none of them. Returns how many were written.
    fn insert_many(&mut self, documents: &[MatchReport]) -> Result<usize>;
}

/// A document collection kept in SQLite: `<uri>/<database>.sqlite3`, one table per collection.
pub struct Db {
    conn: Connection,
    collection: String,
}

fn valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Db {
    pub fn open(store: &StoreConfig) -> Result<Self> {
        if !valid_identifier(&store.collection) {
            bail!("Invalid collection name {:?}", store.collection);
        }

        fs::create_dir_all(&store.uri)
            .with_context(|| format!("Cannot create store directory {}", store.uri.display()))?;

        let path = store.database_path();
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open DB at {}", path.display()))?;
        conn.execute_batch(&SCHEMA_SQL.replace("{collection}", &store.collection))
            .context("Failed to initialize schema")?;

        Ok(Db {
            conn,
            collection: store.collection.clone(),
        })
    }

    #[cfg(test)]
    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.collection);
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    #[cfg(test)]
    pub fn load_documents(&self) -> Result<Vec<MatchReport>> {
        let sql = format!("SELECT document FROM \"{}\" ORDER BY id", self.collection);
        let mut stmt = self.conn.prepare(&sql)?;

        let iter = stmt.query_and_then([], |row| {
            let raw: String = row.get(0)?;
            let doc: MatchReport =
                serde_json::from_str(&raw).context("Corrupt document in store")?;
            Ok(doc)
        })?;

        iter.collect::<Result<Vec<_>>>()
    }
}

impl DocumentStore for Db {
    fn insert_many(&mut self, documents: &[MatchReport]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        {
            let sql = format!(
                "INSERT INTO \"{}\" (
                    match_id, match_string, home_team, away_team,
                    home_score, away_score, created_at, document
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                self.collection
            );
            let mut stmt = tx.prepare(&sql)?;

            for doc in documents {
                let json = serde_json::to_string(doc).context("Failed to serialize document")?;
                stmt.execute(params![
                    doc.match_id as i64,
                    &doc.match_string,
                    &doc.home_team,
                    &doc.away_team,
                    doc.home_score,
                    doc.away_score,
                    doc.created_at.to_rfc3339(),
                    json,
                ])?;
            }
        }

        tx.commit().context("Failed to commit documents")?;
        Ok(documents.len())
    }
}
