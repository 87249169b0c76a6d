use super::GroundTruth;
use crate::{error::Result, types::VId};
use rusqlite::{params, Connection, OptionalExtension};
use std::{collections::BTreeSet, path::Path};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS queries (query INTEGER PRIMARY KEY);
CREATE TABLE IF NOT EXISTS matches (
    query INTEGER NOT NULL,
    rank INTEGER NOT NULL,
    node INTEGER NOT NULL,
    PRIMARY KEY (query, rank)
);
CREATE TABLE IF NOT EXISTS shards (shard INTEGER PRIMARY KEY);
CREATE TABLE IF NOT EXISTS layout (position INTEGER PRIMARY KEY, query INTEGER NOT NULL);
CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value INTEGER NOT NULL);
";

const CLEAR: &str =
    "DELETE FROM matches; DELETE FROM queries; DELETE FROM shards; DELETE FROM layout; DELETE FROM meta;";

/// Durable ground truth in a SQLite3 file.
///
/// The file has the following schema:
///
/// ```sql
/// CREATE TABLE queries (query INTEGER PRIMARY KEY);
/// CREATE TABLE matches (query INTEGER, rank INTEGER, node INTEGER);
/// CREATE TABLE shards (shard INTEGER PRIMARY KEY);
/// CREATE TABLE layout (position INTEGER PRIMARY KEY, query INTEGER);
/// CREATE TABLE meta (key TEXT PRIMARY KEY, value INTEGER);
/// ```
///
/// `queries` holds every key, so queries without matches survive; `rank` keeps
/// the order of each match list. `shards`, `layout` and `meta` track
/// checkpointed runs: the committed shards, the query list they were cut from
/// and the shard count.
pub struct GroundTruthStore {
    conn: Connection,
}

impl GroundTruthStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Replaces the stored ground truth with `ground_truth`.
    pub fn save(&mut self, ground_truth: &GroundTruth) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM matches; DELETE FROM queries;")?;
        insert(&tx, ground_truth)?;
        tx.commit()?;
        Ok(())
    }

    pub fn load(&self) -> Result<GroundTruth> {
        let mut ground_truth = GroundTruth::new();
        let mut stmt = self.conn.prepare("SELECT query FROM queries")?;
        for query in stmt.query_map([], |row| row.get::<_, i64>(0))? {
            ground_truth.insert(query? as VId, vec![]);
        }
        let mut stmt = self
            .conn
            .prepare("SELECT query, node FROM matches ORDER BY query, rank")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (query, node) = row?;
            ground_truth
                .entry(query as VId)
                .or_default()
                .push(node as VId);
        }
        Ok(ground_truth)
    }

    /// Starts or resumes a run over `queries` cut into `num_shards` shards,
    /// returning the shards already committed.
    ///
    /// A store left by a run over another query list or shard count is cleared
    /// first.
    pub fn resume(&mut self, queries: &[VId], num_shards: usize) -> Result<BTreeSet<usize>> {
        if self.meta("num_shards")? == Some(num_shards as i64) && self.layout()? == queries {
            let mut stmt = self.conn.prepare("SELECT shard FROM shards")?;
            let shards = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .map(|shard| shard.map(|shard| shard as usize))
                .collect::<rusqlite::Result<_>>()?;
            return Ok(shards);
        }
        let tx = self.conn.transaction()?;
        tx.execute_batch(CLEAR)?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('num_shards', ?1)",
            params![num_shards as i64],
        )?;
        {
            let mut stmt = tx.prepare("INSERT INTO layout (position, query) VALUES (?1, ?2)")?;
            for (position, &query) in queries.iter().enumerate() {
                stmt.execute(params![position as i64, query as i64])?;
            }
        }
        tx.commit()?;
        Ok(BTreeSet::new())
    }

    /// Commits the result of one shard atomically.
    pub fn checkpoint(&mut self, shard: usize, partial: &GroundTruth) -> Result<()> {
        let tx = self.conn.transaction()?;
        insert(&tx, partial)?;
        tx.execute(
            "INSERT OR REPLACE INTO shards (shard) VALUES (?1)",
            params![shard as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Drops everything, including checkpoints.
    pub fn clear(&mut self) -> Result<()> {
        self.conn.execute_batch(CLEAR)?;
        Ok(())
    }

    fn layout(&self) -> Result<Vec<VId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT query FROM layout ORDER BY position")?;
        let queries = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .map(|query| query.map(|query| query as VId))
            .collect::<rusqlite::Result<_>>()?;
        Ok(queries)
    }

    fn meta(&self, key: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }
}

fn insert(conn: &Connection, ground_truth: &GroundTruth) -> Result<()> {
    let mut query_stmt = conn.prepare("INSERT OR REPLACE INTO queries (query) VALUES (?1)")?;
    let mut delete_stmt = conn.prepare("DELETE FROM matches WHERE query = ?1")?;
    let mut match_stmt =
        conn.prepare("INSERT INTO matches (query, rank, node) VALUES (?1, ?2, ?3)")?;
    for (&query, nodes) in ground_truth {
        query_stmt.execute(params![query as i64])?;
        delete_stmt.execute(params![query as i64])?;
        for (rank, &node) in nodes.iter().enumerate() {
            match_stmt.execute(params![query as i64, rank as i64, node as i64])?;
        }
    }
    Ok(())
}
