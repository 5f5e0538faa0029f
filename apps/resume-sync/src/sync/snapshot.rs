//! State Reader — best-effort snapshot of the portfolio tables.
//!
//! The snapshot is only context for the model, never a basis for writes, so a
//! table that cannot be read degrades to an empty list instead of failing the
//! run.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::store::{PortfolioStore, Row, Table};

/// Outcome of reading one table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRead {
    Loaded(Vec<Row>),
    Failed(String),
}

impl TableRead {
    pub fn rows(&self) -> &[Row] {
        match self {
            TableRead::Loaded(rows) => rows,
            TableRead::Failed(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    tables: BTreeMap<Table, TableRead>,
}

impl Snapshot {
    #[cfg(test)]
    pub fn get(&self, table: Table) -> Option<&TableRead> {
        self.tables.get(&table)
    }

    /// Tables whose read failed and were replaced by an empty list.
    pub fn degraded(&self) -> Vec<Table> {
        self.tables
            .iter()
            .filter(|(_, read)| matches!(read, TableRead::Failed(_)))
            .map(|(table, _)| *table)
            .collect()
    }

    /// Serializes the snapshot as the "current state" context payload.
    pub fn to_context_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Serializes as `{ "<table>": [rows...] }`; failed tables appear as `[]`.
impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.tables
                .iter()
                .map(|(table, read)| (table.as_str(), read.rows())),
        )
    }
}

/// Reads every table in `tables`. A failure on one table is logged and
/// recorded; the remaining tables are still read.
pub async fn read_snapshot<S>(store: &mut S, tables: &[Table]) -> Snapshot
where
    S: PortfolioStore + ?Sized,
{
    let mut snapshot = Snapshot::default();
    for &table in tables {
        let read = match store.fetch_rows(table).await {
            Ok(rows) => {
                info!("Read {} rows from {table}", rows.len());
                TableRead::Loaded(rows)
            }
            Err(e) => {
                warn!("Could not fetch table {table}: {e}");
                TableRead::Failed(e.to_string())
            }
        };
        snapshot.tables.insert(table, read);
    }
    snapshot
}
