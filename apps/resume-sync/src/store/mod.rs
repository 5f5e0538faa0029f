//! Storage seam for the portfolio tables.
//!
//! The sync job talks to the backing store only through these traits, so the
//! Postgres implementation can be swapped for [`memory::MemoryStore`] in tests.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::portfolio::{
    CertificationRecord, ExperienceRecord, ProfileRecord, ProjectRecord, RowId, SkillRecord,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// One row of a snapshot: column name → JSON value.
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(test)]
    #[error("Statement rejected: {0}")]
    Rejected(String),
}

/// The five entity tables this job reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Profile,
    Experience,
    Projects,
    Skills,
    Certifications,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Profile,
        Table::Experience,
        Table::Projects,
        Table::Skills,
        Table::Certifications,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Profile => "profile",
            Table::Experience => "experience",
            Table::Projects => "projects",
            Table::Skills => "skills",
            Table::Certifications => "certifications",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write operations issued by the reconciler inside a unit of work.
///
/// `update_*` methods return the number of rows affected; zero means the id
/// matched nothing.
#[async_trait]
pub trait PortfolioWriter: Send {
    /// Insert-or-update the singleton profile row keyed on `id`.
    async fn upsert_profile(&mut self, id: RowId, profile: &ProfileRecord)
        -> Result<(), StoreError>;

    async fn update_experience(
        &mut self,
        id: RowId,
        experience: &ExperienceRecord,
    ) -> Result<u64, StoreError>;
    async fn insert_experience(&mut self, experience: &ExperienceRecord)
        -> Result<(), StoreError>;

    async fn update_project(&mut self, id: RowId, project: &ProjectRecord)
        -> Result<u64, StoreError>;
    async fn insert_project(&mut self, project: &ProjectRecord) -> Result<(), StoreError>;

    async fn find_skill_by_category(&mut self, category: &str)
        -> Result<Option<RowId>, StoreError>;
    /// Rewrites the item list only; the category label is left untouched.
    async fn update_skill_items(&mut self, id: RowId, items: &[String])
        -> Result<u64, StoreError>;
    async fn insert_skill(&mut self, skill: &SkillRecord) -> Result<(), StoreError>;

    async fn update_certification(
        &mut self,
        id: RowId,
        certification: &CertificationRecord,
    ) -> Result<u64, StoreError>;
    async fn insert_certification(
        &mut self,
        certification: &CertificationRecord,
    ) -> Result<(), StoreError>;
}

/// A transaction over the portfolio tables. Dropping it without calling
/// [`UnitOfWork::commit`] discards every write.
#[async_trait]
pub trait UnitOfWork: PortfolioWriter {
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// The backing store, held exclusively for the duration of a run.
#[async_trait]
pub trait PortfolioStore: Send {
    /// Returns every row of `table`. Date and time columns come back as strings.
    async fn fetch_rows(&mut self, table: Table) -> Result<Vec<Row>, StoreError>;

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError>;
}
