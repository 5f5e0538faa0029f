//! In-memory portfolio store used by the sync tests.
//!
//! Writes go to a staged copy of the tables and only replace the committed
//! copy on commit, so rollback behaviour is observable. Tables can be marked
//! missing and a single write can be made to fail.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::models::portfolio::{
    CertificationRecord, ExperienceRecord, ProfileRecord, ProjectRecord, RowId, SkillRecord,
};
use crate::store::{PortfolioStore, PortfolioWriter, Row, StoreError, Table, UnitOfWork};

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub profile: BTreeMap<RowId, ProfileRecord>,
    pub experience: BTreeMap<RowId, ExperienceRecord>,
    pub projects: BTreeMap<RowId, ProjectRecord>,
    pub skills: BTreeMap<RowId, SkillRecord>,
    pub certifications: BTreeMap<RowId, CertificationRecord>,
    next_id: RowId,
}

impl Tables {
    fn allocate(&mut self) -> RowId {
        self.next_id += 1;
        self.next_id
    }

    pub fn count(&self, table: Table) -> usize {
        match table {
            Table::Profile => self.profile.len(),
            Table::Experience => self.experience.len(),
            Table::Projects => self.projects.len(),
            Table::Skills => self.skills.len(),
            Table::Certifications => self.certifications.len(),
        }
    }

    pub fn total(&self) -> usize {
        Table::ALL.iter().map(|t| self.count(*t)).sum()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub committed: Tables,
    missing: HashSet<Table>,
    /// 1-based index of the write that should fail, counted per unit of work.
    fail_on_write: Option<usize>,
    pub commits: usize,
    pub rollbacks: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_table(mut self, table: Table) -> Self {
        self.missing.insert(table);
        self
    }

    pub fn failing_on_write(mut self, nth: usize) -> Self {
        self.fail_on_write = Some(nth);
        self
    }

    pub fn seed_profile(&mut self, id: RowId, profile: ProfileRecord) {
        self.committed.profile.insert(id, ProfileRecord { id: Some(id), ..profile });
    }

    pub fn seed_experience(&mut self, experience: ExperienceRecord) -> RowId {
        let id = self.committed.allocate();
        self.committed
            .experience
            .insert(id, ExperienceRecord { id: Some(id), ..experience });
        id
    }

    pub fn seed_project(&mut self, project: ProjectRecord) -> RowId {
        let id = self.committed.allocate();
        self.committed
            .projects
            .insert(id, ProjectRecord { id: Some(id), ..project });
        id
    }

    pub fn seed_skill(&mut self, skill: SkillRecord) -> RowId {
        let id = self.committed.allocate();
        self.committed
            .skills
            .insert(id, SkillRecord { id: Some(id), ..skill });
        id
    }

    pub fn seed_certification(&mut self, certification: CertificationRecord) -> RowId {
        let id = self.committed.allocate();
        self.committed
            .certifications
            .insert(id, CertificationRecord { id: Some(id), ..certification });
        id
    }
}

fn to_rows<T: Serialize>(records: &BTreeMap<RowId, T>) -> Result<Vec<Row>, StoreError> {
    records
        .iter()
        .map(|(id, record)| match serde_json::to_value(record) {
            Ok(Value::Object(mut row)) => {
                row.insert("id".to_string(), Value::from(*id));
                Ok(row)
            }
            Ok(_) => Err(StoreError::Rejected("record did not serialize to a row".into())),
            Err(e) => Err(StoreError::Rejected(e.to_string())),
        })
        .collect()
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn fetch_rows(&mut self, table: Table) -> Result<Vec<Row>, StoreError> {
        if self.missing.contains(&table) {
            return Err(StoreError::Rejected(format!(
                "relation \"{table}\" does not exist"
            )));
        }
        let tables = &self.committed;
        match table {
            Table::Profile => to_rows(&tables.profile),
            Table::Experience => to_rows(&tables.experience),
            Table::Projects => to_rows(&tables.projects),
            Table::Skills => to_rows(&tables.skills),
            Table::Certifications => to_rows(&tables.certifications),
        }
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError> {
        let staged = self.committed.clone();
        Ok(Box::new(MemoryUnitOfWork {
            store: self,
            staged,
            writes: 0,
        }))
    }
}

pub struct MemoryUnitOfWork<'a> {
    store: &'a mut MemoryStore,
    staged: Tables,
    writes: usize,
}

impl MemoryUnitOfWork<'_> {
    fn write(&mut self) -> Result<(), StoreError> {
        self.writes += 1;
        if self.store.fail_on_write == Some(self.writes) {
            return Err(StoreError::Rejected(format!(
                "injected failure on write {}",
                self.writes
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<'a> PortfolioWriter for MemoryUnitOfWork<'a> {
    async fn upsert_profile(
        &mut self,
        id: RowId,
        profile: &ProfileRecord,
    ) -> Result<(), StoreError> {
        self.write()?;
        self.staged.profile.insert(
            id,
            ProfileRecord {
                id: Some(id),
                resume_url: None,
                ..profile.clone()
            },
        );
        Ok(())
    }

    async fn update_experience(
        &mut self,
        id: RowId,
        experience: &ExperienceRecord,
    ) -> Result<u64, StoreError> {
        self.write()?;
        Ok(match self.staged.experience.get_mut(&id) {
            Some(row) => {
                *row = ExperienceRecord { id: Some(id), ..experience.clone() };
                1
            }
            None => 0,
        })
    }

    async fn insert_experience(
        &mut self,
        experience: &ExperienceRecord,
    ) -> Result<(), StoreError> {
        self.write()?;
        let id = self.staged.allocate();
        self.staged
            .experience
            .insert(id, ExperienceRecord { id: Some(id), ..experience.clone() });
        Ok(())
    }

    async fn update_project(
        &mut self,
        id: RowId,
        project: &ProjectRecord,
    ) -> Result<u64, StoreError> {
        self.write()?;
        Ok(match self.staged.projects.get_mut(&id) {
            Some(row) => {
                let featured = project.featured.or(row.featured);
                *row = ProjectRecord {
                    id: Some(id),
                    featured,
                    ..project.clone()
                };
                1
            }
            None => 0,
        })
    }

    async fn insert_project(&mut self, project: &ProjectRecord) -> Result<(), StoreError> {
        self.write()?;
        let id = self.staged.allocate();
        self.staged.projects.insert(
            id,
            ProjectRecord {
                id: Some(id),
                featured: Some(project.featured.unwrap_or(false)),
                ..project.clone()
            },
        );
        Ok(())
    }

    async fn find_skill_by_category(
        &mut self,
        category: &str,
    ) -> Result<Option<RowId>, StoreError> {
        Ok(self
            .staged
            .skills
            .iter()
            .find(|(_, s)| s.category == category)
            .map(|(id, _)| *id))
    }

    async fn update_skill_items(
        &mut self,
        id: RowId,
        items: &[String],
    ) -> Result<u64, StoreError> {
        self.write()?;
        Ok(match self.staged.skills.get_mut(&id) {
            Some(row) => {
                row.items = items.to_vec();
                1
            }
            None => 0,
        })
    }

    async fn insert_skill(&mut self, skill: &SkillRecord) -> Result<(), StoreError> {
        self.write()?;
        let id = self.staged.allocate();
        self.staged
            .skills
            .insert(id, SkillRecord { id: Some(id), ..skill.clone() });
        Ok(())
    }

    async fn update_certification(
        &mut self,
        id: RowId,
        certification: &CertificationRecord,
    ) -> Result<u64, StoreError> {
        self.write()?;
        Ok(match self.staged.certifications.get_mut(&id) {
            Some(row) => {
                *row = CertificationRecord { id: Some(id), ..certification.clone() };
                1
            }
            None => 0,
        })
    }

    async fn insert_certification(
        &mut self,
        certification: &CertificationRecord,
    ) -> Result<(), StoreError> {
        self.write()?;
        let id = self.staged.allocate();
        self.staged
            .certifications
            .insert(id, CertificationRecord { id: Some(id), ..certification.clone() });
        Ok(())
    }
}

#[async_trait]
impl<'a> UnitOfWork for MemoryUnitOfWork<'a> {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.store.committed = this.staged;
        this.store.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        this.store.rollbacks += 1;
        Ok(())
    }
}
