//! Reconciler — merges a decoded extraction into the store as one unit of work.
//!
//! Matching policy per entity kind:
//! - profile: always upserted on the configured singleton id.
//! - experience, projects, certifications: id present → update, else insert.
//!   There is no lookup by company/role, title or name, so a record the model
//!   returns without an id is inserted even if an equivalent row exists.
//! - skills: id present → update; else look up by category, update if found,
//!   insert otherwise.
//!
//! Any failure rolls back every write made in the run.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::portfolio::{Extraction, RecordError, RowId};
use crate::store::{PortfolioStore, PortfolioWriter, StoreError, Table};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Invalid extraction: {0}")]
    Invalid(#[from] RecordError),

    #[error("Could not open transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("{table}[{index}]: {source}")]
    Store {
        table: Table,
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("Commit failed: {0}")]
    Commit(#[source] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub inserted: usize,
    pub updated: usize,
    /// Updates whose id matched no row.
    pub unmatched: usize,
}

impl EntityCounts {
    fn record_update(&mut self, table: Table, id: RowId, rows_affected: u64) {
        if rows_affected == 0 {
            warn!("{table} id {id} matched no row; nothing updated");
            self.unmatched += 1;
        } else {
            self.updated += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub profile_upserted: bool,
    pub experience: EntityCounts,
    pub projects: EntityCounts,
    pub skills: EntityCounts,
    pub certifications: EntityCounts,
}

/// Decodes `extracted` and applies it inside a single transaction.
///
/// Nothing is written when decoding fails. A store failure part-way rolls
/// back everything already issued in this run.
pub async fn reconcile<S>(
    store: &mut S,
    extracted: &Value,
    profile_id: RowId,
) -> Result<ReconcileReport, ReconcileError>
where
    S: PortfolioStore + ?Sized,
{
    let extraction = Extraction::from_value(extracted)?;

    let mut uow = store.begin().await.map_err(ReconcileError::Begin)?;
    match apply(&mut *uow, &extraction, profile_id).await {
        Ok(report) => {
            uow.commit().await.map_err(ReconcileError::Commit)?;
            Ok(report)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!("Rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

pub async fn apply<W>(
    writer: &mut W,
    extraction: &Extraction,
    profile_id: RowId,
) -> Result<ReconcileReport, ReconcileError>
where
    W: PortfolioWriter + ?Sized,
{
    let mut report = ReconcileReport::default();

    if let Some(profile) = &extraction.profile {
        info!(
            "Updating Profile: {}",
            profile.name.as_deref().unwrap_or("<unnamed>")
        );
        if let Some(proposed) = profile.id.filter(|id| *id != profile_id) {
            warn!("Ignoring proposed profile id {proposed}; profile is always {profile_id}");
        }
        writer
            .upsert_profile(profile_id, profile)
            .await
            .map_err(|source| ReconcileError::Store {
                table: Table::Profile,
                index: 0,
                source,
            })?;
        report.profile_upserted = true;
    }

    for (index, exp) in extraction.experience.iter().enumerate() {
        info!("Processing Experience: {} ({})", exp.company, exp.role);
        let step = |source| ReconcileError::Store {
            table: Table::Experience,
            index,
            source,
        };
        match exp.id {
            Some(id) => {
                let rows = writer.update_experience(id, exp).await.map_err(step)?;
                report.experience.record_update(Table::Experience, id, rows);
            }
            None => {
                writer.insert_experience(exp).await.map_err(step)?;
                report.experience.inserted += 1;
            }
        }
    }

    for (index, project) in extraction.projects.iter().enumerate() {
        info!("Processing Project: {}", project.title);
        let step = |source| ReconcileError::Store {
            table: Table::Projects,
            index,
            source,
        };
        match project.id {
            Some(id) => {
                let rows = writer.update_project(id, project).await.map_err(step)?;
                report.projects.record_update(Table::Projects, id, rows);
            }
            None => {
                writer.insert_project(project).await.map_err(step)?;
                report.projects.inserted += 1;
            }
        }
    }

    for (index, skill) in extraction.skills.iter().enumerate() {
        info!("Processing Skill Category: {}", skill.category);
        let step = |source| ReconcileError::Store {
            table: Table::Skills,
            index,
            source,
        };
        let target = match skill.id {
            Some(id) => Some(id),
            None => writer
                .find_skill_by_category(&skill.category)
                .await
                .map_err(step)?,
        };
        match target {
            Some(id) => {
                let rows = writer
                    .update_skill_items(id, &skill.items)
                    .await
                    .map_err(step)?;
                report.skills.record_update(Table::Skills, id, rows);
            }
            None => {
                writer.insert_skill(skill).await.map_err(step)?;
                report.skills.inserted += 1;
            }
        }
    }

    for (index, cert) in extraction.certifications.iter().enumerate() {
        info!("Processing Cert: {}", cert.name);
        let step = |source| ReconcileError::Store {
            table: Table::Certifications,
            index,
            source,
        };
        match cert.id {
            Some(id) => {
                let rows = writer.update_certification(id, cert).await.map_err(step)?;
                report.certifications.record_update(Table::Certifications, id, rows);
            }
            None => {
                writer.insert_certification(cert).await.map_err(step)?;
                report.certifications.inserted += 1;
            }
        }
    }

    Ok(report)
}
