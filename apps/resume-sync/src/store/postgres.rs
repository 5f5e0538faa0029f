use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Column, Connection, PgConnection, Postgres, Row as _, Transaction, TypeInfo};
use tracing::debug;

use crate::models::portfolio::{
    CertificationRecord, ExperienceRecord, ProfileRecord, ProjectRecord, RowId, SkillRecord,
};
use crate::store::{PortfolioStore, PortfolioWriter, Row, StoreError, Table, UnitOfWork};

/// Portfolio store backed by a single exclusive PostgreSQL connection.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<(), StoreError> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait]
impl PortfolioStore for PgStore {
    async fn fetch_rows(&mut self, table: Table) -> Result<Vec<Row>, StoreError> {
        // Table names come from the closed `Table` enum, never from input.
        let sql = format!("SELECT * FROM {}", table.as_str());
        let rows = sqlx::query(&sql).fetch_all(&mut self.conn).await?;
        rows.iter().map(row_to_json).collect()
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn UnitOfWork + 'a>, StoreError> {
        let tx = self.conn.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Converts a row of any of the portfolio tables into a JSON object.
fn row_to_json(row: &PgRow) -> Result<Row, StoreError> {
    let mut out = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let type_name = column.type_info().name();
        let value = match type_name {
            "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::from),
            "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(Value::from),
            "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(Value::from),
            "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::from),
            "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(Value::from),
            "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::from),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(idx)?.map(Value::from)
            }
            "TEXT[]" | "VARCHAR[]" => row.try_get::<Option<Vec<String>>, _>(idx)?.map(Value::from),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(idx)?,
            _ => match Temporal::decode(row, idx, type_name)? {
                Some(decoded) => decoded.map(Temporal::into_json),
                None => {
                    debug!("Column '{}' has unsupported type {type_name}; omitting value", column.name());
                    None
                }
            },
        };
        out.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    Ok(out)
}

/// A date or time column value. Rendered as a string in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Temporal {
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Time(NaiveTime),
}

impl Temporal {
    /// `Ok(None)` when `type_name` is not a date/time type.
    fn decode(
        row: &PgRow,
        idx: usize,
        type_name: &str,
    ) -> Result<Option<Option<Self>>, sqlx::Error> {
        let decoded = match type_name {
            "DATE" => row.try_get::<Option<NaiveDate>, _>(idx)?.map(Temporal::Date),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(idx)?
                .map(Temporal::Timestamp),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(idx)?
                .map(Temporal::TimestampTz),
            "TIME" => row.try_get::<Option<NaiveTime>, _>(idx)?.map(Temporal::Time),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    fn into_json(self) -> Value {
        let text = match self {
            Temporal::Date(d) => d.format("%Y-%m-%d").to_string(),
            Temporal::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Temporal::TimestampTz(ts) => ts.to_rfc3339(),
            Temporal::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        };
        Value::String(text)
    }
}

pub struct PgUnitOfWork<'c> {
    tx: Transaction<'c, Postgres>,
}

#[async_trait]
impl<'c> PortfolioWriter for PgUnitOfWork<'c> {
    async fn upsert_profile(
        &mut self,
        id: RowId,
        profile: &ProfileRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profile (id, name, title, subtitle, about_me, social_links)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                title = EXCLUDED.title,
                subtitle = EXCLUDED.subtitle,
                about_me = EXCLUDED.about_me,
                social_links = EXCLUDED.social_links
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.title)
        .bind(&profile.subtitle)
        .bind(&profile.about_me)
        .bind(Json(&profile.social_links))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_experience(
        &mut self,
        id: RowId,
        experience: &ExperienceRecord,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE experience
            SET company = $1, role = $2, start_date = $3, end_date = $4,
                location = $5, achievements = $6
            WHERE id = $7
            "#,
        )
        .bind(&experience.company)
        .bind(&experience.role)
        .bind(experience.start_date)
        .bind(experience.end_date)
        .bind(&experience.location)
        .bind(Json(&experience.achievements))
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_experience(
        &mut self,
        experience: &ExperienceRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO experience (company, role, start_date, end_date, location, achievements)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&experience.company)
        .bind(&experience.role)
        .bind(experience.start_date)
        .bind(experience.end_date)
        .bind(&experience.location)
        .bind(Json(&experience.achievements))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_project(
        &mut self,
        id: RowId,
        project: &ProjectRecord,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET title = $1, description = $2, tech_stack = $3, repo_link = $4,
                live_link = $5, featured = COALESCE($6, featured)
            WHERE id = $7
            "#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(Json(&project.tech_stack))
        .bind(&project.repo_link)
        .bind(&project.live_link)
        .bind(project.featured)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_project(&mut self, project: &ProjectRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO projects (title, description, tech_stack, repo_link, live_link, featured)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, false))
            "#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(Json(&project.tech_stack))
        .bind(&project.repo_link)
        .bind(&project.live_link)
        .bind(project.featured)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn find_skill_by_category(
        &mut self,
        category: &str,
    ) -> Result<Option<RowId>, StoreError> {
        let id = sqlx::query_scalar::<_, RowId>(
            "SELECT id FROM skills WHERE category = $1 ORDER BY id LIMIT 1",
        )
        .bind(category)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn update_skill_items(
        &mut self,
        id: RowId,
        items: &[String],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE skills SET items = $1 WHERE id = $2")
            .bind(Json(items))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_skill(&mut self, skill: &SkillRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO skills (category, items) VALUES ($1, $2)")
            .bind(&skill.category)
            .bind(Json(&skill.items))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update_certification(
        &mut self,
        id: RowId,
        certification: &CertificationRecord,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE certifications
            SET name = $1, issuer = $2, issue_date = $3, credential_url = $4
            WHERE id = $5
            "#,
        )
        .bind(&certification.name)
        .bind(&certification.issuer)
        .bind(certification.issue_date)
        .bind(&certification.credential_url)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_certification(
        &mut self,
        certification: &CertificationRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO certifications (name, issuer, issue_date, credential_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&certification.name)
        .bind(&certification.issuer)
        .bind(certification.issue_date)
        .bind(&certification.credential_url)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<'c> UnitOfWork for PgUnitOfWork<'c> {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
