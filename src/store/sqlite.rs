use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};

use super::schema::SCHEMA;
use super::{EquipmentFilter, Store, TaxonomyFilter};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_json(s: Option<String>, column: &str) -> Option<serde_json::Value> {
    let s = s?;
    serde_json::from_str(&s)
        .map_err(|e| tracing::warn!("Invalid JSON in column {}: {}", column, e))
        .ok()
}

/// Builds a `LIKE` pattern for a case-insensitive substring search on
/// normalized names.
fn like_pattern(search: Option<&str>) -> Option<String> {
    let needle = search?.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

fn map_write_error(e: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(err, _) = &e {
        match err.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return Error::AlreadyExists;
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Error::MissingParent,
            _ => {}
        }
    }
    Error::from(e)
}

fn map_delete_error(e: rusqlite::Error, entity: &str) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Error::Conflict(format!("{entity} is still referenced"))
        }
        _ => Error::from(e),
    }
}

const INDUSTRY_COLUMNS: &str = "id, name, description, created_at, updated_at";

fn industry_from_row(row: &Row<'_>) -> rusqlite::Result<Industry> {
    Ok(Industry {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

const ASSET_CLASS_COLUMNS: &str = "id, industry_id, name, description, created_at, updated_at";

fn asset_class_from_row(row: &Row<'_>) -> rusqlite::Result<AssetClass> {
    Ok(AssetClass {
        id: row.get(0)?,
        industry_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const MAKE_COLUMNS: &str =
    "id, industry_id, asset_class_id, name, description, created_at, updated_at";

fn make_from_row(row: &Row<'_>) -> rusqlite::Result<Make> {
    Ok(Make {
        id: row.get(0)?,
        industry_id: row.get(1)?,
        asset_class_id: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

const MODEL_COLUMNS: &str =
    "id, industry_id, asset_class_id, make_id, name, description, created_at, updated_at";

fn model_from_row(row: &Row<'_>) -> rusqlite::Result<Model> {
    Ok(Model {
        id: row.get(0)?,
        industry_id: row.get(1)?,
        asset_class_id: row.get(2)?,
        make_id: row.get(3)?,
        name: row.get(4)?,
        description: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const EQUIPMENT_COLUMNS: &str = "id, industry_id, asset_class_id, make_id, model_id,
    industry_name, asset_class_name, make_name, model_name,
    year_of_manufacture, length, width, height, weight, special_transportation_consideration,
    value, residual_value, status, metadata, project_id, created_by_id, created_at, updated_at";

fn equipment_from_row(row: &Row<'_>) -> rusqlite::Result<Equipment> {
    let status: String = row.get(17)?;
    Ok(Equipment {
        id: row.get(0)?,
        industry_id: row.get(1)?,
        asset_class_id: row.get(2)?,
        make_id: row.get(3)?,
        model_id: row.get(4)?,
        industry_name: row.get(5)?,
        asset_class_name: row.get(6)?,
        make_name: row.get(7)?,
        model_name: row.get(8)?,
        specs: EquipmentSpecs {
            year_of_manufacture: row.get(9)?,
            length: row.get(10)?,
            width: row.get(11)?,
            height: row.get(12)?,
            weight: row.get(13)?,
            special_transportation_consideration: row.get(14)?,
            value: row.get(15)?,
            residual_value: row.get(16)?,
            metadata: parse_json(row.get(18)?, "equipments.metadata"),
        },
        status: EquipmentStatus::parse(&status).unwrap_or_else(|| {
            tracing::warn!("Unknown equipment status '{}', defaulting to active", status);
            EquipmentStatus::Active
        }),
        project_id: row.get(19)?,
        created_by_id: row.get(20)?,
        created_at: parse_datetime(&row.get::<_, String>(21)?),
        updated_at: parse_datetime(&row.get::<_, String>(22)?),
    })
}

const IMPORT_JOB_COLUMNS: &str = "id, file_name, file_size, file_digest, project_id, user_id,
    skip_duplicates, update_existing, status, summary, error, created_at, started_at, finished_at";

fn import_job_from_row(row: &Row<'_>) -> rusqlite::Result<ImportJob> {
    let id: String = row.get(0)?;
    let status: String = row.get(8)?;
    let status = JobStatus::parse(&status).unwrap_or_else(|| {
        tracing::warn!("Unknown job status '{}' for job {}, treating as failed", status, id);
        JobStatus::Failed
    });
    Ok(ImportJob {
        id,
        file_name: row.get(1)?,
        file_size: row.get(2)?,
        file_digest: row.get(3)?,
        project_id: row.get(4)?,
        user_id: row.get(5)?,
        skip_duplicates: row.get(6)?,
        update_existing: row.get(7)?,
        status,
        summary: parse_json(row.get(9)?, "import_jobs.summary"),
        error: row.get(10)?,
        created_at: parse_datetime(&row.get::<_, String>(11)?),
        started_at: row.get::<_, Option<String>>(12)?.map(|s| parse_datetime(&s)),
        finished_at: row.get::<_, Option<String>>(13)?.map(|s| parse_datetime(&s)),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Industry operations

    fn create_industry(&self, name: &str, description: Option<&str>) -> Result<Industry> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO industries (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![name, description, format_datetime(&now)],
        )
        .map_err(map_write_error)?;

        Ok(Industry {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_industry(&self, id: i64) -> Result<Option<Industry>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {INDUSTRY_COLUMNS} FROM industries WHERE id = ?1"),
            params![id],
            industry_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_industry(&self, name: &str) -> Result<Option<Industry>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {INDUSTRY_COLUMNS} FROM industries WHERE name = ?1"),
            params![name],
            industry_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_industries(&self, filter: &TaxonomyFilter) -> Result<Vec<Industry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {INDUSTRY_COLUMNS} FROM industries
             WHERE (?1 IS NULL OR name LIKE ?1 ESCAPE '\\')
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(
            params![like_pattern(filter.search.as_deref())],
            industry_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_industry(&self, industry: &Industry) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE industries SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    industry.name,
                    industry.description,
                    format_datetime(&industry.updated_at),
                    industry.id
                ],
            )
            .map_err(map_write_error)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_industry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM industries WHERE id = ?1", params![id])
            .map_err(|e| map_delete_error(e, "industry"))?;
        Ok(rows > 0)
    }

    // Asset class operations

    fn create_asset_class(
        &self,
        industry_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<AssetClass> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO asset_classes (industry_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![industry_id, name, description, format_datetime(&now)],
        )
        .map_err(map_write_error)?;

        Ok(AssetClass {
            id: conn.last_insert_rowid(),
            industry_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_asset_class(&self, id: i64) -> Result<Option<AssetClass>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {ASSET_CLASS_COLUMNS} FROM asset_classes WHERE id = ?1"),
            params![id],
            asset_class_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_asset_class(&self, industry_id: i64, name: &str) -> Result<Option<AssetClass>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {ASSET_CLASS_COLUMNS} FROM asset_classes
                 WHERE industry_id = ?1 AND name = ?2"
            ),
            params![industry_id, name],
            asset_class_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_asset_classes(&self, filter: &TaxonomyFilter) -> Result<Vec<AssetClass>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ASSET_CLASS_COLUMNS} FROM asset_classes
             WHERE (?1 IS NULL OR industry_id = ?1)
               AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\')
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(
            params![filter.industry_id, like_pattern(filter.search.as_deref())],
            asset_class_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_asset_class(&self, asset_class: &AssetClass) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE asset_classes SET name = ?1, description = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![
                    asset_class.name,
                    asset_class.description,
                    format_datetime(&asset_class.updated_at),
                    asset_class.id
                ],
            )
            .map_err(map_write_error)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_asset_class(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM asset_classes WHERE id = ?1", params![id])
            .map_err(|e| map_delete_error(e, "asset class"))?;
        Ok(rows > 0)
    }

    // Make operations

    fn create_make(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Make> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO makes
                (industry_id, asset_class_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                industry_id,
                asset_class_id,
                name,
                description,
                format_datetime(&now)
            ],
        )
        .map_err(map_write_error)?;

        Ok(Make {
            id: conn.last_insert_rowid(),
            industry_id,
            asset_class_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_make(&self, id: i64) -> Result<Option<Make>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {MAKE_COLUMNS} FROM makes WHERE id = ?1"),
            params![id],
            make_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_make(&self, industry_id: i64, asset_class_id: i64, name: &str) -> Result<Option<Make>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {MAKE_COLUMNS} FROM makes
                 WHERE industry_id = ?1 AND asset_class_id = ?2 AND name = ?3"
            ),
            params![industry_id, asset_class_id, name],
            make_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_makes(&self, filter: &TaxonomyFilter) -> Result<Vec<Make>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MAKE_COLUMNS} FROM makes
             WHERE (?1 IS NULL OR industry_id = ?1)
               AND (?2 IS NULL OR asset_class_id = ?2)
               AND (?3 IS NULL OR name LIKE ?3 ESCAPE '\\')
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(
            params![
                filter.industry_id,
                filter.asset_class_id,
                like_pattern(filter.search.as_deref())
            ],
            make_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_make(&self, make: &Make) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE makes SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    make.name,
                    make.description,
                    format_datetime(&make.updated_at),
                    make.id
                ],
            )
            .map_err(map_write_error)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_make(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM makes WHERE id = ?1", params![id])
            .map_err(|e| map_delete_error(e, "make"))?;
        Ok(rows > 0)
    }

    // Model operations

    fn create_model(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        make_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Model> {
        let now = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO models
                (industry_id, asset_class_id, make_id, name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                industry_id,
                asset_class_id,
                make_id,
                name,
                description,
                format_datetime(&now)
            ],
        )
        .map_err(map_write_error)?;

        Ok(Model {
            id: conn.last_insert_rowid(),
            industry_id,
            asset_class_id,
            make_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_model(&self, id: i64) -> Result<Option<Model>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {MODEL_COLUMNS} FROM models WHERE id = ?1"),
            params![id],
            model_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_model(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        make_id: i64,
        name: &str,
    ) -> Result<Option<Model>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {MODEL_COLUMNS} FROM models
                 WHERE industry_id = ?1 AND asset_class_id = ?2 AND make_id = ?3 AND name = ?4"
            ),
            params![industry_id, asset_class_id, make_id, name],
            model_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_models(&self, filter: &TaxonomyFilter) -> Result<Vec<Model>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MODEL_COLUMNS} FROM models
             WHERE (?1 IS NULL OR industry_id = ?1)
               AND (?2 IS NULL OR asset_class_id = ?2)
               AND (?3 IS NULL OR make_id = ?3)
               AND (?4 IS NULL OR name LIKE ?4 ESCAPE '\\')
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(
            params![
                filter.industry_id,
                filter.asset_class_id,
                filter.make_id,
                like_pattern(filter.search.as_deref())
            ],
            model_from_row,
        )?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_model(&self, model: &Model) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE models SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    model.name,
                    model.description,
                    format_datetime(&model.updated_at),
                    model.id
                ],
            )
            .map_err(map_write_error)?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_model(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM models WHERE id = ?1", params![id])
            .map_err(|e| map_delete_error(e, "model"))?;
        Ok(rows > 0)
    }

    // Equipment operations

    fn create_equipment(&self, equipment: &NewEquipment) -> Result<Equipment> {
        let now = Utc::now();
        let specs = &equipment.specs;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO equipments (
                industry_id, asset_class_id, make_id, model_id,
                industry_name, asset_class_name, make_name, model_name,
                year_of_manufacture, length, width, height, weight,
                special_transportation_consideration, value, residual_value,
                status, metadata, project_id, created_by_id, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                       ?17, ?18, ?19, ?20, ?21, ?21)",
            params![
                equipment.key.industry_id,
                equipment.key.asset_class_id,
                equipment.key.make_id,
                equipment.key.model_id,
                equipment.industry_name,
                equipment.asset_class_name,
                equipment.make_name,
                equipment.model_name,
                specs.year_of_manufacture,
                specs.length,
                specs.width,
                specs.height,
                specs.weight,
                specs.special_transportation_consideration,
                specs.value,
                specs.residual_value,
                equipment.status.as_str(),
                specs.metadata.as_ref().map(|m| m.to_string()),
                equipment.project_id,
                equipment.created_by_id,
                format_datetime(&now),
            ],
        )
        .map_err(map_write_error)?;

        Ok(Equipment {
            id: conn.last_insert_rowid(),
            industry_id: equipment.key.industry_id,
            asset_class_id: equipment.key.asset_class_id,
            make_id: equipment.key.make_id,
            model_id: equipment.key.model_id,
            industry_name: equipment.industry_name.clone(),
            asset_class_name: equipment.asset_class_name.clone(),
            make_name: equipment.make_name.clone(),
            model_name: equipment.model_name.clone(),
            specs: equipment.specs.clone(),
            status: equipment.status,
            project_id: equipment.project_id.clone(),
            created_by_id: equipment.created_by_id.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_equipment(&self, id: i64) -> Result<Option<Equipment>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {EQUIPMENT_COLUMNS} FROM equipments WHERE id = ?1"),
            params![id],
            equipment_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn equipment_exists(&self, key: &EquipmentKey) -> Result<bool> {
        let conn = self.conn();
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM equipments
                 WHERE industry_id = ?1 AND asset_class_id = ?2 AND make_id = ?3 AND model_id = ?4
                 LIMIT 1",
                params![
                    key.industry_id,
                    key.asset_class_id,
                    key.make_id,
                    key.model_id
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_equipment(
        &self,
        filter: &EquipmentFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Equipment>, i64)> {
        let conn = self.conn();

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM equipments
             WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR created_by_id = ?2)",
            params![filter.project_id, filter.created_by_id],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {EQUIPMENT_COLUMNS} FROM equipments
             WHERE (?1 IS NULL OR project_id = ?1) AND (?2 IS NULL OR created_by_id = ?2)
             ORDER BY id DESC LIMIT ?3 OFFSET ?4"
        ))?;

        let rows = stmt.query_map(
            params![filter.project_id, filter.created_by_id, limit, offset],
            equipment_from_row,
        )?;

        let items = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)?;
        Ok((items, total))
    }

    fn update_equipment_status(&self, id: i64, status: EquipmentStatus) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE equipments SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_equipment(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM equipments WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn equipment_stats(&self, created_by_id: Option<&str>) -> Result<EquipmentStats> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'inactive' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = 'archived' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(value), 0.0),
                    COALESCE(SUM(residual_value), 0.0)
             FROM equipments WHERE (?1 IS NULL OR created_by_id = ?1)",
            params![created_by_id],
            |row| {
                Ok(EquipmentStats {
                    total_equipments: row.get(0)?,
                    active_equipments: row.get(1)?,
                    inactive_equipments: row.get(2)?,
                    archived_equipments: row.get(3)?,
                    total_value: row.get(4)?,
                    total_residual_value: row.get(5)?,
                })
            },
        )
        .map_err(Error::from)
    }

    // Import job operations

    fn create_import_job(&self, job: &ImportJob) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO import_jobs (id, file_name, file_size, file_digest, project_id,
                    user_id, skip_duplicates, update_existing, status, summary, error,
                    created_at, started_at, finished_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    job.id,
                    job.file_name,
                    job.file_size,
                    job.file_digest,
                    job.project_id,
                    job.user_id,
                    job.skip_duplicates,
                    job.update_existing,
                    job.status.as_str(),
                    job.summary.as_ref().map(|s| s.to_string()),
                    job.error,
                    format_datetime(&job.created_at),
                    job.started_at.as_ref().map(format_datetime),
                    job.finished_at.as_ref().map(format_datetime),
                ],
            )
            .map_err(map_write_error)?;
        Ok(())
    }

    fn get_import_job(&self, id: &str) -> Result<Option<ImportJob>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {IMPORT_JOB_COLUMNS} FROM import_jobs WHERE id = ?1"),
            params![id],
            import_job_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_import_jobs(&self, limit: i32) -> Result<Vec<ImportJob>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {IMPORT_JOB_COLUMNS} FROM import_jobs
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], import_job_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_import_job(&self, job: &ImportJob) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE import_jobs
             SET status = ?1, summary = ?2, error = ?3, started_at = ?4, finished_at = ?5
             WHERE id = ?6",
            params![
                job.status.as_str(),
                job.summary.as_ref().map(|s| s.to_string()),
                job.error,
                job.started_at.as_ref().map(format_datetime),
                job.finished_at.as_ref().map(format_datetime),
                job.id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}
