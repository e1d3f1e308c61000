use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EquipmentStatus, JobStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Industry {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClass {
    pub id: i64,
    pub industry_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Make {
    pub id: i64,
    pub industry_id: i64,
    pub asset_class_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub industry_id: i64,
    pub asset_class_id: i64,
    pub make_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The four taxonomy ids an equipment row hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentKey {
    pub industry_id: i64,
    pub asset_class_id: i64,
    pub make_id: i64,
    pub model_id: i64,
}

/// Optional physical and financial attributes supplied on creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_manufacture: Option<i32>,
    /// Meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Pounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_transportation_consideration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Row to be inserted; names are snapshots of the taxonomy rows at creation time.
#[derive(Debug, Clone)]
pub struct NewEquipment {
    pub key: EquipmentKey,
    pub industry_name: String,
    pub asset_class_name: String,
    pub make_name: String,
    pub model_name: String,
    pub specs: EquipmentSpecs,
    pub status: EquipmentStatus,
    pub project_id: Option<String>,
    pub created_by_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: i64,
    pub industry_id: i64,
    pub asset_class_id: i64,
    pub make_id: i64,
    pub model_id: i64,
    pub industry_name: String,
    pub asset_class_name: String,
    pub make_name: String,
    pub model_name: String,
    #[serde(flatten)]
    pub specs: EquipmentSpecs,
    pub status: EquipmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    #[must_use]
    pub fn key(&self) -> EquipmentKey {
        EquipmentKey {
            industry_id: self.industry_id,
            asset_class_id: self.asset_class_id,
            make_id: self.make_id,
            model_id: self.model_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentStats {
    pub total_equipments: i64,
    pub active_equipments: i64,
    pub inactive_equipments: i64,
    pub archived_equipments: i64,
    pub total_value: f64,
    pub total_residual_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: String,
    pub file_name: String,
    pub file_size: i64,
    /// Hex sha256 of the decoded file.
    pub file_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub user_id: String,
    pub skip_duplicates: bool,
    pub update_existing: bool,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}
