mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Parent filters and substring search for taxonomy listings.
///
/// Filters that do not apply to a level are ignored (e.g. `make_id` when
/// listing asset classes).
#[derive(Debug, Clone, Default)]
pub struct TaxonomyFilter {
    pub industry_id: Option<i64>,
    pub asset_class_id: Option<i64>,
    pub make_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EquipmentFilter {
    pub project_id: Option<String>,
    pub created_by_id: Option<String>,
}

/// Store defines the database interface.
///
/// Taxonomy names passed in must already be normalized. Inserts that collide
/// with an existing (scope, name) pair fail with `Error::AlreadyExists`;
/// inserts whose parent keys do not chain fail with `Error::MissingParent`.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Industry operations
    fn create_industry(&self, name: &str, description: Option<&str>) -> Result<Industry>;
    fn get_industry(&self, id: i64) -> Result<Option<Industry>>;
    fn find_industry(&self, name: &str) -> Result<Option<Industry>>;
    fn list_industries(&self, filter: &TaxonomyFilter) -> Result<Vec<Industry>>;
    fn update_industry(&self, industry: &Industry) -> Result<()>;
    fn delete_industry(&self, id: i64) -> Result<bool>;

    // Asset class operations
    fn create_asset_class(
        &self,
        industry_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<AssetClass>;
    fn get_asset_class(&self, id: i64) -> Result<Option<AssetClass>>;
    fn find_asset_class(&self, industry_id: i64, name: &str) -> Result<Option<AssetClass>>;
    fn list_asset_classes(&self, filter: &TaxonomyFilter) -> Result<Vec<AssetClass>>;
    fn update_asset_class(&self, asset_class: &AssetClass) -> Result<()>;
    fn delete_asset_class(&self, id: i64) -> Result<bool>;

    // Make operations
    fn create_make(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Make>;
    fn get_make(&self, id: i64) -> Result<Option<Make>>;
    fn find_make(&self, industry_id: i64, asset_class_id: i64, name: &str) -> Result<Option<Make>>;
    fn list_makes(&self, filter: &TaxonomyFilter) -> Result<Vec<Make>>;
    fn update_make(&self, make: &Make) -> Result<()>;
    fn delete_make(&self, id: i64) -> Result<bool>;

    // Model operations
    fn create_model(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        make_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Model>;
    fn get_model(&self, id: i64) -> Result<Option<Model>>;
    fn find_model(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        make_id: i64,
        name: &str,
    ) -> Result<Option<Model>>;
    fn list_models(&self, filter: &TaxonomyFilter) -> Result<Vec<Model>>;
    fn update_model(&self, model: &Model) -> Result<()>;
    fn delete_model(&self, id: i64) -> Result<bool>;

    // Equipment operations
    fn create_equipment(&self, equipment: &NewEquipment) -> Result<Equipment>;
    fn get_equipment(&self, id: i64) -> Result<Option<Equipment>>;
    fn equipment_exists(&self, key: &EquipmentKey) -> Result<bool>;
    /// Returns one page ordered newest first, plus the total matching count.
    fn list_equipment(
        &self,
        filter: &EquipmentFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Equipment>, i64)>;
    fn update_equipment_status(&self, id: i64, status: EquipmentStatus) -> Result<()>;
    fn delete_equipment(&self, id: i64) -> Result<bool>;
    fn equipment_stats(&self, created_by_id: Option<&str>) -> Result<EquipmentStats>;

    // Import job operations
    fn create_import_job(&self, job: &ImportJob) -> Result<()>;
    fn get_import_job(&self, id: &str) -> Result<Option<ImportJob>>;
    fn list_import_jobs(&self, limit: i32) -> Result<Vec<ImportJob>>;
    fn update_import_job(&self, job: &ImportJob) -> Result<()>;
}
