//! Equipment registry: the leaf of the taxonomy.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{EquipmentFilter, Store};
use crate::taxonomy::TaxonomyPath;
use crate::types::{
    Equipment, EquipmentKey, EquipmentSpecs, EquipmentStats, EquipmentStatus, NewEquipment,
};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Caller-supplied attributes for a new equipment row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentDraft {
    #[serde(flatten)]
    pub specs: EquipmentSpecs,
    #[serde(default)]
    pub status: EquipmentStatus,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        let limit = i64::from(self.limit.max(1));
        (self.total + limit - 1) / limit
    }
}

#[derive(Clone)]
pub struct EquipmentRegistry {
    store: Arc<dyn Store>,
}

impl EquipmentRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates equipment from explicit taxonomy ids. All four rows must
    /// exist and chain to each other; their current names are snapshotted.
    pub fn register(
        &self,
        key: EquipmentKey,
        draft: EquipmentDraft,
        created_by: Option<&str>,
    ) -> Result<Equipment> {
        let industry = self
            .store
            .get_industry(key.industry_id)?
            .ok_or_else(|| missing("Industry", key.industry_id))?;
        let asset_class = self
            .store
            .get_asset_class(key.asset_class_id)?
            .ok_or_else(|| missing("Asset class", key.asset_class_id))?;
        let make = self
            .store
            .get_make(key.make_id)?
            .ok_or_else(|| missing("Make", key.make_id))?;
        let model = self
            .store
            .get_model(key.model_id)?
            .ok_or_else(|| missing("Model", key.model_id))?;

        let path = TaxonomyPath {
            industry,
            asset_class,
            make,
            model,
        };
        if !chains(&path) {
            return Err(Error::BadRequest(
                "Taxonomy ids do not form a single industry, asset class, make and model path"
                    .to_string(),
            ));
        }

        self.insert_for_path(&path, draft, created_by)
    }

    /// Creates equipment under an already resolved path.
    pub fn insert_for_path(
        &self,
        path: &TaxonomyPath,
        draft: EquipmentDraft,
        created_by: Option<&str>,
    ) -> Result<Equipment> {
        let equipment = self.store.create_equipment(&NewEquipment {
            key: path.key(),
            industry_name: path.industry.name.clone(),
            asset_class_name: path.asset_class.name.clone(),
            make_name: path.make.name.clone(),
            model_name: path.model.name.clone(),
            specs: draft.specs,
            status: draft.status,
            project_id: draft.project_id,
            created_by_id: created_by.map(str::to_string),
        })?;

        tracing::debug!(
            "Registered equipment {} ({}/{}/{}/{})",
            equipment.id,
            equipment.industry_name,
            equipment.asset_class_name,
            equipment.make_name,
            equipment.model_name
        );
        Ok(equipment)
    }

    pub fn is_duplicate(&self, key: &EquipmentKey) -> Result<bool> {
        self.store.equipment_exists(key)
    }

    pub fn get(&self, id: i64) -> Result<Equipment> {
        self.store.get_equipment(id)?.ok_or(Error::NotFound)
    }

    /// Newest first. `page` starts at 1; `limit` is clamped to `1..=100`.
    pub fn list(
        &self,
        filter: &EquipmentFilter,
        page: u32,
        limit: u32,
    ) -> Result<Page<Equipment>> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = i64::from(page - 1) * i64::from(limit);

        let (items, total) = self
            .store
            .list_equipment(filter, offset, i64::from(limit))?;

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }

    pub fn update_status(&self, id: i64, status: EquipmentStatus) -> Result<Equipment> {
        self.store.update_equipment_status(id, status)?;
        self.get(id)
    }

    pub fn remove(&self, id: i64) -> Result<()> {
        if self.store.delete_equipment(id)? {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    pub fn stats(&self, created_by: Option<&str>) -> Result<EquipmentStats> {
        self.store.equipment_stats(created_by)
    }
}

fn missing(level: &str, id: i64) -> Error {
    Error::BadRequest(format!("{level} {id} does not exist"))
}

fn chains(path: &TaxonomyPath) -> bool {
    let TaxonomyPath {
        industry,
        asset_class,
        make,
        model,
    } = path;

    asset_class.industry_id == industry.id
        && make.industry_id == industry.id
        && make.asset_class_id == asset_class.id
        && model.industry_id == industry.id
        && model.asset_class_id == asset_class.id
        && model.make_id == make.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::taxonomy::{PathNames, Taxonomy};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Taxonomy, EquipmentRegistry) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        (
            temp,
            Taxonomy::new(Arc::clone(&store)),
            EquipmentRegistry::new(store),
        )
    }

    fn resolve(taxonomy: &Taxonomy, make: &str, model: &str) -> TaxonomyPath {
        taxonomy
            .resolve_path(PathNames {
                industry: "Construction",
                asset_class: "Excavator",
                make,
                model,
            })
            .unwrap()
    }

    #[test]
    fn test_register_snapshots_names() {
        let (_temp, taxonomy, registry) = setup();
        let path = resolve(&taxonomy, "Volvo", "A40G");

        let draft = EquipmentDraft {
            specs: EquipmentSpecs {
                year_of_manufacture: Some(2019),
                value: Some(250_000.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let equipment = registry
            .register(path.key(), draft, Some("user-1"))
            .unwrap();

        assert_eq!(equipment.make_name, "volvo");
        assert_eq!(equipment.model_name, "a40g");
        assert_eq!(equipment.status, EquipmentStatus::Active);
        assert_eq!(equipment.created_by_id.as_deref(), Some("user-1"));

        // Later renames do not touch the snapshot
        taxonomy.rename_make(path.make.id, "volvo ce").unwrap();
        let stored = registry.get(equipment.id).unwrap();
        assert_eq!(stored.make_name, "volvo");
        assert_eq!(stored.specs.year_of_manufacture, Some(2019));
    }

    #[test]
    fn test_register_rejects_broken_chain() {
        let (_temp, taxonomy, registry) = setup();
        let volvo = resolve(&taxonomy, "Volvo", "A40G");
        let cat = resolve(&taxonomy, "Cat", "320");

        let mixed = EquipmentKey {
            model_id: cat.model.id,
            ..volvo.key()
        };
        assert!(matches!(
            registry.register(mixed, EquipmentDraft::default(), None),
            Err(Error::BadRequest(_))
        ));

        let unknown = EquipmentKey {
            model_id: 9999,
            ..volvo.key()
        };
        assert!(matches!(
            registry.register(unknown, EquipmentDraft::default(), None),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_is_duplicate() {
        let (_temp, taxonomy, registry) = setup();
        let path = resolve(&taxonomy, "Volvo", "A40G");

        assert!(!registry.is_duplicate(&path.key()).unwrap());
        registry
            .insert_for_path(&path, EquipmentDraft::default(), None)
            .unwrap();
        assert!(registry.is_duplicate(&path.key()).unwrap());
    }

    #[test]
    fn test_list_pagination_clamps() {
        let (_temp, taxonomy, registry) = setup();
        let path = resolve(&taxonomy, "Volvo", "A40G");
        for _ in 0..5 {
            registry
                .insert_for_path(&path, EquipmentDraft::default(), None)
                .unwrap();
        }

        let page = registry.list(&EquipmentFilter::default(), 0, 2).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);

        let last = registry.list(&EquipmentFilter::default(), 3, 2).unwrap();
        assert_eq!(last.items.len(), 1);

        let clamped = registry.list(&EquipmentFilter::default(), 1, 1000).unwrap();
        assert_eq!(clamped.limit, MAX_PAGE_SIZE);
        assert_eq!(clamped.items.len(), 5);

        let zero = registry.list(&EquipmentFilter::default(), 1, 0).unwrap();
        assert_eq!(zero.limit, 1);
    }

    #[test]
    fn test_status_remove_and_stats() {
        let (_temp, taxonomy, registry) = setup();
        let path = resolve(&taxonomy, "Volvo", "A40G");

        let draft = |value: f64| EquipmentDraft {
            specs: EquipmentSpecs {
                value: Some(value),
                residual_value: Some(value / 2.0),
                ..Default::default()
            },
            ..Default::default()
        };
        let a = registry
            .insert_for_path(&path, draft(100.0), Some("user-1"))
            .unwrap();
        let b = registry
            .insert_for_path(&path, draft(300.0), Some("user-1"))
            .unwrap();
        registry
            .insert_for_path(&path, draft(1000.0), Some("user-2"))
            .unwrap();

        let updated = registry
            .update_status(b.id, EquipmentStatus::Inactive)
            .unwrap();
        assert_eq!(updated.status, EquipmentStatus::Inactive);

        let stats = registry.stats(Some("user-1")).unwrap();
        assert_eq!(stats.total_equipments, 2);
        assert_eq!(stats.active_equipments, 1);
        assert_eq!(stats.inactive_equipments, 1);
        assert_eq!(stats.total_value, 400.0);
        assert_eq!(stats.total_residual_value, 200.0);

        registry.remove(a.id).unwrap();
        assert!(matches!(registry.get(a.id), Err(Error::NotFound)));
        assert!(matches!(registry.remove(a.id), Err(Error::NotFound)));
        assert_eq!(registry.stats(None).unwrap().total_equipments, 2);
    }
}
