use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::{
    AssetClassScope, AssetClasses, Industries, IndustryScope, MakeScope, Makes, Models, NoScope,
    TaxonomyRow, TaxonomyTable, conflict, create_strict, find_or_create, normalize_name,
};
use crate::error::{Error, Result};
use crate::store::{Store, TaxonomyFilter};
use crate::types::{AssetClass, EquipmentKey, Industry, Make, Model};

/// Raw names for one full taxonomy path, as read from an import row.
#[derive(Debug, Clone, Copy)]
pub struct PathNames<'a> {
    pub industry: &'a str,
    pub asset_class: &'a str,
    pub make: &'a str,
    pub model: &'a str,
}

/// The four rows of a resolved path, captured at resolution time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyPath {
    pub industry: Industry,
    pub asset_class: AssetClass,
    pub make: Make,
    pub model: Model,
}

impl TaxonomyPath {
    #[must_use]
    pub fn key(&self) -> EquipmentKey {
        EquipmentKey {
            industry_id: self.industry.id,
            asset_class_id: self.asset_class.id,
            make_id: self.make.id,
            model_id: self.model.id,
        }
    }
}

/// Direct taxonomy management plus path resolution for imports.
#[derive(Clone)]
pub struct Taxonomy {
    store: Arc<dyn Store>,
}

impl Taxonomy {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Resolves Industry → AssetClass → Make → Model, creating whatever is
    /// missing. Each level is scoped by the ids resolved above it.
    pub fn resolve_path(&self, names: PathNames<'_>) -> Result<TaxonomyPath> {
        let store = self.store.as_ref();

        let industry = find_or_create(&Industries(store), NoScope, names.industry)?;
        let asset_class = find_or_create(
            &AssetClasses(store),
            IndustryScope {
                industry_id: industry.id,
            },
            names.asset_class,
        )?;
        let make = find_or_create(
            &Makes(store),
            AssetClassScope {
                industry_id: industry.id,
                asset_class_id: asset_class.id,
            },
            names.make,
        )?;
        let model = find_or_create(
            &Models(store),
            MakeScope {
                industry_id: industry.id,
                asset_class_id: asset_class.id,
                make_id: make.id,
            },
            names.model,
        )?;

        Ok(TaxonomyPath {
            industry,
            asset_class,
            make,
            model,
        })
    }

    // Industries

    pub fn create_industry(&self, name: &str, description: Option<&str>) -> Result<Industry> {
        create_strict(&Industries(self.store.as_ref()), NoScope, name, description)
    }

    pub fn get_industry(&self, id: i64) -> Result<Industry> {
        self.store.get_industry(id)?.ok_or(Error::NotFound)
    }

    pub fn list_industries(&self, filter: &TaxonomyFilter) -> Result<Vec<Industry>> {
        self.store.list_industries(filter)
    }

    pub fn rename_industry(&self, id: i64, name: &str) -> Result<Industry> {
        let mut industry = self.get_industry(id)?;
        let table = Industries(self.store.as_ref());
        let Some(name) = checked_rename(&table, NoScope, &industry, name)? else {
            return Ok(industry);
        };

        industry.name = name;
        industry.updated_at = Utc::now();
        self.store
            .update_industry(&industry)
            .map_err(|e| rename_error::<Industries<'_>>(&industry.name, e))?;
        Ok(industry)
    }

    pub fn delete_industry(&self, id: i64) -> Result<()> {
        deleted(self.store.delete_industry(id)?)
    }

    // Asset classes

    pub fn create_asset_class(
        &self,
        industry_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<AssetClass> {
        self.get_industry(industry_id)?;
        create_strict(
            &AssetClasses(self.store.as_ref()),
            IndustryScope { industry_id },
            name,
            description,
        )
    }

    pub fn get_asset_class(&self, id: i64) -> Result<AssetClass> {
        self.store.get_asset_class(id)?.ok_or(Error::NotFound)
    }

    pub fn list_asset_classes(&self, filter: &TaxonomyFilter) -> Result<Vec<AssetClass>> {
        self.store.list_asset_classes(filter)
    }

    pub fn rename_asset_class(&self, id: i64, name: &str) -> Result<AssetClass> {
        let mut asset_class = self.get_asset_class(id)?;
        let table = AssetClasses(self.store.as_ref());
        let scope = IndustryScope {
            industry_id: asset_class.industry_id,
        };
        let Some(name) = checked_rename(&table, scope, &asset_class, name)? else {
            return Ok(asset_class);
        };

        asset_class.name = name;
        asset_class.updated_at = Utc::now();
        self.store
            .update_asset_class(&asset_class)
            .map_err(|e| rename_error::<AssetClasses<'_>>(&asset_class.name, e))?;
        Ok(asset_class)
    }

    pub fn delete_asset_class(&self, id: i64) -> Result<()> {
        deleted(self.store.delete_asset_class(id)?)
    }

    // Makes

    pub fn create_make(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Make> {
        let asset_class = self.get_asset_class(asset_class_id)?;
        if asset_class.industry_id != industry_id {
            return Err(Error::BadRequest(format!(
                "Asset class {asset_class_id} does not belong to industry {industry_id}"
            )));
        }
        create_strict(
            &Makes(self.store.as_ref()),
            AssetClassScope {
                industry_id,
                asset_class_id,
            },
            name,
            description,
        )
    }

    pub fn get_make(&self, id: i64) -> Result<Make> {
        self.store.get_make(id)?.ok_or(Error::NotFound)
    }

    pub fn list_makes(&self, filter: &TaxonomyFilter) -> Result<Vec<Make>> {
        self.store.list_makes(filter)
    }

    pub fn rename_make(&self, id: i64, name: &str) -> Result<Make> {
        let mut make = self.get_make(id)?;
        let table = Makes(self.store.as_ref());
        let scope = AssetClassScope {
            industry_id: make.industry_id,
            asset_class_id: make.asset_class_id,
        };
        let Some(name) = checked_rename(&table, scope, &make, name)? else {
            return Ok(make);
        };

        make.name = name;
        make.updated_at = Utc::now();
        self.store
            .update_make(&make)
            .map_err(|e| rename_error::<Makes<'_>>(&make.name, e))?;
        Ok(make)
    }

    pub fn delete_make(&self, id: i64) -> Result<()> {
        deleted(self.store.delete_make(id)?)
    }

    // Models

    pub fn create_model(
        &self,
        industry_id: i64,
        asset_class_id: i64,
        make_id: i64,
        name: &str,
        description: Option<&str>,
    ) -> Result<Model> {
        let make = self.get_make(make_id)?;
        if make.industry_id != industry_id || make.asset_class_id != asset_class_id {
            return Err(Error::BadRequest(format!(
                "Make {make_id} does not belong to industry {industry_id} \
                 and asset class {asset_class_id}"
            )));
        }
        create_strict(
            &Models(self.store.as_ref()),
            MakeScope {
                industry_id,
                asset_class_id,
                make_id,
            },
            name,
            description,
        )
    }

    pub fn get_model(&self, id: i64) -> Result<Model> {
        self.store.get_model(id)?.ok_or(Error::NotFound)
    }

    pub fn list_models(&self, filter: &TaxonomyFilter) -> Result<Vec<Model>> {
        self.store.list_models(filter)
    }

    pub fn rename_model(&self, id: i64, name: &str) -> Result<Model> {
        let mut model = self.get_model(id)?;
        let table = Models(self.store.as_ref());
        let scope = MakeScope {
            industry_id: model.industry_id,
            asset_class_id: model.asset_class_id,
            make_id: model.make_id,
        };
        let Some(name) = checked_rename(&table, scope, &model, name)? else {
            return Ok(model);
        };

        model.name = name;
        model.updated_at = Utc::now();
        self.store
            .update_model(&model)
            .map_err(|e| rename_error::<Models<'_>>(&model.name, e))?;
        Ok(model)
    }

    pub fn delete_model(&self, id: i64) -> Result<()> {
        deleted(self.store.delete_model(id)?)
    }
}

/// Normalizes the new name and checks it is free in the row's scope.
/// Returns `None` when the row already carries that name.
fn checked_rename<T: TaxonomyTable>(
    table: &T,
    scope: T::Scope,
    row: &T::Row,
    name: &str,
) -> Result<Option<String>> {
    let name = normalize_name(name)
        .ok_or_else(|| Error::BadRequest(format!("{} name cannot be empty", T::LABEL)))?;

    if name == row.name() {
        return Ok(None);
    }

    match table.find(scope, &name)? {
        Some(existing) if existing.id() != row.id() => Err(conflict::<T>(&name)),
        _ => Ok(Some(name)),
    }
}

fn rename_error<T: TaxonomyTable>(name: &str, e: Error) -> Error {
    match e {
        Error::AlreadyExists => conflict::<T>(name),
        other => other,
    }
}

fn deleted(removed: bool) -> Result<()> {
    if removed { Ok(()) } else { Err(Error::NotFound) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Taxonomy) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, Taxonomy::new(Arc::new(store)))
    }

    fn names<'a>(
        industry: &'a str,
        asset_class: &'a str,
        make: &'a str,
        model: &'a str,
    ) -> PathNames<'a> {
        PathNames {
            industry,
            asset_class,
            make,
            model,
        }
    }

    #[test]
    fn test_resolve_path_reuses_rows_for_name_variants() {
        let (_temp, taxonomy) = setup();

        let first = taxonomy
            .resolve_path(names("Construction", "Excavator", "Volvo", "A40G"))
            .unwrap();
        let second = taxonomy
            .resolve_path(names(" construction", "EXCAVATOR ", "volvo", "a40g"))
            .unwrap();

        assert_eq!(first.key(), second.key());
        assert_eq!(first.model.name, "a40g");
        assert_eq!(first.make.asset_class_id, first.asset_class.id);
        assert_eq!(first.model.make_id, first.make.id);
    }

    #[test]
    fn test_resolve_path_branches_at_first_difference() {
        let (_temp, taxonomy) = setup();

        let a = taxonomy
            .resolve_path(names("construction", "excavator", "volvo", "a40g"))
            .unwrap();
        let b = taxonomy
            .resolve_path(names("construction", "excavator", "cat", "a40g"))
            .unwrap();

        assert_eq!(a.industry.id, b.industry.id);
        assert_eq!(a.asset_class.id, b.asset_class.id);
        assert_ne!(a.make.id, b.make.id);
        // Same model name under a different make is a different model
        assert_ne!(a.model.id, b.model.id);
    }

    #[test]
    fn test_direct_create_is_strict() {
        let (_temp, taxonomy) = setup();

        let industry = taxonomy.create_industry("Construction", Some("heavy")).unwrap();
        assert!(matches!(
            taxonomy.create_industry("construction", None),
            Err(Error::Conflict(_))
        ));

        // Import path reuses what direct creation made
        let path = taxonomy
            .resolve_path(names("CONSTRUCTION", "excavator", "volvo", "a40g"))
            .unwrap();
        assert_eq!(path.industry.id, industry.id);
        assert_eq!(path.industry.description.as_deref(), Some("heavy"));
    }

    #[test]
    fn test_create_checks_parent_chain() {
        let (_temp, taxonomy) = setup();

        let construction = taxonomy.create_industry("construction", None).unwrap();
        let mining = taxonomy.create_industry("mining", None).unwrap();
        let class = taxonomy
            .create_asset_class(construction.id, "excavator", None)
            .unwrap();

        assert!(matches!(
            taxonomy.create_asset_class(999, "loader", None),
            Err(Error::NotFound)
        ));
        assert!(matches!(
            taxonomy.create_make(mining.id, class.id, "volvo", None),
            Err(Error::BadRequest(_))
        ));

        let make = taxonomy
            .create_make(construction.id, class.id, "volvo", None)
            .unwrap();
        assert!(matches!(
            taxonomy.create_model(mining.id, class.id, make.id, "a40g", None),
            Err(Error::BadRequest(_))
        ));
        taxonomy
            .create_model(construction.id, class.id, make.id, "a40g", None)
            .unwrap();
    }

    #[test]
    fn test_rename() {
        let (_temp, taxonomy) = setup();

        let path = taxonomy
            .resolve_path(names("construction", "excavator", "volvo", "a40g"))
            .unwrap();
        let other = taxonomy
            .create_make(path.industry.id, path.asset_class.id, "cat", None)
            .unwrap();

        let renamed = taxonomy.rename_make(path.make.id, "  Volvo CE ").unwrap();
        assert_eq!(renamed.name, "volvo ce");
        assert_eq!(taxonomy.get_make(path.make.id).unwrap().name, "volvo ce");

        // Renaming to the current name is a no-op
        let same = taxonomy.rename_make(other.id, "CAT").unwrap();
        assert_eq!(same, other);

        assert!(matches!(
            taxonomy.rename_make(other.id, "volvo ce"),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            taxonomy.rename_make(other.id, " "),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            taxonomy.rename_industry(999, "x"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_delete() {
        let (_temp, taxonomy) = setup();

        let path = taxonomy
            .resolve_path(names("construction", "excavator", "volvo", "a40g"))
            .unwrap();

        assert!(matches!(
            taxonomy.delete_make(path.make.id),
            Err(Error::Conflict(_))
        ));

        taxonomy.delete_model(path.model.id).unwrap();
        taxonomy.delete_make(path.make.id).unwrap();
        assert!(matches!(taxonomy.get_make(path.make.id), Err(Error::NotFound)));
        assert!(matches!(
            taxonomy.delete_make(path.make.id),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_list_with_filters() {
        let (_temp, taxonomy) = setup();

        let a = taxonomy
            .resolve_path(names("construction", "excavator", "volvo", "a40g"))
            .unwrap();
        taxonomy
            .resolve_path(names("construction", "loader", "volvo", "l90"))
            .unwrap();
        taxonomy
            .resolve_path(names("mining", "haul truck", "komatsu", "930e"))
            .unwrap();

        let classes = taxonomy
            .list_asset_classes(&TaxonomyFilter {
                industry_id: Some(a.industry.id),
                ..Default::default()
            })
            .unwrap();
        let class_names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(class_names, vec!["excavator", "loader"]);

        let makes = taxonomy
            .list_makes(&TaxonomyFilter {
                search: Some("VOL".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(makes.len(), 2);
        assert!(makes.iter().all(|m| m.name == "volvo"));

        assert_eq!(taxonomy.list_industries(&TaxonomyFilter::default()).unwrap().len(), 2);
    }
}
