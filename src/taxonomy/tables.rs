use super::TaxonomyTable;
use crate::error::Result;
use crate::store::Store;
use crate::types::{AssetClass, Industry, Make, Model};

/// Industries have no parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndustryScope {
    pub industry_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetClassScope {
    pub industry_id: i64,
    pub asset_class_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeScope {
    pub industry_id: i64,
    pub asset_class_id: i64,
    pub make_id: i64,
}

pub struct Industries<'a>(pub &'a dyn Store);
pub struct AssetClasses<'a>(pub &'a dyn Store);
pub struct Makes<'a>(pub &'a dyn Store);
pub struct Models<'a>(pub &'a dyn Store);

impl TaxonomyTable for Industries<'_> {
    type Scope = NoScope;
    type Row = Industry;
    const LABEL: &'static str = "Industry";
    const IN_SCOPE: &'static str = "";

    fn find(&self, _scope: NoScope, name: &str) -> Result<Option<Industry>> {
        self.0.find_industry(name)
    }

    fn insert(&self, _scope: NoScope, name: &str, description: Option<&str>) -> Result<Industry> {
        self.0.create_industry(name, description)
    }
}

impl TaxonomyTable for AssetClasses<'_> {
    type Scope = IndustryScope;
    type Row = AssetClass;
    const LABEL: &'static str = "Asset class";
    const IN_SCOPE: &'static str = " for this industry";

    fn find(&self, scope: IndustryScope, name: &str) -> Result<Option<AssetClass>> {
        self.0.find_asset_class(scope.industry_id, name)
    }

    fn insert(
        &self,
        scope: IndustryScope,
        name: &str,
        description: Option<&str>,
    ) -> Result<AssetClass> {
        self.0.create_asset_class(scope.industry_id, name, description)
    }
}

impl TaxonomyTable for Makes<'_> {
    type Scope = AssetClassScope;
    type Row = Make;
    const LABEL: &'static str = "Make";
    const IN_SCOPE: &'static str = " for this industry and asset class";

    fn find(&self, scope: AssetClassScope, name: &str) -> Result<Option<Make>> {
        self.0.find_make(scope.industry_id, scope.asset_class_id, name)
    }

    fn insert(
        &self,
        scope: AssetClassScope,
        name: &str,
        description: Option<&str>,
    ) -> Result<Make> {
        self.0.create_make(scope.industry_id, scope.asset_class_id, name, description)
    }
}

impl TaxonomyTable for Models<'_> {
    type Scope = MakeScope;
    type Row = Model;
    const LABEL: &'static str = "Model";
    const IN_SCOPE: &'static str = " for this make";

    fn find(&self, scope: MakeScope, name: &str) -> Result<Option<Model>> {
        self.0.find_model(scope.industry_id, scope.asset_class_id, scope.make_id, name)
    }

    fn insert(&self, scope: MakeScope, name: &str, description: Option<&str>) -> Result<Model> {
        self.0.create_model(
            scope.industry_id,
            scope.asset_class_id,
            scope.make_id,
            name,
            description,
        )
    }
}
