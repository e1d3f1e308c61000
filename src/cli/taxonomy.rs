use super::{TaxonomyLevel, init_store, print_json};
use crate::store::TaxonomyFilter;
use crate::taxonomy::Taxonomy;

pub fn run_taxonomy_list(
    data_dir: String,
    level: TaxonomyLevel,
    filter: TaxonomyFilter,
) -> anyhow::Result<()> {
    let (_, store) = init_store(&data_dir)?;
    let taxonomy = Taxonomy::new(store);

    match level {
        TaxonomyLevel::Industries => print_json(&taxonomy.list_industries(&filter)?),
        TaxonomyLevel::AssetClasses => print_json(&taxonomy.list_asset_classes(&filter)?),
        TaxonomyLevel::Makes => print_json(&taxonomy.list_makes(&filter)?),
        TaxonomyLevel::Models => print_json(&taxonomy.list_models(&filter)?),
    }
}
