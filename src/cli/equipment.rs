use super::{init_store, print_json};
use crate::equipment::EquipmentRegistry;
use crate::store::EquipmentFilter;

pub fn run_equipment_list(
    data_dir: String,
    filter: EquipmentFilter,
    page: u32,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    let (config, store) = init_store(&data_dir)?;
    let registry = EquipmentRegistry::new(store);

    let page = registry.list(&filter, page, limit.unwrap_or(config.default_page_size))?;
    print_json(&page)
}

pub fn run_equipment_stats(data_dir: String, created_by: Option<String>) -> anyhow::Result<()> {
    let (_, store) = init_store(&data_dir)?;
    let registry = EquipmentRegistry::new(store);

    print_json(&registry.stats(created_by.as_deref())?)
}
