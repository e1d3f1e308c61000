use super::{init_store, print_json};

pub fn run_jobs_list(data_dir: String, limit: i32) -> anyhow::Result<()> {
    let (_, store) = init_store(&data_dir)?;
    let jobs = store.list_import_jobs(limit.max(1))?;
    print_json(&jobs)
}

pub fn run_jobs_show(data_dir: String, id: String) -> anyhow::Result<()> {
    let (_, store) = init_store(&data_dir)?;
    let Some(job) = store.get_import_job(&id)? else {
        anyhow::bail!("Import job '{}' not found", id);
    };
    print_json(&job)
}
