use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use assetdesk::cli::{
    EquipmentCommands, ImportOptions, JobsCommands, TaxonomyCommands, run_equipment_list,
    run_equipment_stats, run_import, run_init, run_jobs_list, run_jobs_show, run_taxonomy_list,
};
use assetdesk::store::{EquipmentFilter, TaxonomyFilter};

#[derive(Parser)]
#[command(name = "assetdesk")]
#[command(about = "Equipment taxonomy and bulk CSV import", long_about = None)]
struct Cli {
    /// Data directory holding the database and assetdesk.toml
    #[arg(long, global = true, default_value = "./data", env = "ASSETDESK_DATA_DIR")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and a default config file
    Init,

    /// Import equipment from a CSV file
    Import {
        /// CSV file with Industry, Asset Class, Make and Model columns
        file: PathBuf,

        /// User the created equipment is attributed to
        #[arg(long)]
        user_id: String,

        /// Project to attach the created equipment to
        #[arg(long)]
        project_id: Option<String>,

        /// Insert rows even when identical equipment already exists
        #[arg(long)]
        keep_duplicates: bool,

        /// Request in-place updates of existing equipment (not supported, ignored)
        #[arg(long)]
        update_existing: bool,

        /// Number of import workers (overrides the config file)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Inspect import jobs
    Jobs {
        #[command(subcommand)]
        command: JobsCommands,
    },

    /// Browse the equipment taxonomy
    Taxonomy {
        #[command(subcommand)]
        command: TaxonomyCommands,
    },

    /// Browse equipment
    Equipment {
        #[command(subcommand)]
        command: EquipmentCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("assetdesk=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Init => run_init(data_dir)?,
        Commands::Import {
            file,
            user_id,
            project_id,
            keep_duplicates,
            update_existing,
            workers,
        } => {
            let options = ImportOptions {
                user_id,
                project_id,
                keep_duplicates,
                update_existing,
                workers,
            };
            run_import(data_dir, file, options).await?;
        }
        Commands::Jobs { command } => match command {
            JobsCommands::List { limit } => run_jobs_list(data_dir, limit)?,
            JobsCommands::Show { id } => run_jobs_show(data_dir, id)?,
        },
        Commands::Taxonomy { command } => match command {
            TaxonomyCommands::List {
                level,
                industry_id,
                asset_class_id,
                make_id,
                search,
            } => {
                let filter = TaxonomyFilter {
                    industry_id,
                    asset_class_id,
                    make_id,
                    search,
                };
                run_taxonomy_list(data_dir, level, filter)?;
            }
        },
        Commands::Equipment { command } => match command {
            EquipmentCommands::List {
                project_id,
                created_by,
                page,
                limit,
            } => {
                let filter = EquipmentFilter {
                    project_id,
                    created_by_id: created_by,
                };
                run_equipment_list(data_dir, filter, page, limit)?;
            }
            EquipmentCommands::Stats { created_by } => run_equipment_stats(data_dir, created_by)?,
        },
    }

    Ok(())
}
