use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum JobsCommands {
    /// List recent import jobs, newest first
    List {
        /// Maximum number of jobs to show
        #[arg(long, default_value = "20")]
        limit: i32,
    },

    /// Show a single import job
    Show {
        /// Job ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaxonomyCommands {
    /// List taxonomy entries ordered by name
    List {
        /// Taxonomy level to list
        level: TaxonomyLevel,

        /// Only entries under this industry
        #[arg(long)]
        industry_id: Option<i64>,

        /// Only entries under this asset class
        #[arg(long)]
        asset_class_id: Option<i64>,

        /// Only entries under this make
        #[arg(long)]
        make_id: Option<i64>,

        /// Case-insensitive substring match on the name
        #[arg(long)]
        search: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaxonomyLevel {
    Industries,
    AssetClasses,
    Makes,
    Models,
}

#[derive(Subcommand)]
pub enum EquipmentCommands {
    /// List equipment, newest first
    List {
        /// Only equipment attached to this project
        #[arg(long)]
        project_id: Option<String>,

        /// Only equipment created by this user
        #[arg(long)]
        created_by: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size (defaults to the configured page size, max 100)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show counts per status and summed values
    Stats {
        /// Only equipment created by this user
        #[arg(long)]
        created_by: Option<String>,
    },
}
