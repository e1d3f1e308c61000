pub const SCHEMA: &str = r#"
-- Root of the taxonomy. Names are stored trimmed and lowercased.
CREATE TABLE IF NOT EXISTS industries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS asset_classes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_id INTEGER NOT NULL REFERENCES industries(id),
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(industry_id, name),
    -- Target for composite foreign keys from makes
    UNIQUE(id, industry_id)
);

-- A make must hang off an asset class that belongs to the same industry
CREATE TABLE IF NOT EXISTS makes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_id INTEGER NOT NULL REFERENCES industries(id),
    asset_class_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(industry_id, asset_class_id, name),
    UNIQUE(id, industry_id, asset_class_id),
    FOREIGN KEY (asset_class_id, industry_id) REFERENCES asset_classes(id, industry_id)
);

CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_id INTEGER NOT NULL REFERENCES industries(id),
    asset_class_id INTEGER NOT NULL,
    make_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(industry_id, asset_class_id, make_id, name),
    UNIQUE(id, industry_id, asset_class_id, make_id),
    FOREIGN KEY (make_id, industry_id, asset_class_id)
        REFERENCES makes(id, industry_id, asset_class_id)
);

-- Equipment references the full taxonomy path and keeps a snapshot of the names
CREATE TABLE IF NOT EXISTS equipments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    industry_id INTEGER NOT NULL,
    asset_class_id INTEGER NOT NULL,
    make_id INTEGER NOT NULL,
    model_id INTEGER NOT NULL,
    industry_name TEXT NOT NULL,
    asset_class_name TEXT NOT NULL,
    make_name TEXT NOT NULL,
    model_name TEXT NOT NULL,

    -- Physical specifications
    year_of_manufacture INTEGER,
    length REAL,                 -- meters
    width REAL,                  -- meters
    height REAL,                 -- meters
    weight REAL,                 -- pounds
    special_transportation_consideration TEXT,

    -- Financial data
    value REAL,
    residual_value REAL,

    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive', 'archived')),
    metadata TEXT,               -- JSON object
    project_id TEXT,
    created_by_id TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    FOREIGN KEY (model_id, industry_id, asset_class_id, make_id)
        REFERENCES models(id, industry_id, asset_class_id, make_id)
);

-- One row per uploaded import file
CREATE TABLE IF NOT EXISTS import_jobs (
    id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    file_digest TEXT NOT NULL,
    project_id TEXT,
    user_id TEXT NOT NULL,
    skip_duplicates INTEGER NOT NULL DEFAULT 1,
    update_existing INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'queued',
    summary TEXT,                -- JSON import summary once completed
    error TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    started_at TEXT,
    finished_at TEXT
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_asset_classes_industry ON asset_classes(industry_id);
CREATE INDEX IF NOT EXISTS idx_makes_asset_class ON makes(industry_id, asset_class_id);
CREATE INDEX IF NOT EXISTS idx_models_make ON models(industry_id, asset_class_id, make_id);
CREATE INDEX IF NOT EXISTS idx_equipments_path
    ON equipments(industry_id, asset_class_id, make_id, model_id);
CREATE INDEX IF NOT EXISTS idx_equipments_project ON equipments(project_id);
CREATE INDEX IF NOT EXISTS idx_equipments_created_by ON equipments(created_by_id);
CREATE INDEX IF NOT EXISTS idx_import_jobs_created ON import_jobs(created_at);
"#;
