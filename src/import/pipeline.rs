use std::sync::Arc;

use super::rows::{CsvRow, decode_payload, parse_rows};
use super::{ImportRequest, ImportSummary, MISSING_FIELDS};
use crate::equipment::{EquipmentDraft, EquipmentRegistry};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::taxonomy::{PathNames, Taxonomy};

const PROGRESS_INTERVAL: usize = 100;

enum RowOutcome {
    Inserted,
    Skipped,
}

/// Runs one import synchronously against a store.
#[derive(Clone)]
pub struct ImportPipeline {
    taxonomy: Taxonomy,
    registry: EquipmentRegistry,
    max_bytes: usize,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn Store>, max_bytes: usize) -> Self {
        Self {
            taxonomy: Taxonomy::new(Arc::clone(&store)),
            registry: EquipmentRegistry::new(store),
            max_bytes,
        }
    }

    /// Decodes the request's file and imports it.
    pub fn run(&self, request: &ImportRequest) -> Result<ImportSummary> {
        tracing::info!(
            "Starting import of {} ({} base64 bytes)",
            request.file_name,
            request.file_buffer.len()
        );

        let text = decode_payload(&request.file_buffer, self.max_bytes)?;
        self.run_csv(&text, request)
    }

    /// Imports already decoded CSV text using the options in `request`.
    ///
    /// Fails only when the text has no data rows. Every other problem is
    /// recorded against its row and the next row is processed.
    pub fn run_csv(&self, text: &str, request: &ImportRequest) -> Result<ImportSummary> {
        let rows = parse_rows(text)?;
        if rows.is_empty() {
            tracing::warn!("Import of {} has no data rows", request.file_name);
            return Err(Error::EmptyImport);
        }

        tracing::info!("Parsed {} rows from {}", rows.len(), request.file_name);

        if request.update_existing {
            tracing::warn!(
                "updateExisting is not supported, importing {} rows as new equipment",
                request.file_name
            );
        }

        let mut summary = ImportSummary {
            total: rows.len(),
            ..Default::default()
        };

        for row in &rows {
            match self.import_row(row, request) {
                Ok(RowOutcome::Inserted) => {
                    summary.processed += 1;
                    if summary.processed % PROGRESS_INTERVAL == 0 {
                        tracing::info!("Processed {} rows...", summary.processed);
                    }
                }
                Ok(RowOutcome::Skipped) => summary.skipped += 1,
                Err(message) => {
                    tracing::warn!("Error processing row {}: {}", row.row_num, message);
                    summary.record_error(row.row_num, message);
                }
            }
        }

        tracing::info!(
            "Import of {} completed: processed={} skipped={} errors={} total={}",
            request.file_name,
            summary.processed,
            summary.skipped,
            summary.errors,
            summary.total
        );

        Ok(summary)
    }

    /// Errors come back as the message to record for the row.
    fn import_row(
        &self,
        row: &CsvRow,
        request: &ImportRequest,
    ) -> std::result::Result<RowOutcome, String> {
        let names = row
            .fields
            .names()
            .ok_or_else(|| MISSING_FIELDS.to_string())?;

        self.insert_row(names, request).map_err(|e| e.to_string())
    }

    fn insert_row(&self, names: PathNames<'_>, request: &ImportRequest) -> Result<RowOutcome> {
        let path = self.taxonomy.resolve_path(names)?;

        if request.skip_duplicates && self.registry.is_duplicate(&path.key())? {
            tracing::debug!(
                "Skipping duplicate equipment {}/{}/{}/{}",
                path.industry.name,
                path.asset_class.name,
                path.make.name,
                path.model.name
            );
            return Ok(RowOutcome::Skipped);
        }

        let draft = EquipmentDraft {
            project_id: request.project_id.clone(),
            ..Default::default()
        };
        self.registry
            .insert_for_path(&path, draft, Some(request.user_id.as_str()))?;

        Ok(RowOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EquipmentFilter, SqliteStore};
    use tempfile::TempDir;

    const LIMIT: usize = 10 * 1024 * 1024;

    fn setup() -> (TempDir, Arc<dyn Store>, ImportPipeline) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        let pipeline = ImportPipeline::new(Arc::clone(&store), LIMIT);
        (temp, store, pipeline)
    }

    fn request(csv: &str) -> ImportRequest {
        ImportRequest::from_bytes("assets.csv", csv.as_bytes(), "user-1")
    }

    fn equipment_count(store: &Arc<dyn Store>) -> i64 {
        store
            .list_equipment(&EquipmentFilter::default(), 0, 1)
            .unwrap()
            .1
    }

    #[test]
    fn test_case_variants_collapse_to_one_equipment() {
        let (_temp, store, pipeline) = setup();

        let csv = "Industry,Asset Class,Make,Model\n\
                   Construction,Excavator,Volvo,A40G\n\
                   construction,excavator,volvo,a40g\n";
        let summary = pipeline.run(&request(csv)).unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                processed: 1,
                skipped: 1,
                errors: 0,
                total: 2,
                error_details: Vec::new(),
            }
        );
        assert_eq!(equipment_count(&store), 1);
    }

    #[test]
    fn test_row_errors_do_not_stop_the_batch() {
        let (_temp, store, pipeline) = setup();

        let csv = "industry,assetName,makeName,modelName\n\
                   construction,excavator,volvo,a40g\n\
                   construction,excavator,cat,320\n\
                   construction,excavator,,ec220e\n\
                   construction,loader,volvo,l90\n\
                   mining,haul truck,komatsu,930e\n";
        let summary = pipeline.run(&request(csv)).unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.errors, 1);
        assert_eq!(
            summary.error_details,
            vec!["Row 5: Missing required fields (industry, assetName, makeName, or modelName)"]
        );
        assert_eq!(equipment_count(&store), 4);
    }

    #[test]
    fn test_blank_cell_row_is_a_missing_fields_error() {
        let (_temp, store, pipeline) = setup();

        let csv = "Industry,Asset Class,Make,Model\n\
                   ,,,\n\
                   Construction,Excavator,,A40G\n";
        let summary = pipeline.run(&request(csv)).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.errors, 2);
        assert_eq!(
            summary.error_details,
            vec![
                format!("Row 2: {MISSING_FIELDS}"),
                format!("Row 3: {MISSING_FIELDS}"),
            ]
        );
        assert_eq!(equipment_count(&store), 0);
    }

    #[test]
    fn test_only_blank_cells_is_not_an_empty_import() {
        let (_temp, _store, pipeline) = setup();

        let summary = pipeline
            .run(&request("Industry,Asset Class,Make,Model\n,,,\n"))
            .unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.processed, 0);
    }

    #[test]
    fn test_keep_duplicates() {
        let (_temp, store, pipeline) = setup();

        let csv = "Industry,Asset Class,Make,Model\nConstruction,Excavator,Volvo,A40G\n";
        let mut req = request(csv);
        req.skip_duplicates = false;

        pipeline.run(&req).unwrap();
        let second = pipeline.run(&req).unwrap();

        assert_eq!(second.processed, 1);
        assert_eq!(second.skipped, 0);
        assert_eq!(equipment_count(&store), 2);
    }

    #[test]
    fn test_equipment_carries_job_attribution() {
        let (_temp, store, pipeline) = setup();

        let mut req =
            request("Industry,Asset Class,Make,Model\nConstruction,Excavator,Volvo,A40G\n");
        req.project_id = Some("project-9".to_string());
        req.update_existing = true;
        pipeline.run(&req).unwrap();

        let (items, _) = store
            .list_equipment(&EquipmentFilter::default(), 0, 10)
            .unwrap();
        assert_eq!(items[0].project_id.as_deref(), Some("project-9"));
        assert_eq!(items[0].created_by_id.as_deref(), Some("user-1"));
        assert_eq!(items[0].industry_name, "construction");
    }

    #[test]
    fn test_header_only_file_is_empty_import() {
        let (_temp, store, pipeline) = setup();

        let result = pipeline.run(&request("Industry,Asset Class,Make,Model\n"));
        match result {
            Err(e) => assert_eq!(e.to_string(), "CSV file is empty or invalid"),
            Ok(summary) => panic!("expected failure, got {summary:?}"),
        }
        assert_eq!(equipment_count(&store), 0);
    }

    #[test]
    fn test_oversized_payload_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let pipeline = ImportPipeline::new(Arc::new(store), 16);

        let result = pipeline.run(&request("Industry,Asset Class,Make,Model\nA,B,C,D\n"));
        assert!(matches!(result, Err(Error::PayloadTooLarge { limit: 16, .. })));
    }
}
