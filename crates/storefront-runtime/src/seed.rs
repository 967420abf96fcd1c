//! Catalog seeding from a JSON file (`SF_CATALOG_SEED`).
//!
//! The file holds an array of product objects:
//!
//! ```json
//! [{ "name": "Mug", "description": "Stoneware", "price": "12.50" }]
//! ```
//!
//! Seeding only runs against an empty catalog, so restarts never duplicate
//! products.

use crate::error::{RuntimeError, RuntimeResult};
use sf_05_catalog::{CatalogApi, RawProductInput};
use std::path::Path;

pub const ENV_CATALOG_SEED: &str = "SF_CATALOG_SEED";

/// Create every product in `path`. Returns the number created.
pub fn seed_catalog(catalog: &dyn CatalogApi, path: &Path) -> RuntimeResult<usize> {
    if catalog.total_products()? > 0 {
        tracing::info!("[runtime] catalog not empty, seed skipped");
        return Ok(0);
    }

    let raw = std::fs::read_to_string(path).map_err(|source| RuntimeError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<RawProductInput> =
        serde_json::from_str(&raw).map_err(|source| RuntimeError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;

    for (index, entry) in entries.iter().enumerate() {
        catalog
            .create_product(entry)
            .map_err(|source| RuntimeError::Seed { index, source })?;
    }

    tracing::info!(
        path = %path.display(),
        products = entries.len(),
        "[runtime] catalog seeded"
    );
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_05_catalog::{CatalogService, KvProductRepository};
    use shared_types::{InMemoryKVStore, ManualTimeSource};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn catalog() -> CatalogService {
        CatalogService::new(
            Arc::new(KvProductRepository::new(Arc::new(InMemoryKVStore::new()))),
            Arc::new(ManualTimeSource::new(1_000)),
        )
    }

    fn seed_file(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("seed.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_seed_creates_products_once() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(
            &dir,
            r#"[
                { "name": "Mug", "description": "Stoneware", "price": "12.50" },
                { "name": "Poster", "price": 8 }
            ]"#,
        );
        let catalog = catalog();

        assert_eq!(seed_catalog(&catalog, &path).unwrap(), 2);
        assert_eq!(catalog.total_products().unwrap(), 2);

        assert_eq!(seed_catalog(&catalog, &path).unwrap(), 0);
        assert_eq!(catalog.total_products().unwrap(), 2);
    }

    #[test]
    fn test_invalid_entry_names_its_index() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(
            &dir,
            r#"[{ "name": "Mug", "price": "1.00" }, { "name": "", "price": "-3" }]"#,
        );
        match seed_catalog(&catalog(), &path) {
            Err(RuntimeError::Seed { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected seed error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = seed_file(&dir, "{ not json");
        assert!(matches!(
            seed_catalog(&catalog(), &path),
            Err(RuntimeError::ParseFile { .. })
        ));
    }
}
