//! Level catalog loading with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::grid::Level;
use crate::core::invariants::validate_catalog;

const CATALOG_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/level_catalog/v1.schema.json"
));
const BUILTIN_CATALOG: &str = include_str!("levels.json");

#[derive(Debug, Deserialize)]
struct CatalogFile {
    levels: Vec<Level>,
}

/// Ordered set of validated levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    levels: Vec<Level>,
}

impl Catalog {
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, id: u32) -> Option<&Level> {
        self.levels.iter().find(|level| level.id == id)
    }

    /// Level following `id` in catalog order, if any.
    pub fn next_after(&self, id: u32) -> Option<&Level> {
        let index = self.levels.iter().position(|level| level.id == id)?;
        self.levels.get(index + 1)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// The twenty levels shipped with the game.
pub fn builtin_catalog() -> Result<Catalog> {
    parse_catalog(BUILTIN_CATALOG, "built-in catalog")
}

/// Load and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read catalog {}", path.display()))?;
    parse_catalog(&contents, &path.display().to_string())
}

/// Load `path` if given, otherwise the built-in catalog.
pub fn resolve_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => load_catalog(path),
        None => builtin_catalog(),
    }
}

/// Parse catalog JSON, rejecting malformed levels up front.
pub fn parse_catalog(raw: &str, origin: &str) -> Result<Catalog> {
    let value: Value = serde_json::from_str(raw).with_context(|| format!("parse {}", origin))?;
    validate_schema(&value).with_context(|| format!("validate {}", origin))?;
    let file: CatalogFile =
        serde_json::from_value(value).with_context(|| format!("deserialize {}", origin))?;
    let errors = validate_catalog(&file.levels);
    if !errors.is_empty() {
        return Err(anyhow!(
            "{}: level invariants failed: {}",
            origin,
            errors.join("; ")
        ));
    }
    debug!(origin, levels = file.levels.len(), "catalog loaded");
    Ok(Catalog {
        levels: file.levels,
    })
}

fn validate_schema(catalog: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CATALOG_SCHEMA).context("parse catalog schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(catalog) {
        let messages = compiled
            .iter_errors(catalog)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "catalog schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, Direction, InstructionKind};

    #[test]
    fn builtin_catalog_loads_all_levels() {
        let catalog = builtin_catalog().expect("catalog");
        assert_eq!(catalog.len(), 20);

        let first = catalog.get(1).expect("level 1");
        assert_eq!(first.grid_size, 5);
        assert_eq!(first.start, Cell::new(2, 4));
        assert_eq!(first.target, Cell::new(2, 2));
        assert_eq!(first.direction, Direction::Up);
        assert_eq!(first.commands, vec![InstructionKind::Forward]);
        assert_eq!(first.optimal_moves, 2);
    }

    #[test]
    fn next_after_follows_catalog_order() {
        let catalog = builtin_catalog().expect("catalog");
        assert_eq!(catalog.next_after(1).map(|level| level.id), Some(2));
        assert!(catalog.next_after(20).is_none());
        assert!(catalog.next_after(99).is_none());
    }

    #[test]
    fn schema_rejects_unknown_command() {
        let raw = r#"{"levels":[{"id":1,"name":"x","gridSize":3,
            "start":{"x":0,"y":0},"target":{"x":2,"y":2},"direction":"UP",
            "commands":["condition"],"optimalMoves":1}]}"#;
        let err = parse_catalog(raw, "inline").expect_err("schema");
        assert!(format!("{:#}", err).contains("schema validation failed"));
    }

    #[test]
    fn start_on_obstacle_is_rejected_at_load() {
        let raw = r#"{"levels":[{"id":1,"name":"x","gridSize":3,
            "start":{"x":0,"y":0},"target":{"x":2,"y":2},"direction":"UP",
            "obstacles":[{"x":0,"y":0}],"commands":["forward"],"optimalMoves":1}]}"#;
        let err = parse_catalog(raw, "inline").expect_err("invariants");
        assert!(err.to_string().contains("start (0, 0) is an obstacle"));
    }

    #[test]
    fn load_catalog_reads_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("levels.json");
        fs::write(
            &path,
            r#"{"levels":[{"id":7,"name":"tiny","gridSize":2,
                "start":{"x":0,"y":1},"target":{"x":0,"y":0},"direction":"UP",
                "commands":["forward"],"optimalMoves":1}]}"#,
        )
        .expect("write");
        let catalog = resolve_catalog(Some(&path)).expect("load");
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(7).expect("level").obstacles.is_empty());
    }
}
