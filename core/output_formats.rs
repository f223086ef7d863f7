use crate::error::{AppError, Result};
use crate::matcher::ExclusionTables;
use byte_unit::{Byte, UnitType};
use once_cell::sync::Lazy;
use serde::Serialize;

static DEFAULT_EXCLUSION_TABLES: Lazy<ExclusionTables> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/default_exclusions.yaml"
    ));
    serde_yml::from_str(yaml_content)
        .expect("Failed to parse embedded data/default_exclusions.yaml")
});

pub fn get_default_exclusion_tables() -> &'static ExclusionTables {
    &DEFAULT_EXCLUSION_TABLES
}

/// Formats a byte count with binary units, e.g. `1.5 KiB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let byte = Byte::from_u128(bytes as u128).unwrap_or_default();
    let adjusted = byte.get_appropriate_unit(UnitType::Binary);
    format!("{:.2}", adjusted)
}

pub fn serialize_to_json<T: Serialize>(data: &T, pretty: bool) -> Result<String, AppError> {
    if pretty {
        serde_json::to_string_pretty(data).map_err(AppError::JsonSerialize)
    } else {
        serde_json::to_string(data).map_err(AppError::JsonSerialize)
    }
}

pub fn serialize_to_yaml<T: Serialize>(data: &T) -> Result<String, AppError> {
    serde_yml::to_string(data).map_err(AppError::YamlError)
}

pub fn serialize_to_xml<T: Serialize>(data: &T, root_name: &str) -> Result<String, AppError> {
    quick_xml::se::to_string_with_root(root_name, data)
        .map_err(|e| AppError::XmlSerialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_tables_contain_the_documented_defaults() {
        let tables = get_default_exclusion_tables();
        for folder in ["node_modules", "target", ".git", "out"] {
            assert!(tables.folders.iter().any(|f| f == folder), "{folder}");
        }
        assert!(tables.files.iter().any(|f| f == "*.min.js"));
        assert!(tables.files.iter().any(|f| f == ".log"));
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(0), "0 B");
        assert!(format_size(1024 * 1024).ends_with("MiB"));
        assert!(format_size(2048).ends_with("KiB"));
    }
}
