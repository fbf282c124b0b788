use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Where a JSON report goes: a directory receives
/// `ingestguard_<command>_<timestamp>.json`, anything else is a file path.
pub fn resolve_report_path(path: Option<&str>, command: &str, timestamp: &str) -> Result<PathBuf> {
    let base_path = path.unwrap_or(".");
    let path = Path::new(base_path);
    let filename = format!("ingestguard_{}_{}.json", command, timestamp);

    if path.exists() {
        return Ok(if path.is_dir() {
            path.join(&filename)
        } else {
            path.to_path_buf()
        });
    }
    if base_path.ends_with('/') || base_path.ends_with('\\') {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        return Ok(path.join(filename));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(path.to_path_buf())
}

pub fn write_report(path: Option<&str>, command: &str, json: &str) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let output_path = resolve_report_path(path, command, &timestamp)?;
    fs::write(&output_path, json)
        .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TS: &str = "20251214-153045";

    #[test]
    fn test_no_argument_uses_current_dir() {
        let result = resolve_report_path(None, "validate", TS).unwrap();
        assert_eq!(
            result.file_name().unwrap(),
            "ingestguard_validate_20251214-153045.json"
        );
        assert!(result.starts_with("."));
    }

    #[test]
    fn test_existing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result =
            resolve_report_path(temp_dir.path().to_str(), "ingest-products", TS).unwrap();
        assert_eq!(
            result,
            temp_dir
                .path()
                .join("ingestguard_ingest-products_20251214-153045.json")
        );
    }

    #[test]
    fn test_existing_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("existing.json");
        fs::write(&file_path, "{}").unwrap();
        let result = resolve_report_path(file_path.to_str(), "schema", TS).unwrap();
        assert_eq!(result, file_path);
    }

    #[test]
    fn test_new_dir_with_trailing_slash() {
        let temp_dir = TempDir::new().unwrap();
        let new_dir = format!("{}/reports/", temp_dir.path().display());
        let result = resolve_report_path(Some(&new_dir), "profile", TS).unwrap();
        assert!(temp_dir.path().join("reports").is_dir());
        assert_eq!(
            result.file_name().unwrap(),
            "ingestguard_profile_20251214-153045.json"
        );
    }

    #[test]
    fn test_new_file_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir/report.json");
        let result = resolve_report_path(file_path.to_str(), "validate", TS).unwrap();
        assert!(file_path.parent().unwrap().exists());
        assert_eq!(result, file_path);
    }

    #[test]
    fn test_write_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_report(temp_dir.path().to_str(), "check-cloud", "{\"ok\":true}").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "{\"ok\":true}");
    }
}
