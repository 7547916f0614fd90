//! JSON export for pipeline results.

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Export any pipeline result to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json<T: Serialize>(value: &T, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    log::info!("Result saved: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisResult, Category, Issue, Rating, Severity};
    use tempfile::tempdir;

    #[test]
    fn test_export_to_json() {
        let result = AnalysisResult {
            rating: Rating::NeedsImprovement,
            issues: vec![Issue {
                category: Category::Penetration,
                severity: Severity::Major,
                message: "Penetration is 1 below the 18200 target (18199)".to_string(),
                recommendation: "Add penetration".to_string(),
                current_value: Some("18199".to_string()),
                target_value: Some("18200".to_string()),
            }],
            summary: "Parse Rating: Needs Improvement".to_string(),
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.json");

        export_to_json(&result, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"rating\": \"needs-improvement\""));
        assert!(content.contains("\"category\": \"penetration\""));
        assert!(content.contains("\"currentValue\": \"18199\""));
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let result = serde_json::json!({"ok": true});
        let path = Path::new("/nonexistent/dir/out.json");
        assert!(export_to_json(&result, path).is_err());
    }
}
