use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SolaceError};
use crate::models::Document;

/// File extensions the loader understands.
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "json", "csv", "pdf"];

/// Column names that usually hold the main content of a CSV row.
const CONTENT_COLUMN_NAMES: &[&str] = &["content", "text", "description", "abstract", "body"];

pub fn supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Loads knowledge-base files into [`Document`]s. One file may yield
/// several documents (JSON arrays, CSV rows).
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        if !path.exists() {
            return Err(SolaceError::Ingestion(format!(
                "File not found: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" | "md" => self.load_text(path),
            "json" => self.load_json(path),
            "csv" => self.load_csv(path),
            "pdf" => self.load_pdf(path),
            other => Err(SolaceError::Ingestion(format!(
                "Unsupported file type: .{other}"
            ))),
        }
    }

    fn load_text(&self, path: &Path) -> Result<Vec<Document>> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let doc_type = if path.extension().and_then(|e| e.to_str()) == Some("md") {
            "markdown"
        } else {
            "text"
        };

        Ok(vec![Document::from_source(
            content,
            &path.display().to_string(),
            doc_type,
        )])
    }

    fn load_json(&self, path: &Path) -> Result<Vec<Document>> {
        let raw = fs::read_to_string(path)?;
        let data: Value = serde_json::from_str(&raw)?;
        let source = path.display().to_string();

        let documents = match data {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    let mut doc = Document::from_source(
                        serde_json::to_string_pretty(&item).unwrap_or_default(),
                        &source,
                        "json",
                    );
                    doc.metadata.insert("index".to_string(), idx.to_string());
                    doc
                })
                .collect(),
            other => vec![Document::from_source(
                serde_json::to_string_pretty(&other).unwrap_or_default(),
                &source,
                "json",
            )],
        };

        Ok(documents)
    }

    fn load_csv(&self, path: &Path) -> Result<Vec<Document>> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| SolaceError::Ingestion(format!("Failed to open CSV: {e}")))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| SolaceError::Ingestion(format!("Failed to read CSV headers: {e}")))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let records: Vec<csv::StringRecord> = reader
            .records()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| SolaceError::Ingestion(format!("Failed to read CSV rows: {e}")))?;

        let content_column = Self::identify_content_column(&headers, &records);
        let source = path.display().to_string();

        let documents = records
            .iter()
            .filter_map(|record| {
                let content = record.get(content_column)?.trim();
                if content.is_empty() {
                    return None;
                }

                let mut metadata = HashMap::new();
                metadata.insert("source".to_string(), source.clone());
                metadata.insert("type".to_string(), "csv".to_string());
                for (i, header) in headers.iter().enumerate() {
                    if i != content_column {
                        if let Some(value) = record.get(i).filter(|v| !v.is_empty()) {
                            metadata.insert(header.clone(), value.to_string());
                        }
                    }
                }

                Some(Document::new(content.to_string(), metadata))
            })
            .collect();

        Ok(documents)
    }

    fn load_pdf(&self, path: &Path) -> Result<Vec<Document>> {
        let content = pdf_extract::extract_text(path)
            .map_err(|e| SolaceError::Ingestion(format!("Failed to extract PDF text: {e}")))?;

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(vec![Document::from_source(
            content,
            &path.display().to_string(),
            "pdf",
        )])
    }

    /// Pick the column holding the main content: a well-known name first,
    /// otherwise the column with the longest average value.
    fn identify_content_column(headers: &[String], records: &[csv::StringRecord]) -> usize {
        for name in CONTENT_COLUMN_NAMES {
            if let Some(idx) = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
            {
                return idx;
            }
        }

        let mut best = (0usize, 0usize);
        for (idx, _) in headers.iter().enumerate() {
            let total: usize = records
                .iter()
                .filter_map(|record| record.get(idx))
                .map(str::len)
                .sum();
            if total > best.1 {
                best = (idx, total);
            }
        }
        best.0
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_supported_extensions() {
        assert!(supported_extension(Path::new("notes.txt")));
        assert!(supported_extension(Path::new("guide.PDF")));
        assert!(!supported_extension(Path::new("image.png")));
        assert!(!supported_extension(Path::new("no_extension")));
    }

    #[test]
    fn test_load_text_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "tips.txt", "Deep breathing reduces anxiety.");

        let docs = DataLoader::new().load_file(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Deep breathing reduces anxiety.");
        assert_eq!(docs[0].metadata.get("type").unwrap(), "text");
    }

    #[test]
    fn test_load_empty_text_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.txt", "   \n  ");

        let docs = DataLoader::new().load_file(&path).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_load_json_array_yields_document_per_entry() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "articles.json",
            r#"[{"title": "Sleep"}, {"title": "Stress"}]"#,
        );

        let docs = DataLoader::new().load_file(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].metadata.get("index").unwrap(), "0");
        assert!(docs[1].content.contains("Stress"));
    }

    #[test]
    fn test_load_csv_finds_content_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "articles.csv",
            "topic,content\nanxiety,Grounding exercises calm the body.\nsleep,Keep a steady schedule.\n",
        );

        let docs = DataLoader::new().load_file(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Grounding exercises calm the body.");
        assert_eq!(docs[0].metadata.get("topic").unwrap(), "anxiety");
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = DataLoader::new().load_file(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_extension_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "image.png", "binary");
        let result = DataLoader::new().load_file(&path);
        assert!(result.is_err());
    }
}
