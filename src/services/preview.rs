use crate::services::error::{ServiceError, ServiceResult};
use crate::services::storage::{ObjectData, StageStore};
use crate::utils::validation::file_extension;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

/// Rendered directly by an image viewer. PDFs share this branch.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".img", ".webp", ".png", ".gif", ".pdf"];
pub const AUDIO_EXTENSIONS: &[&str] = &[".wav", ".mp3", ".ogg", ".flac", ".m4a"];
/// Parsed as tab-separated text.
pub const PREVIEWABLE_EXTENSIONS: &[&str] = &[".csv", ".txt", ".tsv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    Image,
    Audio,
    Tabular,
    Unsupported,
}

/// Branch selection by extension. Each extension set is its own branch;
/// anything outside all three is never previewed.
pub fn preview_kind(key: &str) -> PreviewKind {
    let Some(ext) = file_extension(key) else {
        return PreviewKind::Unsupported;
    };
    let ext = ext.as_str();

    if IMAGE_EXTENSIONS.contains(&ext) {
        PreviewKind::Image
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        PreviewKind::Audio
    } else if PREVIEWABLE_EXTENSIONS.contains(&ext) {
        PreviewKind::Tabular
    } else {
        PreviewKind::Unsupported
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub columns: usize,
    pub total_rows: usize,
    pub truncated: bool,
    pub encoding: TextEncoding,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    Image { content_type: String, size: u64 },
    Audio { content_type: String, size: u64 },
    Table { table: Table },
    Unsupported { extension: Option<String> },
}

/// UTF-8 first, Latin-1 as the single fallback.
pub fn decode_text(bytes: &[u8]) -> Result<(String, TextEncoding), String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let (text, encoding) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (
            bytes.iter().map(|&b| b as char).collect::<String>(),
            TextEncoding::Latin1,
        ),
    };

    if let Some(c) = text
        .chars()
        .find(|c| c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(format!(
            "binary content (control character U+{:04X}) cannot be read as {:?} text",
            c as u32, encoding
        ));
    }

    Ok((text, encoding))
}

/// Every non-empty line is a row; cells are split on tabs. No header row is inferred.
pub fn parse_tabular(bytes: &[u8], row_limit: usize) -> Result<Table, String> {
    let (text, encoding) = decode_text(bytes)?;

    let mut rows = Vec::new();
    let mut total_rows = 0;
    let mut columns = 0;

    for line in text.lines().filter(|line| !line.is_empty()) {
        let cells: Vec<String> = line.split('\t').map(str::to_string).collect();
        columns = columns.max(cells.len());
        total_rows += 1;
        if rows.len() < row_limit {
            rows.push(cells);
        }
    }

    if total_rows == 0 {
        return Err("no columns to parse from file".to_string());
    }

    Ok(Table {
        truncated: total_rows > rows.len(),
        rows,
        columns,
        total_rows,
        encoding,
    })
}

pub struct PreviewService {
    store: Arc<dyn StageStore>,
    row_limit: usize,
}

impl PreviewService {
    pub fn new(store: Arc<dyn StageStore>, row_limit: usize) -> Self {
        Self { store, row_limit }
    }

    pub async fn read_object(&self, stage: &str, key: &str) -> ServiceResult<ObjectData> {
        match self.store.get_object(stage, key).await {
            Ok(Some(object)) => Ok(object),
            Ok(None) => Err(ServiceError::ObjectNotFound {
                stage: stage.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(ServiceError::ReadFailed {
                stage: stage.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub async fn preview(&self, stage: &str, key: &str) -> ServiceResult<Preview> {
        let kind = preview_kind(key);
        if kind == PreviewKind::Unsupported {
            return Ok(Preview::Unsupported {
                extension: file_extension(key),
            });
        }

        let object = self.read_object(stage, key).await?;
        let size = object.bytes.len() as u64;
        let content_type = object
            .content_type
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        match kind {
            PreviewKind::Image => Ok(Preview::Image { content_type, size }),
            PreviewKind::Audio => Ok(Preview::Audio { content_type, size }),
            _ => {
                let table = parse_tabular(&object.bytes, self.row_limit).map_err(|reason| {
                    warn!("Error reading '{}' from @{}: {}", key, stage, reason);
                    ServiceError::DecodeFailed {
                        key: key.to_string(),
                        reason,
                    }
                })?;
                Ok(Preview::Table { table })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_kind_dispatch() {
        assert_eq!(preview_kind("cat.jpg"), PreviewKind::Image);
        assert_eq!(preview_kind("scan.PDF"), PreviewKind::Image);
        assert_eq!(preview_kind("disk.img"), PreviewKind::Image);
        assert_eq!(preview_kind("call.wav"), PreviewKind::Audio);
        assert_eq!(preview_kind("rows.csv"), PreviewKind::Tabular);
        assert_eq!(preview_kind("notes.txt"), PreviewKind::Tabular);
        assert_eq!(preview_kind("setup.exe"), PreviewKind::Unsupported);
        assert_eq!(preview_kind("Makefile"), PreviewKind::Unsupported);
    }

    #[test]
    fn test_parse_tab_separated() {
        let table = parse_tabular(b"a\tb\nc\td", 20).unwrap();
        assert_eq!(table.total_rows, 2);
        assert_eq!(table.columns, 2);
        assert_eq!(table.rows, vec![vec!["a", "b"], vec!["c", "d"]]);
        assert!(!table.truncated);
        assert_eq!(table.encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_parse_respects_row_limit() {
        let table = parse_tabular(b"1\n2\n3\n4\n5\n", 3).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.total_rows, 5);
        assert!(table.truncated);
    }

    #[test]
    fn test_latin1_fallback() {
        // "café\tprix" encoded as ISO-8859-1
        let table = parse_tabular(b"caf\xE9\tprix\r\n", 20).unwrap();
        assert_eq!(table.encoding, TextEncoding::Latin1);
        assert_eq!(table.rows[0][0], "café");
    }

    #[test]
    fn test_bom_is_stripped() {
        let table = parse_tabular(b"\xEF\xBB\xBFid\tname", 20).unwrap();
        assert_eq!(table.rows[0][0], "id");
    }

    #[test]
    fn test_binary_content_is_rejected() {
        assert!(parse_tabular(b"MZ\x90\x00\x03\x00", 20).is_err());
        assert!(parse_tabular(b"", 20).is_err());
    }
}
