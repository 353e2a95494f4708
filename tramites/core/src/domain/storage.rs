// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Storage
//!
//! Port for durable document storage. Implementations live in
//! `infrastructure::onedrive`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::GatewayError;

/// Location of a document inside the principal's drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPath {
    pub base_path: String,
    pub folder: String,
    pub file_name: String,
}

impl DocumentPath {
    /// `<base_path>/<folder>/<file_name>`, with empty segments skipped
    pub fn to_drive_path(&self) -> String {
        [&self.base_path, &self.folder, &self.file_name]
            .iter()
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub web_url: String,
    pub item_id: Option<String>,
}

/// Domain interface for the document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upload bytes to the given path, replacing any existing file
    async fn upload(&self, path: &DocumentPath, bytes: Vec<u8>) -> Result<StoredDocument, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_path_joins_segments() {
        let path = DocumentPath {
            base_path: "/Tramites/".into(),
            folder: "01_Apoyo_Academico".into(),
            file_name: "AAC-20260101-101010.pdf".into(),
        };
        assert_eq!(
            path.to_drive_path(),
            "Tramites/01_Apoyo_Academico/AAC-20260101-101010.pdf"
        );

        let flat = DocumentPath {
            base_path: String::new(),
            folder: "Otros".into(),
            file_name: "x.pdf".into(),
        };
        assert_eq!(flat.to_drive_path(), "Otros/x.pdf");
    }
}
