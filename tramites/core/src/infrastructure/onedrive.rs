// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! OneDrive document store.
//!
//! Uploads generated documents to the principal's drive with a single PUT to
//! `.../drive/root:/<path>:/content` and returns the file's `webUrl`.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use super::graph::{GraphClient, GraphPrincipal, GraphRequest};
use crate::domain::error::GatewayError;
use crate::domain::storage::{DocumentPath, DocumentStore, StoredDocument};

/// Characters escaped inside a drive path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Deserialize)]
struct DriveItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "webUrl")]
    web_url: String,
}

pub struct OneDriveStore {
    graph: GraphClient,
    principal: GraphPrincipal,
    content_type: &'static str,
}

impl OneDriveStore {
    pub fn new(graph: GraphClient, principal: GraphPrincipal) -> Self {
        Self {
            graph,
            principal,
            content_type: "application/pdf",
        }
    }

    pub fn upload_path(&self, path: &DocumentPath) -> String {
        let encoded = path
            .to_drive_path()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/drive/root:/{}:/content", self.principal.path_prefix(), encoded)
    }
}

#[async_trait]
impl DocumentStore for OneDriveStore {
    async fn upload(&self, path: &DocumentPath, bytes: Vec<u8>) -> Result<StoredDocument, GatewayError> {
        if bytes.is_empty() {
            return Err(GatewayError::Rejected("El PDF está vacío".to_string()));
        }

        let size = bytes.len();
        let request = GraphRequest::new(Method::PUT, self.upload_path(path)).bytes(bytes, self.content_type);
        let item: DriveItem = self.graph.call_json(request).await?;

        info!(
            path = %path.to_drive_path(),
            size_kb = size / 1024,
            url = %item.web_url,
            "Uploaded document"
        );

        Ok(StoredDocument {
            web_url: item.web_url,
            item_id: item.id,
        })
    }
}
