// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository
//!
//! Port for the external request list. Each operation is a single call to
//! the list store; the adapter owns the one-time retry on expired credentials.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request persistence interface

use async_trait::async_trait;

use super::error::GatewayError;
use super::request::{RequestRecord, StatusUpdate};

/// Newest-first page size for a submitter's own history
pub const SUBMITTER_PAGE_SIZE: usize = 100;

/// Newest-first page size for the administrator view
pub const ADMIN_PAGE_SIZE: usize = 500;

#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Create a record and return the list item id
    async fn create(&self, record: &RequestRecord) -> Result<String, GatewayError>;

    /// Records whose account email matches, newest first
    async fn list_for_submitter(&self, account_email: &str) -> Result<Vec<RequestRecord>, GatewayError>;

    /// All records, newest first
    async fn list_all(&self) -> Result<Vec<RequestRecord>, GatewayError>;

    async fn update_status(&self, item_id: &str, update: &StatusUpdate) -> Result<(), GatewayError>;
}
