// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tramites core
//!
//! Request portal for an academic unit: form catalog, submission workflow,
//! Microsoft Graph adapters (SharePoint list, OneDrive, mail, calendar) and the
//! HTTP API served by the `tramites` binary.
//!
//! # Architecture
//!
//! - **domain:** catalog, requests, validation, configuration, ports
//! - **application:** session, submission orchestrator, admin/history services
//! - **infrastructure:** Graph adapters, PDF, CSV and template rendering
//! - **presentation:** axum router

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
