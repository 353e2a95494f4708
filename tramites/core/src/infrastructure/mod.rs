// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure Layer
//!
//! Adapters implementing the domain ports: Microsoft Graph (list, drive,
//! mail, calendar, profile), the automation webhook, PDF letters, HTML
//! templates and CSV export.

pub mod calendar;
pub mod csv_export;
pub mod graph;
pub mod mail;
pub mod onedrive;
pub mod pdf;
pub mod profile;
pub mod sharepoint;
pub mod templates;
pub mod webhook;
