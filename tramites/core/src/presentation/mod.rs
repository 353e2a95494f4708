// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`tramites-core`)
//!
//! HTTP surface that translates browser requests into application service
//! calls. All real work is delegated to `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | JSON API, HTML views and CSV downloads |

pub mod api;
