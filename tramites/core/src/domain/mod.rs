// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Request types, records, validation rules and the ports the
//!   application layer depends on

pub mod calendar;
pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod identity;
pub mod locale;
pub mod notification;
pub mod repository;
pub mod request;
pub mod storage;
pub mod validation;
