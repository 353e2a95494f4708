// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the tramites CLI

pub mod config;
pub mod forms;
pub mod requests;
pub mod serve;
pub mod submit;

pub use self::config::ConfigCommand;
pub use self::forms::FormsCommand;
pub use self::requests::RequestsCommand;
pub use self::serve::ServeArgs;
pub use self::submit::SubmitArgs;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use tramites_core::application::{Portal, Session};
use tramites_core::domain::config::PortalConfigManifest;

/// Portal plus an application-identity session already signed in
pub(crate) async fn application_portal(config_path: Option<PathBuf>) -> Result<(Portal, Arc<Session>)> {
    let config = PortalConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let portal = Portal::from_config(config).context("Failed to initialize portal")?;
    let session = Arc::new(portal.application_session()?);
    portal
        .sign_in(&session)
        .await
        .context("Failed to sign in with the application identity")?;

    Ok((portal, session))
}
