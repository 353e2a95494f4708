// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Profile source backed by Graph `/me` (or `/users/{upn}` in application mode).

use async_trait::async_trait;
use serde::Deserialize;

use super::graph::{GraphClient, GraphPrincipal, GraphRequest};
use crate::domain::error::GatewayError;
use crate::domain::identity::{Profile, ProfileSource};

const PROFILE_SELECT: &str = "id,displayName,givenName,surname,mail,userPrincipalName,jobTitle,department";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    surname: Option<String>,
    #[serde(default)]
    mail: Option<String>,
    #[serde(default)]
    user_principal_name: Option<String>,
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    department: Option<String>,
}

impl GraphUser {
    fn into_profile(self) -> Result<Profile, GatewayError> {
        let email = self
            .mail
            .filter(|m| !m.trim().is_empty())
            .or(self.user_principal_name)
            .ok_or_else(|| GatewayError::InvalidResponse("Profile has no mail or userPrincipalName".into()))?;

        Ok(Profile {
            id: self.id,
            display_name: self.display_name.unwrap_or_else(|| email.clone()),
            given_name: self.given_name,
            surname: self.surname,
            email,
            job_title: self.job_title,
            department: self.department,
        })
    }
}

pub struct GraphProfileSource {
    graph: GraphClient,
    principal: GraphPrincipal,
}

impl GraphProfileSource {
    pub fn new(graph: GraphClient, principal: GraphPrincipal) -> Self {
        Self { graph, principal }
    }
}

#[async_trait]
impl ProfileSource for GraphProfileSource {
    async fn fetch_profile(&self) -> Result<Profile, GatewayError> {
        let request = GraphRequest::get(self.principal.path_prefix()).query("$select", PROFILE_SELECT);
        let user: GraphUser = self.graph.call_json(request).await?;
        user.into_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_falls_back_to_upn() {
        let user: GraphUser = serde_json::from_str(
            r#"{"id":"1","displayName":"Ana López","mail":null,"userPrincipalName":"ana@uv.mx"}"#,
        )
        .unwrap();
        let profile = user.into_profile().unwrap();
        assert_eq!(profile.email, "ana@uv.mx");
        assert_eq!(profile.initials(), "AL");
    }

    #[test]
    fn test_profile_without_address_is_invalid() {
        let user: GraphUser = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
        assert!(user.into_profile().is_err());
    }
}
