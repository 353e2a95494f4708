// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! In-memory fakes of the domain ports shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use tramites_core::application::{GatewayFactory, Gateways, Session};
use tramites_core::domain::calendar::{CalendarEvent, CalendarProvider, CreatedEvent};
use tramites_core::domain::config::PortalConfigManifest;
use tramites_core::domain::error::GatewayError;
use tramites_core::domain::identity::{AccessPolicy, Profile, ProfileSource, TokenProvider};
use tramites_core::domain::notification::{AutomationEvent, AutomationHook, EmailMessage, Mailer};
use tramites_core::domain::repository::RequestRepository;
use tramites_core::domain::request::{FieldMap, RequestRecord, StatusUpdate};
use tramites_core::domain::storage::{DocumentPath, DocumentStore, StoredDocument};

pub fn profile(email: &str) -> Profile {
    Profile {
        id: "user-1".into(),
        display_name: "Ana López".into(),
        given_name: Some("Ana".into()),
        surname: Some("López".into()),
        email: email.into(),
        job_title: None,
        department: None,
    }
}

pub fn config() -> PortalConfigManifest {
    let mut config = PortalConfigManifest::default();
    config.spec.admins = vec!["admin@uv.mx".into()];
    config
}

pub struct FakeProfiles(pub Profile);

#[async_trait]
impl ProfileSource for FakeProfiles {
    async fn fetch_profile(&self) -> Result<Profile, GatewayError> {
        Ok(self.0.clone())
    }
}

pub async fn signed_in(email: &str) -> Arc<Session> {
    let session = Arc::new(Session::delegated("token"));
    let policy = AccessPolicy {
        restrict_domain: true,
        allowed_domain: "uv.mx".into(),
        admins: vec!["admin@uv.mx".into()],
    };
    session
        .sign_in(&FakeProfiles(profile(email)), &policy)
        .await
        .expect("sign-in succeeds");
    session
}

/// Pauses inside `upload` until released
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeStore {
    pub uploads: AtomicUsize,
    pub paths: Mutex<Vec<String>>,
    pub fail: bool,
    pub gate: Option<Arc<Gate>>,
}

impl FakeStore {
    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn upload(&self, path: &DocumentPath, bytes: Vec<u8>) -> Result<StoredDocument, GatewayError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().push(path.to_drive_path());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.fail {
            return Err(GatewayError::Api {
                status: 500,
                message: "Error 500".into(),
            });
        }
        assert!(!bytes.is_empty());
        Ok(StoredDocument {
            web_url: format!("https://drive.example/{}", path.file_name),
            item_id: Some("drive-1".into()),
        })
    }
}

#[derive(Default)]
pub struct FakeRepository {
    pub records: Mutex<Vec<RequestRecord>>,
    pub creates: AtomicUsize,
    pub updates: Mutex<Vec<(String, StatusUpdate)>>,
}

impl FakeRepository {
    pub fn with_records(records: Vec<RequestRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestRepository for FakeRepository {
    async fn create(&self, record: &RequestRecord) -> Result<String, GatewayError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        let mut stored = record.clone();
        stored.item_id = Some(n.to_string());
        self.records.lock().push(stored);
        Ok(n.to_string())
    }

    async fn list_for_submitter(&self, account_email: &str) -> Result<Vec<RequestRecord>, GatewayError> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.account_email == account_email)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<RequestRecord>, GatewayError> {
        Ok(self.records.lock().clone())
    }

    async fn update_status(&self, item_id: &str, update: &StatusUpdate) -> Result<(), GatewayError> {
        self.updates.lock().push((item_id.to_string(), update.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Network("connection refused".into()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeHook {
    pub events: Mutex<Vec<AutomationEvent>>,
    pub fail: bool,
}

#[async_trait]
impl AutomationHook for FakeHook {
    async fn notify(&self, event: &AutomationEvent) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Api {
                status: 502,
                message: "Error 502".into(),
            });
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCalendar {
    pub events: Mutex<Vec<CalendarEvent>>,
    pub fail: bool,
}

#[async_trait]
impl CalendarProvider for FakeCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<CreatedEvent, GatewayError> {
        if self.fail {
            return Err(GatewayError::Api {
                status: 403,
                message: "Access denied".into(),
            });
        }
        self.events.lock().push(event.clone());
        Ok(CreatedEvent {
            id: "evt-1".into(),
            web_link: Some("https://outlook.example/evt-1".into()),
        })
    }
}

/// Hands out the same fakes to every session; the profile follows the bearer token
pub struct FakeGateways {
    pub repository: Arc<FakeRepository>,
    pub store: Arc<FakeStore>,
    pub mailer: Arc<FakeMailer>,
    pub calendar: Arc<FakeCalendar>,
}

impl Default for FakeGateways {
    fn default() -> Self {
        Self {
            repository: Arc::new(FakeRepository::default()),
            store: Arc::new(FakeStore::default()),
            mailer: Arc::new(FakeMailer::default()),
            calendar: Arc::new(FakeCalendar::default()),
        }
    }
}

/// Profile whose email is the bearer token, so tests pick the user by token
struct TokenProfile(Arc<dyn TokenProvider>);

#[async_trait]
impl ProfileSource for TokenProfile {
    async fn fetch_profile(&self) -> Result<Profile, GatewayError> {
        let email = self.0.access_token().await?;
        Ok(profile(&email))
    }
}

impl GatewayFactory for FakeGateways {
    fn gateways(&self, tokens: Arc<dyn TokenProvider>, _mailbox: Option<&str>) -> Gateways {
        Gateways {
            profiles: Arc::new(TokenProfile(tokens)),
            repository: self.repository.clone(),
            documents: self.store.clone(),
            mailer: self.mailer.clone(),
            calendar: self.calendar.clone(),
        }
    }
}

pub fn free_form_fields(email: &str) -> FieldMap {
    [
        ("tipo_solicitante", "Académico"),
        ("nombre_completo", "Ana López"),
        ("correo", email),
        ("asunto", "Cambio de aula"),
        ("categoria", "Infraestructura"),
        ("descripcion", "Se solicita el cambio de aula para el seminario."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn academic_fields(email: &str) -> FieldMap {
    [
        ("tipo_solicitante", "Estudiante de Doctorado"),
        ("nombre_completo", "Ana López"),
        ("correo", email),
        ("matricula", "S21000001"),
        ("titulo_actividad", "Congreso Nacional de Ecología"),
        ("tipo_actividad", "Congreso"),
        ("fecha_inicio", "2026-11-10"),
        ("fecha_fin", "2026-11-12"),
        ("destino", "Monterrey, N.L., México"),
        ("monto_total", "8500.50"),
        ("desglose_gastos", "Transporte: $3000, Hospedaje: $4000, Registro: $1500.50"),
        ("justificacion", "Presentación de resultados de tesis."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
