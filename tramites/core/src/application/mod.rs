// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod admin;
pub mod calendar;
pub mod forms;
pub mod gateway_factory;
pub mod history;
pub mod portal;
pub mod session;
pub mod submission;

// Re-export use cases for convenience
pub use admin::{AdminDashboard, AdminError, AdminService, CsvFile};
pub use calendar::{CalendarError, CalendarOutcome, CalendarRequest, CalendarService};
pub use forms::{FormError, FormRenderer, FormView, PageUser};
pub use gateway_factory::{GatewayFactory, Gateways, GraphGatewayFactory};
pub use history::{HistoryError, HistoryService, RecordView};
pub use portal::Portal;
pub use session::{Session, SessionError, SessionSnapshot};
pub use submission::{SubmissionError, SubmissionOrchestrator, SubmissionReceipt, SubmissionSettings};
