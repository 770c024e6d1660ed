use crate::db::StoreGateway;
use crate::reports::ReportEngine;
use crate::repository::{MeditationRepository, UserRepository};

/// Process-wide application state: one gateway constructed at startup, with
/// the repositories and the report engine built over it. Shared by handlers
/// through axum's `State` extractor and by the CLI directly.
#[derive(Clone)]
pub struct AppState {
    pub gateway: StoreGateway,
    pub users: UserRepository,
    pub meditations: MeditationRepository,
    pub reports: ReportEngine,
}

impl AppState {
    pub fn new(gateway: StoreGateway) -> Self {
        let users = UserRepository::new(&gateway);
        let meditations = MeditationRepository::new(&gateway);
        let reports = ReportEngine::new(&gateway);
        Self {
            gateway,
            users,
            meditations,
            reports,
        }
    }
}
