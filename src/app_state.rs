use sqlx::PgPool;
use std::sync::Arc;

use crate::config::ProximityConfig;
use crate::db::reports::PgRecordStore;
use crate::services::{
    ai::{SpeechSynthesizer, TextGenerator, WorkersAiClient},
    encryption::EncryptionService,
    geocoding::Geocoder,
    identity::IdentityProvider,
    nearby::RecordStore,
    queue::ReportQueue,
    storage::R2Client,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Arc<R2Client>,
    pub encryption: Arc<EncryptionService>,
    pub queue: Arc<ReportQueue>,
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub geocoder: Arc<dyn Geocoder>,
    pub identity: Arc<dyn IdentityProvider>,
    pub records: Arc<dyn RecordStore>,
    pub proximity: ProximityConfig,
}

/// External collaborators used by the assistant and signup flows.
pub struct Collaborators {
    pub ai: WorkersAiClient,
    pub geocoder: Arc<dyn Geocoder>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        storage: R2Client,
        encryption: EncryptionService,
        queue: ReportQueue,
        collaborators: Collaborators,
        proximity: ProximityConfig,
    ) -> Self {
        let ai = Arc::new(collaborators.ai);
        Self {
            records: Arc::new(PgRecordStore::new(db.clone())),
            db,
            storage: Arc::new(storage),
            encryption: Arc::new(encryption),
            queue: Arc::new(queue),
            text: ai.clone(),
            speech: ai,
            geocoder: collaborators.geocoder,
            identity: collaborators.identity,
            proximity,
        }
    }
}
