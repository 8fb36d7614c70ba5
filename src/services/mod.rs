pub mod advisor;
pub mod ai;
pub mod alerts;
pub mod dispatcher;
pub mod encryption;
pub mod geocoding;
pub mod identity;
pub mod nearby;
pub mod orchestrator;
pub mod proximity;
pub mod queue;
pub mod steps;
pub mod storage;
pub mod voice_analysis;
