pub mod dispatch;
pub mod service;
pub mod status;

pub use service::{DocQaService, IngestReport};
