#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod query;
pub mod retrieval;

pub use app::DocQaService;
pub use config::Config;
pub use error::{DocQaError, Result};
pub use llm::{CredentialRotator, DEGRADATION_MESSAGE, ProviderFailoverRouter};
pub use query::{QueryHandler, chat_response};
