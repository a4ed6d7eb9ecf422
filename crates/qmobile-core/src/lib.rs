//! qmobile core - upload workflow for the qmobile distribution service
//!
//! Ties package inspection, form field enrichment, the upload client and
//! response classification together, and publishes the resulting install
//! URL for later steps of the same process.

pub mod ci;
pub mod config;
pub mod env;
pub mod error;
pub mod params;
pub mod publish;
pub mod workflow;

pub use config::{resolve_config, ApiConfig, Config};
pub use env::{Environment, MapEnv, ProcessEnv};
pub use error::{ConfigError, Result, WorkflowError};
pub use params::build_query_params;
pub use publish::{publish, published_url, QMOBILE_PUBLISH_URL};
pub use workflow::{UploadContext, UploadOptions, UploadReport, UploadWorkflow};
