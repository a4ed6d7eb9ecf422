//! Upload workflow orchestration

use qmobile_client::{classify, Outcome, Uploader};
use qmobile_package::PackageInspector;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::env::Environment;
use crate::error::{ConfigError, Result, WorkflowError};
use crate::params::build_query_params;
use crate::publish::publish;

use super::context::UploadContext;
use super::discovery::resolve_package_file;
use super::options::UploadOptions;

/// What a finished upload produced
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    pub outcome: Outcome,
    /// Install URL, also published as `QMOBILE_PUBLISH_URL`
    pub url: String,
    pub message: String,
    pub status: u16,
}

impl UploadReport {
    /// True when this exact version was already on the server
    pub fn already_existed(&self) -> bool {
        matches!(self.outcome, Outcome::AlreadyExists { .. })
    }
}

/// Inspect, enrich, upload, classify and publish
pub struct UploadWorkflow<'a> {
    uploader: &'a dyn Uploader,
    env: &'a dyn Environment,
    inspector: PackageInspector,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(uploader: &'a dyn Uploader, env: &'a dyn Environment) -> Self {
        Self {
            uploader,
            env,
            inspector: PackageInspector::default(),
        }
    }

    pub fn with_inspector(mut self, inspector: PackageInspector) -> Self {
        self.inspector = inspector;
        self
    }

    /// Validate options, inspect the package and build the form fields
    ///
    /// Nothing here touches the network.
    pub fn prepare(&self, options: UploadOptions) -> Result<UploadContext> {
        if options.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }

        let file = resolve_package_file(options.file.as_deref(), &options.working_dir, self.env)
            .filter(|f| f.is_file())
            .ok_or(ConfigError::MissingFile)?;

        let metadata = self.inspector.parse(&file)?;
        let params = build_query_params(&options, &metadata, self.env);
        let request_url = self.uploader.request_url(options.host_type)?;

        info!(
            file = %file.display(),
            identifier = %metadata.identifier,
            version = %metadata.release_version,
            url = %request_url,
            "prepared upload"
        );

        Ok(UploadContext {
            options,
            file,
            metadata,
            params,
            request_url,
        })
    }

    /// Upload a prepared context and act on the outcome
    pub async fn upload(&self, context: &UploadContext) -> Result<UploadReport> {
        let response = self.uploader.upload(&context.request()).await?;
        let status = response.status;
        let outcome = classify(&response)?;
        debug!(status, ?outcome, "upload finished");

        let url = match &outcome {
            Outcome::NewUpload { url } | Outcome::AlreadyExists { url } => url.clone(),
            Outcome::ValidationFailure { message } => {
                return Err(WorkflowError::Validation(message.clone()))
            }
            Outcome::UnclassifiedFailure { message } => {
                return Err(WorkflowError::Unclassified(message.clone()))
            }
        };

        publish(&url);
        if matches!(outcome, Outcome::AlreadyExists { .. }) {
            warn!(url = %url, "version already uploaded");
        } else {
            info!(url = %url, "upload complete");
        }

        Ok(UploadReport {
            url,
            message: outcome.message().to_string(),
            status,
            outcome,
        })
    }

    /// [`prepare`](Self::prepare) then [`upload`](Self::upload)
    pub async fn run(&self, options: UploadOptions) -> Result<UploadReport> {
        let context = self.prepare(options)?;
        self.upload(&context).await
    }
}
