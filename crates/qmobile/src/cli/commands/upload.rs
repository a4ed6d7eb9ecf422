//! Upload command - send a package to qmobile

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use qmobile_client::{HostType, QmobileClient};
use qmobile_core::workflow::parse_custom_data;
use qmobile_core::{
    resolve_config, Environment, ProcessEnv, UploadContext, UploadOptions, UploadWorkflow,
    WorkflowError,
};
use qmobile_package::PackageInspector;

use crate::cli::{output, Cli, OutputFormat};

/// Upload arguments
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// API key
    #[arg(long, env = "QMOBILE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the IPA or APK (discovered from build outputs when omitted)
    #[arg(long, env = "QMOBILE_FILE")]
    pub file: Option<PathBuf>,

    /// App name, overrides the one read from the package
    #[arg(long, env = "QMOBILE_APP_NAME")]
    pub app_name: Option<String>,

    /// URL slug
    #[arg(long, env = "QMOBILE_SLUG")]
    pub slug: Option<String>,

    /// Changelog [default: $CICL_CHANGELOG]
    #[arg(long, env = "QMOBILE_CHANGELOG")]
    pub changelog: Option<String>,

    /// Upload channel
    #[arg(long, env = "QMOBILE_CHANNEL", default_value = qmobile_core::config::DEFAULT_CHANNEL)]
    pub channel: String,

    /// Git branch [default: $CICL_BRANCH]
    #[arg(long, env = "QMOBILE_GIT_BRANCH")]
    pub branch: Option<String>,

    /// Git commit [default: $CICL_COMMIT]
    #[arg(long, env = "QMOBILE_GIT_COMMIT")]
    pub commit: Option<String>,

    /// CI project URL [default: $CICL_PROJECT_URL]
    #[arg(long, env = "QMOBILE_CI_URL")]
    pub ci_url: Option<String>,

    /// Configuration file (searched for when omitted)
    #[arg(long, env = "QMOBILE_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Which host to upload to: external or internal
    #[arg(long, env = "QMOBILE_HOST_TYPE", default_value = "external")]
    pub host_type: HostType,

    /// API version [default: v2]
    #[arg(long, env = "QMOBILE_API_VERSION")]
    pub api_version: Option<String>,

    /// Upload timeout in seconds [default: 600]
    #[arg(long, env = "QMOBILE_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Extra form fields as a JSON object
    #[arg(long, env = "QMOBILE_CUSTOM_DATA")]
    pub custom_data: Option<String>,

    /// Keep Apple CgBI icons as they are
    #[arg(long)]
    pub no_icon_repair: bool,
}

impl UploadCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(file = ?self.file, host_type = %self.host_type, "executing upload command");

        let env = ProcessEnv;
        let working_dir = std::env::current_dir()?;
        let mut options = self.options(&env, working_dir.clone())?;

        let (config, config_path) = resolve_config(options.config_path.as_deref(), &working_dir)?;
        if let Some(path) = &config_path {
            info!(path = %path.display(), "using config");
            if cli.prints_text() {
                output::info(&format!("Using config {}", path.display()));
            }
        }

        let client_options =
            config.client_options(options.api_version.as_deref(), options.timeout);
        options.api_version = Some(client_options.api_version.clone());
        options.timeout = Some(client_options.timeout);

        let client = QmobileClient::new(options.api_key.clone(), client_options)
            .map_err(WorkflowError::from)?;
        let mut workflow = UploadWorkflow::new(&client, &env);
        if self.no_icon_repair {
            workflow = workflow.with_inspector(PackageInspector::new().without_icon_repair());
        }

        let context = workflow.prepare(options)?;
        if cli.prints_text() {
            print_summary(&context);
        }

        let spinner = if cli.prints_text() {
            output::spinner("Uploading to qmobile ...")
        } else {
            indicatif::ProgressBar::hidden()
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let result = runtime.block_on(workflow.upload(&context));
        spinner.finish_and_clear();
        let report = result?;

        if cli.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if !cli.quiet {
            println!();
            if report.already_existed() {
                output::warning(&report.message);
                output::warning(&report.url);
            } else {
                output::success(&report.message);
                output::success(&report.url);
            }
        }

        Ok(())
    }

    /// Merge flags with their CI fallbacks
    fn options(&self, env: &dyn Environment, working_dir: PathBuf) -> anyhow::Result<UploadOptions> {
        let custom_data = match &self.custom_data {
            Some(raw) => parse_custom_data(raw)?,
            None => Default::default(),
        };

        Ok(UploadOptions {
            api_key: self.api_key.clone().unwrap_or_default(),
            file: self.file.clone(),
            config_path: self.config_path.clone(),
            host_type: self.host_type,
            channel: self.channel.clone(),
            branch: self.branch.clone().or_else(|| env.non_empty("CICL_BRANCH")),
            last_commit: self.commit.clone().or_else(|| env.non_empty("CICL_COMMIT")),
            ci_url: self.ci_url.clone().or_else(|| env.non_empty("CICL_PROJECT_URL")),
            changelog: self.changelog.clone().or_else(|| env.non_empty("CICL_CHANGELOG")),
            app_name: self.app_name.clone(),
            slug: self.slug.clone(),
            api_version: self.api_version.clone(),
            timeout: self.timeout,
            custom_data,
            working_dir,
        })
    }
}

fn print_summary(context: &UploadContext) {
    let rows: Vec<(String, String)> = context
        .summary()
        .into_iter()
        .map(|row| (row.key, row.value))
        .collect();

    println!();
    println!(
        "{}",
        output::table(
            &format!("Summary for qmobile {}", env!("CARGO_PKG_VERSION")),
            &rows
        )
    );
}
