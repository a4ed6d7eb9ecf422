//! Inspect command - show package metadata without uploading

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use qmobile_core::WorkflowError;
use qmobile_package::{PackageInspector, PackageMetadata};

use crate::cli::{output, Cli, OutputFormat};

/// Inspect arguments
#[derive(Debug, Args)]
pub struct InspectCommand {
    /// Path to the IPA or APK
    pub file: PathBuf,

    /// Keep Apple CgBI icons as they are
    #[arg(long)]
    pub no_icon_repair: bool,
}

impl InspectCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(file = %self.file.display(), "executing inspect command");

        let mut inspector = PackageInspector::new();
        if self.no_icon_repair {
            inspector = inspector.without_icon_repair();
        }
        let metadata = inspector.parse(&self.file).map_err(WorkflowError::from)?;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metadata)?),
            OutputFormat::Text if !cli.quiet => {
                println!("{}", output::table(&self.file.display().to_string(), &rows(&metadata)));
            }
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

fn rows(metadata: &PackageMetadata) -> Vec<(String, String)> {
    let mut rows = vec![
        ("name", metadata.name.clone()),
        ("device_type", metadata.device_type.to_string()),
        ("identifier", metadata.identifier.clone()),
        ("release_version", metadata.release_version.clone()),
        ("build_version", metadata.build_version.clone()),
        ("os", metadata.os.clone()),
        ("size", metadata.size.to_string()),
    ];

    if let Some(min) = &metadata.min_os_version {
        rows.push(("min_os_version", min.clone()));
    }
    if let Some(release_type) = metadata.release_type {
        rows.push(("release_type", release_type.to_string()));
    }
    if let Some(profile) = &metadata.provisioning_profile {
        if let Some(name) = &profile.name {
            rows.push(("profile_name", name.clone()));
        }
        if let Some(expired_at) = profile.expired_at {
            rows.push(("profile_expired_at", expired_at.to_rfc3339()));
        }
        rows.push(("devices", profile.devices.len().to_string()));
    }
    if let Some(icon) = &metadata.icon {
        rows.push(("icon", icon.file_name.clone()));
    }

    rows.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use qmobile_package::{AppIcon, DeviceType};

    fn android() -> PackageMetadata {
        PackageMetadata {
            name: "Example".to_string(),
            device_type: DeviceType::Android,
            identifier: "com.example.app".to_string(),
            release_version: "1.2.0".to_string(),
            build_version: "12".to_string(),
            os: "Android".to_string(),
            min_os_version: Some("21".to_string()),
            release_type: None,
            provisioning_profile: None,
            icon: Some(AppIcon {
                file_name: "ic_launcher.png".to_string(),
                data: Vec::new(),
            }),
            size: 2048,
        }
    }

    #[test]
    fn test_rows() {
        let rows = rows(&android());
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys[0], "name");
        assert!(keys.contains(&"min_os_version"));
        assert!(!keys.contains(&"profile_name"));
        assert_eq!(rows.last().unwrap(), &("icon".to_string(), "ic_launcher.png".to_string()));
    }

    #[test]
    fn test_missing_file_is_package_error() {
        let cli = Cli::try_parse_from(["qmobile", "inspect", "/nonexistent/app.apk"]).unwrap();
        let crate::cli::Commands::Inspect(cmd) = &cli.command else {
            panic!("expected inspect command");
        };

        let err = cmd.execute(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WorkflowError>(),
            Some(WorkflowError::Package(_))
        ));
    }
}
