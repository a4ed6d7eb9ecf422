//! Package inspection entry point

use std::path::Path;

use tracing::{info, warn};

use crate::archive::PackageArchive;
use crate::error::{PackageError, Result};
use crate::icon;
use crate::types::{DeviceType, PackageMetadata};
use crate::{apk, ipa};

/// Extracts [`PackageMetadata`] from APK and IPA files
#[derive(Debug, Clone)]
pub struct PackageInspector {
    /// Rewrite Apple CgBI icons into standard PNG
    pub repair_icons: bool,
}

impl Default for PackageInspector {
    fn default() -> Self {
        Self { repair_icons: true }
    }
}

impl PackageInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable CgBI icon repair
    pub fn without_icon_repair(mut self) -> Self {
        self.repair_icons = false;
        self
    }

    /// Inspect the package at `path`
    ///
    /// The platform is chosen from the file extension and then confirmed by
    /// the archive layout: an APK must carry `AndroidManifest.xml`, an IPA a
    /// `Payload/<name>.app/Info.plist`. Files with an unknown extension are
    /// identified by layout alone.
    pub fn parse(&self, path: &Path) -> Result<PackageMetadata> {
        if !path.is_file() {
            return Err(PackageError::FileNotFound(path.to_path_buf()));
        }

        let size = std::fs::metadata(path)?.len();
        let archive = PackageArchive::open(path).map_err(|e| match e {
            PackageError::Zip(_) => PackageError::UnsupportedFormat(format!(
                "{} is not a zip archive",
                path.display()
            )),
            other => other,
        })?;

        let device_type = detect(&archive, path)?;
        info!(path = %path.display(), platform = %device_type, size, "inspecting package");

        let mut metadata = match device_type {
            DeviceType::Ios => ipa::inspect(archive, path, size)?,
            DeviceType::Android => apk::inspect(archive, path, size)?,
        };

        if self.repair_icons {
            if let Some(original) = metadata.icon.take() {
                let fallback = original.clone();
                metadata.icon = Some(icon::repair_icon(original).unwrap_or_else(|e| {
                    warn!(error = %e, file = %fallback.file_name, "keeping icon as-is");
                    fallback
                }));
            }
        }

        Ok(metadata)
    }
}

fn detect(archive: &PackageArchive, path: &Path) -> Result<DeviceType> {
    let is_apk = archive.contains(apk::MANIFEST);
    let is_ipa = ipa::app_root(archive).is_some();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match (extension.as_deref(), is_apk, is_ipa) {
        (Some("apk"), true, _) => Ok(DeviceType::Android),
        (Some("ipa"), _, true) => Ok(DeviceType::Ios),
        (Some("apk"), false, _) | (Some("ipa"), _, false) => Err(PackageError::UnsupportedFormat(
            format!("{} does not have the expected package layout", path.display()),
        )),
        (_, true, false) => Ok(DeviceType::Android),
        (_, false, true) => Ok(DeviceType::Ios),
        _ => Err(PackageError::UnsupportedFormat(format!(
            "{} is neither an APK nor an IPA",
            path.display()
        ))),
    }
}
