//! Package metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target device family of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// iPhone / iPad application (IPA)
    #[serde(rename = "iOS")]
    Ios,
    /// Android application (APK)
    Android,
}

impl DeviceType {
    /// Wire name sent to the distribution service
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ios => "iOS",
            DeviceType::Android => "Android",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an iOS build was exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseType {
    /// Development-signed build (get-task-allow)
    Debug,
    /// Ad hoc build restricted to registered devices
    AdHoc,
    /// Enterprise (in-house) build
    Enterprise,
    /// App Store build
    AppStore,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Debug => "Debug",
            ReleaseType::AdHoc => "AdHoc",
            ReleaseType::Enterprise => "Enterprise",
            ReleaseType::AppStore => "AppStore",
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded provisioning profile details (iOS only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningProfile {
    /// Profile name
    pub name: Option<String>,

    /// Team the profile belongs to
    pub team_name: Option<String>,

    /// Profile creation date
    pub created_at: Option<DateTime<Utc>>,

    /// Profile expiration date
    pub expired_at: Option<DateTime<Utc>>,

    /// Registered device UDIDs
    pub devices: Vec<String>,

    /// Whether the profile covers every device (enterprise)
    pub provisions_all_devices: bool,

    /// Whether the debugger may attach (development profiles)
    pub get_task_allow: bool,
}

impl ProvisioningProfile {
    /// Release type implied by this profile alone
    pub fn release_type(&self) -> ReleaseType {
        if self.get_task_allow {
            ReleaseType::Debug
        } else if !self.devices.is_empty() {
            ReleaseType::AdHoc
        } else {
            ReleaseType::Enterprise
        }
    }
}

/// Application icon extracted from a package
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIcon {
    /// Base file name of the icon inside the package
    pub file_name: String,

    /// PNG bytes
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl std::fmt::Debug for AppIcon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppIcon")
            .field("file_name", &self.file_name)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Metadata extracted from an APK or IPA
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Display name of the app
    pub name: String,

    /// Device family
    pub device_type: DeviceType,

    /// Bundle identifier or Android package name
    pub identifier: String,

    /// User-facing version (CFBundleShortVersionString / versionName)
    pub release_version: String,

    /// Build number (CFBundleVersion / versionCode)
    pub build_version: String,

    /// Operating system name
    pub os: String,

    /// Minimum OS or SDK version
    pub min_os_version: Option<String>,

    /// Export type (iOS only)
    pub release_type: Option<ReleaseType>,

    /// Embedded provisioning profile (iOS only, when non-empty)
    pub provisioning_profile: Option<ProvisioningProfile>,

    /// Largest app icon, if one could be located
    pub icon: Option<AppIcon>,

    /// Package size in bytes
    pub size: u64,
}

impl PackageMetadata {
    pub fn is_ios(&self) -> bool {
        self.device_type == DeviceType::Ios
    }

    pub fn is_android(&self) -> bool {
        self.device_type == DeviceType::Android
    }

    /// Registered devices from the provisioning profile
    pub fn devices(&self) -> Option<&[String]> {
        self.provisioning_profile
            .as_ref()
            .map(|p| p.devices.as_slice())
            .filter(|d| !d.is_empty())
    }
}
