//! Application package inspection for qmobile
//!
//! Reads the metadata an upload needs from Android APKs and iOS IPAs:
//! identifiers, versions, the launcher icon and, for iOS, the embedded
//! provisioning profile.
//!
//! ## Usage
//!
//! ```ignore
//! use qmobile_package::PackageInspector;
//!
//! let metadata = PackageInspector::new().parse(Path::new("app.ipa"))?;
//! println!("{} {}", metadata.identifier, metadata.release_version);
//! ```

mod apk;
mod archive;
mod ipa;

pub mod axml;
pub mod error;
pub mod icon;
pub mod inspector;
pub mod provision;
pub mod types;

pub use error::{PackageError, Result};
pub use inspector::PackageInspector;
pub use types::{AppIcon, DeviceType, PackageMetadata, ProvisioningProfile, ReleaseType};
