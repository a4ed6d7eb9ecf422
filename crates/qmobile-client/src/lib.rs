//! Upload client for the qmobile distribution service
//!
//! Sends a package plus its form fields as one multipart POST and
//! classifies the answer into a single terminal [`Outcome`].
//!
//! ```ignore
//! use qmobile_client::{classify, ClientOptions, QmobileClient, Uploader};
//!
//! let client = QmobileClient::new(api_key, ClientOptions::default())?;
//! let response = client.upload(&request).await?;
//! let outcome = classify(&response)?;
//! ```

pub mod classify;
pub mod client;
pub mod error;
pub mod response;
pub mod types;

pub use classify::{classify, Outcome};
pub use client::{QmobileClient, Uploader};
pub use error::{ClientError, Result};
pub use response::{ResponseBody, UploadResponse};
pub use types::{
    ClientOptions, HostType, Hosts, ParamValue, QueryParams, UploadRequest, DEFAULT_API_VERSION,
    DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_PATH,
};
