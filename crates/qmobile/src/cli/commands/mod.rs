//! CLI commands

mod inspect;
mod upload;

pub use inspect::InspectCommand;
pub use upload::UploadCommand;
