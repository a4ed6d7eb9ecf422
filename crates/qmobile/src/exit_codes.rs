//! Exit codes for the CLI

use qmobile_client::ClientError;
use qmobile_core::{ConfigError, WorkflowError};

/// Success
#[allow(dead_code)]
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Validation error
pub const VALIDATION_ERROR: i32 = 5;

/// Network error
pub const NETWORK_ERROR: i32 = 6;

/// Exit code for a failed command
pub fn for_error(err: &anyhow::Error) -> i32 {
    let Some(err) = err.downcast_ref::<WorkflowError>() else {
        return ERROR;
    };

    match err {
        WorkflowError::Configuration(_) => CONFIG_ERROR,
        WorkflowError::Validation(_) => VALIDATION_ERROR,
        WorkflowError::Client(ClientError::Network(_) | ClientError::Timeout { .. }) => NETWORK_ERROR,
        WorkflowError::Client(
            ClientError::MissingApiKey | ClientError::MissingFile(_) | ClientError::HostNotConfigured(_),
        ) => CONFIG_ERROR,
        WorkflowError::Client(_) | WorkflowError::Package(_) | WorkflowError::Unclassified(_) => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmobile_client::HostType;

    #[test]
    fn test_exit_codes() {
        let code = |e: WorkflowError| for_error(&anyhow::Error::new(e));

        assert_eq!(code(ConfigError::MissingApiKey.into()), CONFIG_ERROR);
        assert_eq!(code(WorkflowError::Validation("bad".into())), VALIDATION_ERROR);
        assert_eq!(
            code(ClientError::Timeout { seconds: 600 }.into()),
            NETWORK_ERROR
        );
        assert_eq!(
            code(ClientError::HostNotConfigured(HostType::Internal).into()),
            CONFIG_ERROR
        );
        assert_eq!(code(WorkflowError::Unclassified("boom".into())), ERROR);
        assert_eq!(for_error(&anyhow::anyhow!("plain")), ERROR);
    }
}
