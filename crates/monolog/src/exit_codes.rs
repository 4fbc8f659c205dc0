//! Exit codes for the CLI

use monolog_core::MonologError;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// Dependency graph error
pub const GRAPH_ERROR: i32 = 5;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    let Some(err) = err.downcast_ref::<MonologError>() else {
        return ERROR;
    };

    match err {
        MonologError::Config(_) => CONFIG_ERROR,
        MonologError::Git(_) => GIT_ERROR,
        MonologError::Version(_) => VERSION_ERROR,
        MonologError::Graph(_) => GRAPH_ERROR,
        _ => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monolog_core::error::{ConfigError, GitError};

    #[test]
    fn test_exit_code_mapping() {
        let config: anyhow::Error = MonologError::from(ConfigError::InvalidValue {
            field: "tags.template".to_string(),
            message: "missing {version}".to_string(),
        })
        .into();
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let git: anyhow::Error =
            MonologError::from(GitError::UnknownRevision("v1".to_string())).into();
        assert_eq!(for_error(&git), GIT_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }
}
