use serde::Serialize;

/// Build information embedded at compile time
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub git_branch: &'static str,
    pub build_timestamp: &'static str,
}

/// Helper macro to unwrap option_env with a default value
#[macro_export]
macro_rules! option_env_or {
    ($name:expr, $default:expr) => {
        match option_env!($name) {
            Some(v) => v,
            None => $default,
        }
    };
}

/// Build information of the crate the macro is expanded in.
///
/// The `TB_*` variables are emitted by that crate's build script, so this has to expand
/// in the binary crate rather than here.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::build_info::BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: $crate::option_env_or!("TB_GIT_COMMIT", "unknown"),
            git_branch: $crate::option_env_or!("TB_GIT_BRANCH", "unknown"),
            build_timestamp: $crate::option_env_or!("TB_BUILD_TIMESTAMP", "unknown"),
        }
    };
}
