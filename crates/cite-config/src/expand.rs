//! Environment variable and home directory expansion for config strings.

use crate::ConfigError;

/// Expand `${VAR}`, `${VAR:-default}`, `$VAR` and a leading `~` in `value`.
///
/// `field` names the config field for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}
