//! Startup environment-variable configuration (§6), loaded once before any
//! command runs. Required variables fail closed as [`ClientError::User`];
//! unlike the teacher's editor configuration (which falls back to sane
//! defaults when a config file is absent) these are load-bearing for every
//! command, so there is no default to fall back to.

use core_error::ClientError;

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub base_url: String,
    pub email: String,
    pub token: String,
    pub default_project: Option<String>,
    pub default_board: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = require("JIRA_BASE_URL")?;
        if !base_url.starts_with("https://") {
            return Err(ClientError::User(format!(
                "JIRA_BASE_URL must be an absolute https:// URL, got {base_url:?}"
            )));
        }
        let email = require("JIRA_EMAIL")?;
        let token = std::env::var("JIRA_API_TOKEN")
            .or_else(|_| std::env::var("ATLASSIAN_API_TOKEN"))
            .map_err(|_| {
                ClientError::User(
                    "missing JIRA_API_TOKEN (or ATLASSIAN_API_TOKEN) environment variable".into(),
                )
            })?;

        Ok(Self {
            base_url,
            email,
            token,
            default_project: std::env::var("JIRA_PROJECT").ok(),
            default_board: std::env::var("JIRA_BOARD").ok(),
        })
    }
}

fn require(name: &str) -> Result<String, ClientError> {
    std::env::var(name).map_err(|_| ClientError::User(format!("missing {name} environment variable")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_https_base_url() {
        // SAFETY: test runs single-threaded w.r.t. these vars via serial env mutation below.
        unsafe {
            std::env::set_var("JIRA_BASE_URL", "http://example.atlassian.net");
            std::env::set_var("JIRA_EMAIL", "a@b.com");
            std::env::set_var("JIRA_API_TOKEN", "tok");
        }
        let err = EnvConfig::from_env().unwrap_err();
        assert!(err.display_line().contains("https://"));
        unsafe {
            std::env::remove_var("JIRA_BASE_URL");
            std::env::remove_var("JIRA_EMAIL");
            std::env::remove_var("JIRA_API_TOKEN");
        }
    }
}
