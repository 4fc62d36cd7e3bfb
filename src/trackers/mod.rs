//! Ticket-tracker adapters.
//!
//! Each platform client authenticates against its tracker and fetches a
//! normalized graph: user/project/issue (Jira, through the forwarding
//! proxy) or user/board/list/card (Trello, direct REST). Item-detail
//! failures skip that item; top-level failures abort the fetch.

pub mod jira;
pub mod trello;

pub use jira::JiraClient;
pub use trello::TrelloClient;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum length of a Trello API key. Real keys are 32-char hex strings;
/// anything shorter is rejected before any network call.
pub const MIN_TRELLO_KEY_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerPlatform {
    Jira,
    Trello,
}

impl TrackerPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerPlatform::Jira => "jira",
            TrackerPlatform::Trello => "trello",
        }
    }
}

impl fmt::Display for TrackerPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerPlatform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jira" => Ok(TrackerPlatform::Jira),
            "trello" => Ok(TrackerPlatform::Trello),
            other => Err(Error::Validation(format!(
                "unknown tracker platform: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraCredentials {
    /// Jira site domain, e.g. `yourcompany.atlassian.net`. A leading
    /// `http(s)://` is tolerated and stripped by the proxy.
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

impl JiraCredentials {
    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty()
            || self.email.trim().is_empty()
            || self.api_token.trim().is_empty()
        {
            return Err(Error::Validation(
                "domain, email, and API token are all required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrelloCredentials {
    pub api_key: String,
    pub token: String,
}

impl TrelloCredentials {
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() || self.token.trim().is_empty() {
            return Err(Error::Validation(
                "API key and token are both required".to_string(),
            ));
        }
        if self.api_key.len() < MIN_TRELLO_KEY_LEN {
            return Err(Error::Auth(
                "invalid API key format: key is too short".to_string(),
            ));
        }
        Ok(())
    }
}

/// Map a non-success response status to an Upstream error.
pub(crate) fn ensure_success(response: &reqwest::Response, what: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(Error::upstream(status, format!("{} request failed", what)))
}
