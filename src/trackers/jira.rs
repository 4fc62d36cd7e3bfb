//! Jira adapter (issue-style tracker).
//!
//! All calls go through the forwarding proxy, which injects the Basic-auth
//! header server-side; credentials travel as query parameters. The fetch
//! sequence is identity → projects → search → per-issue detail, with detail
//! fetches running through a small ordered concurrency pool.

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::trackers::{ensure_success, JiraCredentials};
use crate::types::{IssueTrackerData, TrackerIdentity, TrackerIssue, TrackerProject};

/// JQL scoping the search to the authenticated user's issues.
const SEARCH_JQL: &str = "assignee = currentUser() ORDER BY updated DESC";
const SEARCH_MAX_RESULTS: u32 = 50;
const ISSUE_FIELDS: &str = "summary,description,status,created,updated,project,assignee";
/// Detail fetches in flight at once. Output order stays source order.
const DETAIL_CONCURRENCY: usize = 4;

pub struct JiraClient {
    http: reqwest::Client,
    proxy_base: String,
    credentials: JiraCredentials,
}

impl JiraClient {
    pub fn new(credentials: JiraCredentials, proxy_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            proxy_base: proxy_base.into(),
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/jira/{}", self.proxy_base.trim_end_matches('/'), path)
    }

    /// Credential query parameters the proxy requires on every call.
    fn credential_params(&self) -> [(&'static str, &str); 3] {
        [
            ("domain", self.credentials.domain.as_str()),
            ("email", self.credentials.email.as_str()),
            ("apiToken", self.credentials.api_token.as_str()),
        ]
    }

    /// Verify credentials against the identity endpoint.
    pub async fn connect(&self) -> Result<bool> {
        self.credentials.validate()?;
        self.fetch_identity().await?;
        log::info!("Jira connection verified for {}", self.credentials.email);
        Ok(true)
    }

    /// Fetch the full user/project/issue graph.
    ///
    /// Identity, project-list, and search failures abort; a single issue
    /// detail failing is skipped with a warning.
    pub async fn fetch_all(&self) -> Result<IssueTrackerData> {
        self.credentials.validate()?;

        let identity = self.fetch_identity().await?;
        let projects = self.fetch_projects().await?;
        let issue_refs = self.search_issues().await?;

        let details: Vec<Option<ApiIssue>> = stream::iter(issue_refs)
            .map(|issue_ref| async move {
                match self.fetch_issue_detail(&issue_ref.key).await {
                    Ok(detail) => Some(detail),
                    Err(e) => {
                        log::warn!("Skipping Jira issue {}: {}", issue_ref.key, e);
                        None
                    }
                }
            })
            .buffered(DETAIL_CONCURRENCY)
            .collect()
            .await;

        let data = assemble(identity, projects, details.into_iter().flatten());
        log::info!(
            "Fetched {} Jira issues across {} projects",
            data.issues.len(),
            data.projects.len()
        );
        Ok(data)
    }

    async fn fetch_identity(&self) -> Result<TrackerIdentity> {
        let response = self
            .http
            .get(self.endpoint("myself"))
            .query(&self.credential_params())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Auth(format!(
                "Jira identity check failed (HTTP {})",
                response.status().as_u16()
            )));
        }
        let me: ApiMyself = response.json().await?;
        Ok(TrackerIdentity {
            id: me.account_id,
            username: me.email_address,
            display_name: me.display_name,
        })
    }

    async fn fetch_projects(&self) -> Result<Vec<TrackerProject>> {
        let response = self
            .http
            .get(self.endpoint("projects"))
            .query(&self.credential_params())
            .send()
            .await?;
        ensure_success(&response, "Jira projects")?;
        let projects: Vec<ApiProject> = response.json().await?;
        Ok(projects
            .into_iter()
            .map(|p| TrackerProject {
                id: p.id,
                key: p.key,
                name: p.name,
                issues: Vec::new(),
            })
            .collect())
    }

    async fn search_issues(&self) -> Result<Vec<ApiIssueRef>> {
        let max_results = SEARCH_MAX_RESULTS.to_string();
        let response = self
            .http
            .get(self.endpoint("search"))
            .query(&self.credential_params())
            .query(&[("jql", SEARCH_JQL), ("maxResults", &max_results)])
            .send()
            .await?;
        ensure_success(&response, "Jira search")?;
        let search: ApiSearchResponse = response.json().await?;
        Ok(search.issues)
    }

    async fn fetch_issue_detail(&self, key: &str) -> Result<ApiIssue> {
        let response = self
            .http
            .get(self.endpoint(&format!("issue/{}", key)))
            .query(&self.credential_params())
            .query(&[("fields", ISSUE_FIELDS)])
            .send()
            .await?;
        ensure_success(&response, "Jira issue detail")?;
        Ok(response.json().await?)
    }
}

/// Build the graph from fetched pieces, preserving detail order and the
/// dual-membership invariant (every project-grouped issue is also in the
/// flat list).
fn assemble(
    identity: TrackerIdentity,
    mut projects: Vec<TrackerProject>,
    details: impl IntoIterator<Item = ApiIssue>,
) -> IssueTrackerData {
    let mut issues = Vec::new();
    for detail in details {
        let issue = normalize_issue(detail, &identity.id);
        if let Some(project) = projects.iter_mut().find(|p| p.key == issue.project_key) {
            project.issues.push(issue.clone());
        }
        issues.push(issue);
    }
    IssueTrackerData {
        user: identity,
        projects,
        issues,
    }
}

fn normalize_issue(detail: ApiIssue, caller_id: &str) -> TrackerIssue {
    let fields = detail.fields;
    // The search JQL already scopes to the caller, so a missing assignee
    // field still counts as assigned.
    let assigned_to_caller = fields
        .assignee
        .map(|a| a.account_id == caller_id)
        .unwrap_or(true);
    TrackerIssue {
        id: detail.id,
        key: detail.key,
        title: fields.summary,
        description: fields.description.unwrap_or_default(),
        status: fields.status.map(|s| s.name).unwrap_or_default(),
        created: fields.created,
        updated: fields.updated,
        project_key: fields.project.as_ref().map(|p| p.key.clone()).unwrap_or_default(),
        project_name: fields.project.map(|p| p.name).unwrap_or_default(),
        assigned_to_caller,
    }
}

// =============================================================================
// Wire shapes (Jira REST v2, as forwarded by the proxy)
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMyself {
    account_id: String,
    #[serde(default)]
    email_address: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiProject {
    id: String,
    key: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    issues: Vec<ApiIssueRef>,
}

#[derive(Debug, Deserialize)]
struct ApiIssueRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    id: String,
    key: String,
    #[serde(default)]
    fields: ApiIssueFields,
}

#[derive(Debug, Default, Deserialize)]
struct ApiIssueFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<ApiStatus>,
    #[serde(default)]
    created: String,
    #[serde(default)]
    updated: String,
    #[serde(default)]
    project: Option<ApiProjectRef>,
    #[serde(default)]
    assignee: Option<ApiAssignee>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiProjectRef {
    key: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAssignee {
    account_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_fixture(json: &str) -> ApiIssue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_myself_response() {
        let me: ApiMyself = serde_json::from_str(
            r#"{
                "accountId": "5b10a2844c20165700ede21g",
                "emailAddress": "dana@example.com",
                "displayName": "Dana Ito",
                "timeZone": "Asia/Taipei"
            }"#,
        )
        .unwrap();
        assert_eq!(me.account_id, "5b10a2844c20165700ede21g");
        assert_eq!(me.display_name, "Dana Ito");
    }

    #[test]
    fn test_parse_issue_detail_with_missing_fields() {
        let detail = detail_fixture(
            r#"{
                "id": "10002",
                "key": "PROJ-7",
                "fields": {
                    "summary": "Fix login redirect",
                    "description": null,
                    "status": {"name": "In Progress", "id": "3"},
                    "created": "2025-01-02T09:00:00.000+0000",
                    "updated": "2025-01-05T10:00:00.000+0000",
                    "project": {"key": "PROJ", "name": "Platform"}
                }
            }"#,
        );
        let issue = normalize_issue(detail, "caller-1");
        assert_eq!(issue.key, "PROJ-7");
        assert_eq!(issue.title, "Fix login redirect");
        assert_eq!(issue.description, "");
        assert_eq!(issue.status, "In Progress");
        assert_eq!(issue.project_key, "PROJ");
        // No assignee field: JQL scoping means it still belongs to the caller.
        assert!(issue.assigned_to_caller);
    }

    #[test]
    fn test_normalize_issue_compares_assignee_to_caller() {
        let detail = detail_fixture(
            r#"{
                "id": "1",
                "key": "PROJ-1",
                "fields": {
                    "summary": "t",
                    "status": {"name": "Done"},
                    "assignee": {"accountId": "caller-1"}
                }
            }"#,
        );
        assert!(normalize_issue(detail, "caller-1").assigned_to_caller);

        let detail = detail_fixture(
            r#"{
                "id": "2",
                "key": "PROJ-2",
                "fields": {
                    "summary": "t",
                    "status": {"name": "Done"},
                    "assignee": {"accountId": "someone-else"}
                }
            }"#,
        );
        assert!(!normalize_issue(detail, "caller-1").assigned_to_caller);
    }

    #[test]
    fn test_assemble_preserves_dual_membership() {
        let identity = TrackerIdentity {
            id: "caller-1".into(),
            username: "dana@example.com".into(),
            display_name: "Dana".into(),
        };
        let projects = vec![
            TrackerProject {
                id: "10000".into(),
                key: "PROJ".into(),
                name: "Platform".into(),
                issues: Vec::new(),
            },
            TrackerProject {
                id: "10001".into(),
                key: "OPS".into(),
                name: "Operations".into(),
                issues: Vec::new(),
            },
        ];
        let details = vec![
            detail_fixture(
                r#"{"id": "1", "key": "PROJ-1", "fields": {"summary": "a", "status": {"name": "Done"}, "project": {"key": "PROJ", "name": "Platform"}}}"#,
            ),
            detail_fixture(
                r#"{"id": "2", "key": "OPS-9", "fields": {"summary": "b", "status": {"name": "Open"}, "project": {"key": "OPS", "name": "Operations"}}}"#,
            ),
            detail_fixture(
                r#"{"id": "3", "key": "PROJ-2", "fields": {"summary": "c", "status": {"name": "Open"}, "project": {"key": "PROJ", "name": "Platform"}}}"#,
            ),
        ];

        let data = assemble(identity, projects, details);

        // Flat list keeps source order.
        let keys: Vec<&str> = data.issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-1", "OPS-9", "PROJ-2"]);

        // Every project-grouped issue also appears in the flat list.
        for project in &data.projects {
            for issue in &project.issues {
                assert!(data.issues.iter().any(|i| i.id == issue.id));
            }
        }
        assert_eq!(data.projects[0].issues.len(), 2);
        assert_eq!(data.projects[1].issues.len(), 1);
    }

    #[test]
    fn test_assemble_keeps_issue_without_matching_project() {
        let identity = TrackerIdentity {
            id: "caller-1".into(),
            username: String::new(),
            display_name: String::new(),
        };
        let details = vec![detail_fixture(
            r#"{"id": "1", "key": "GHOST-1", "fields": {"summary": "orphan", "status": {"name": "Open"}, "project": {"key": "GHOST", "name": "Gone"}}}"#,
        )];

        let data = assemble(identity, Vec::new(), details);
        assert_eq!(data.issues.len(), 1);
        assert!(data.projects.is_empty());
    }

    #[test]
    fn test_endpoint_joins_proxy_base() {
        let client = JiraClient::new(
            JiraCredentials {
                domain: "team.atlassian.net".into(),
                email: "a@b.c".into(),
                api_token: "tok".into(),
            },
            "http://localhost:3001/",
        );
        assert_eq!(
            client.endpoint("issue/PROJ-1"),
            "http://localhost:3001/api/jira/issue/PROJ-1"
        );
    }
}
