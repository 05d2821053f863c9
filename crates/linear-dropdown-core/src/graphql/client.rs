use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::auth::AuthData;

const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";
const USER_AGENT: &str = "linear-dropdown/0.1.0";

/// Number of labels requested per page, sent as the `$first` variable.
pub const LABEL_PAGE_SIZE: usize = 50;

/// Errors returned by the GraphQL client.
#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status} body: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("invalid GraphQL endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("GraphQL returned errors: {0:?}")]
    ResponseErrors(Vec<GraphqlResponseError>),
    #[error("requested resource not found")]
    NotFound,
}

pub type GraphqlResult<T> = Result<T, GraphqlError>;

/// Minimal GraphQL client for the lookups the dropdown triggers need.
#[derive(Debug, Clone)]
pub struct LinearGraphqlClient {
    http: Client,
    endpoint: Url,
    auth_header: String,
}

impl LinearGraphqlClient {
    /// Build a client targeting the default Linear GraphQL endpoint.
    pub fn from_auth(auth: &AuthData) -> GraphqlResult<Self> {
        Self::with_endpoint(auth, DEFAULT_ENDPOINT)
    }

    /// Build a client with a custom GraphQL endpoint (useful for testing).
    pub fn with_endpoint(auth: &AuthData, endpoint: &str) -> GraphqlResult<Self> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            endpoint,
            auth_header: auth.authorization_header().to_owned(),
        })
    }

    /// Fetch one page of a team's labels, starting after `after` when given.
    pub async fn team_labels(
        &self,
        team_id: &str,
        after: Option<&str>,
    ) -> GraphqlResult<Vec<LabelNode>> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "teamId")]
            team_id: &'a str,
            first: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            after: Option<&'a str>,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            query: &'a str,
            variables: Variables<'a>,
        }

        #[derive(Deserialize)]
        struct TeamEnvelope {
            team: Option<TeamLabels>,
        }

        #[derive(Deserialize)]
        struct TeamLabels {
            labels: Connection<LabelNode>,
        }

        const QUERY: &str = r#"
            query DropdownTeamLabels($teamId: String!, $first: Int!, $after: String) {
                team(id: $teamId) {
                    labels(first: $first, after: $after) {
                        nodes {
                            id
                            name
                            parent {
                                id
                                name
                            }
                        }
                    }
                }
            }
        "#;

        debug!(team_id, after, "requesting team labels");
        let response: GraphqlEnvelope<TeamEnvelope> = self
            .post(Request {
                query: QUERY,
                variables: Variables {
                    team_id,
                    first: LABEL_PAGE_SIZE,
                    after,
                },
            })
            .await?;

        let labels = response
            .into_data()?
            .team
            .ok_or(GraphqlError::NotFound)?
            .labels
            .nodes;
        Ok(labels)
    }

    /// Resolve the id of the team that currently owns an issue.
    pub async fn issue_team_id(&self, issue_id: &str) -> GraphqlResult<String> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "issueId")]
            issue_id: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            query: &'a str,
            variables: Variables<'a>,
        }

        #[derive(Deserialize)]
        struct IssueEnvelope {
            issue: Option<IssueTeam>,
        }

        #[derive(Deserialize)]
        struct IssueTeam {
            team: TeamRef,
        }

        #[derive(Deserialize)]
        struct TeamRef {
            id: String,
        }

        const QUERY: &str = r#"
            query DropdownIssueTeam($issueId: String!) {
                issue(id: $issueId) {
                    team {
                        id
                    }
                }
            }
        "#;

        debug!(issue_id, "resolving issue team");
        let response: GraphqlEnvelope<IssueEnvelope> = self
            .post(Request {
                query: QUERY,
                variables: Variables { issue_id },
            })
            .await?;

        let issue = response
            .into_data()?
            .issue
            .ok_or(GraphqlError::NotFound)?;
        Ok(issue.team.id)
    }

    async fn post<T, R>(&self, body: T) -> GraphqlResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header("authorization", &self.auth_header)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GraphqlError::HttpStatus { status, body: text });
        }

        let payload = response.json::<R>().await?;
        Ok(payload)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlResponseError>>,
}

impl<T> GraphqlEnvelope<T> {
    fn into_data(self) -> GraphqlResult<T> {
        if let Some(errors) = self.errors {
            return Err(GraphqlError::ResponseErrors(errors));
        }
        self.data.ok_or(GraphqlError::NotFound)
    }
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

/// A label as returned by the team labels query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<LabelParent>,
}

/// The direct parent of a nested label. Only one level is fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelParent {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlResponseError {
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<serde_json::Value>>,
}
