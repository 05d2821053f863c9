use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graphql::{GraphqlResult, LabelNode, LinearGraphqlClient};
use crate::host::{
    CursorStore, InputData, Meta, RequestContext, TriggerDefinition, TriggerDisplay, TriggerError,
};

/// Form fields that may carry the team id, in lookup order.
const TEAM_ID_FIELDS: [&str; 2] = ["teamId", "team_id"];
/// Form field holding the issue being edited by an "update issue" action.
const ISSUE_ID_FIELD: &str = "issueIdToUpdate";

pub const MISSING_TEAM_MESSAGE: &str = "Please select the team first before selecting the labels";

/// Separator placed between a parent label name and its child.
pub const PARENT_SEPARATOR: &str = " → ";

pub const LABEL_TRIGGER: TriggerDefinition = TriggerDefinition {
    key: "label",
    noun: "Label",
    display: TriggerDisplay {
        label: "Get issue label",
        hidden: true,
        description: "The only purpose of this trigger is to populate the dropdown list of issue labels in the UI, thus, it's hidden.",
    },
    can_paginate: true,
};

/// Remote operations the label lookup depends on.
#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn team_labels(&self, team_id: &str, after: Option<&str>)
        -> GraphqlResult<Vec<LabelNode>>;

    async fn issue_team_id(&self, issue_id: &str) -> GraphqlResult<String>;
}

#[async_trait]
impl LabelSource for LinearGraphqlClient {
    async fn team_labels(
        &self,
        team_id: &str,
        after: Option<&str>,
    ) -> GraphqlResult<Vec<LabelNode>> {
        LinearGraphqlClient::team_labels(self, team_id, after).await
    }

    async fn issue_team_id(&self, issue_id: &str) -> GraphqlResult<String> {
        LinearGraphqlClient::issue_team_id(self, issue_id).await
    }
}

/// Dropdown entry shown for a label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelOption {
    pub id: String,
    pub name: String,
}

impl From<LabelNode> for LabelOption {
    fn from(label: LabelNode) -> Self {
        let name = match label.parent {
            Some(parent) => format!("{}{}{}", parent.name, PARENT_SEPARATOR, label.name),
            None => label.name,
        };
        Self { id: label.id, name }
    }
}

/// Produces one page of label options per invocation. Pagination state lives
/// in the host's cursor store, never in the service.
#[derive(Clone)]
pub struct LabelService<S = LinearGraphqlClient> {
    source: S,
}

impl<S: LabelSource> LabelService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn perform<C>(
        &self,
        ctx: &RequestContext,
        cursor: &C,
    ) -> Result<Vec<LabelOption>, TriggerError>
    where
        C: CursorStore + ?Sized,
    {
        let team_id = self.resolve_team_id(&ctx.input_data).await?;
        let labels = self.fetch_page(&team_id, ctx.meta, cursor).await?;
        advance(&labels, cursor)?;
        Ok(labels.into_iter().map(LabelOption::from).collect())
    }

    /// Explicit team id first, then the team owning the issue being updated.
    pub async fn resolve_team_id(&self, input: &InputData) -> Result<String, TriggerError> {
        if let Some(team_id) = input.first_present(&TEAM_ID_FIELDS) {
            return Ok(team_id.to_owned());
        }
        if let Some(issue_id) = input.string(ISSUE_ID_FIELD) {
            debug!(issue_id, "team not selected, using the issue's team");
            return Ok(self.source.issue_team_id(issue_id).await?);
        }
        Err(TriggerError::halted(MISSING_TEAM_MESSAGE))
    }

    pub async fn fetch_page<C>(
        &self,
        team_id: &str,
        meta: Meta,
        cursor: &C,
    ) -> Result<Vec<LabelNode>, TriggerError>
    where
        C: CursorStore + ?Sized,
    {
        let after = if meta.is_continuation() {
            cursor.get()?
        } else {
            None
        };
        debug!(team_id, page = meta.page, after = after.as_deref(), "fetching label page");
        Ok(self.source.team_labels(team_id, after.as_deref()).await?)
    }
}

/// Store the last label id as the next cursor. An empty page leaves the store
/// untouched, which tells the host there is nothing more to fetch.
fn advance<C>(labels: &[LabelNode], cursor: &C) -> Result<(), TriggerError>
where
    C: CursorStore + ?Sized,
{
    if let Some(last) = labels.last() {
        debug!(cursor = %last.id, "storing label cursor");
        cursor.set(&last.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthData;
    use crate::graphql::{GraphqlError, LabelParent};
    use crate::host::{CursorError, MemoryCursorStore};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Labels {
            team_id: String,
            after: Option<String>,
        },
        IssueTeam(String),
    }

    #[derive(Default)]
    struct FakeSource {
        labels: Vec<LabelNode>,
        issue_teams: HashMap<String, String>,
        fail_labels: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeSource {
        fn with_labels(labels: Vec<LabelNode>) -> Self {
            Self {
                labels,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LabelSource for FakeSource {
        async fn team_labels(
            &self,
            team_id: &str,
            after: Option<&str>,
        ) -> GraphqlResult<Vec<LabelNode>> {
            self.calls.lock().unwrap().push(Call::Labels {
                team_id: team_id.to_owned(),
                after: after.map(str::to_owned),
            });
            if self.fail_labels {
                return Err(GraphqlError::NotFound);
            }
            Ok(self.labels.clone())
        }

        async fn issue_team_id(&self, issue_id: &str) -> GraphqlResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::IssueTeam(issue_id.to_owned()));
            self.issue_teams
                .get(issue_id)
                .cloned()
                .ok_or(GraphqlError::NotFound)
        }
    }

    /// Counts writes so tests can assert that none happened.
    #[derive(Default)]
    struct RecordingCursor {
        inner: MemoryCursorStore,
        writes: Mutex<Vec<String>>,
    }

    impl CursorStore for RecordingCursor {
        fn get(&self) -> Result<Option<String>, CursorError> {
            self.inner.get()
        }

        fn set(&self, cursor: &str) -> Result<(), CursorError> {
            self.writes.lock().unwrap().push(cursor.to_owned());
            self.inner.set(cursor)
        }
    }

    fn label(id: &str, name: &str) -> LabelNode {
        LabelNode {
            id: id.into(),
            name: name.into(),
            parent: None,
        }
    }

    fn child(id: &str, name: &str, parent_id: &str, parent_name: &str) -> LabelNode {
        LabelNode {
            id: id.into(),
            name: name.into(),
            parent: Some(LabelParent {
                id: parent_id.into(),
                name: parent_name.into(),
            }),
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(AuthData::new_api_key("lin_api_test".into()))
    }

    fn labels_call(team_id: &str, after: Option<&str>) -> Call {
        Call::Labels {
            team_id: team_id.into(),
            after: after.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn maps_labels_and_stores_last_id() {
        let service = LabelService::new(FakeSource::with_labels(vec![
            label("L1", "Bug"),
            child("L2", "Sub", "P1", "Feature"),
        ]));
        let cursor = MemoryCursorStore::new();

        let options = service
            .perform(&ctx().with_input("teamId", "team-1"), &cursor)
            .await
            .unwrap();

        assert_eq!(
            options,
            vec![
                LabelOption {
                    id: "L1".into(),
                    name: "Bug".into()
                },
                LabelOption {
                    id: "L2".into(),
                    name: "Feature → Sub".into()
                },
            ]
        );
        assert_eq!(cursor.get().unwrap().as_deref(), Some("L2"));
        assert_eq!(
            service.source.calls(),
            vec![labels_call("team-1", None)]
        );
    }

    #[tokio::test]
    async fn missing_team_halts_without_requests() {
        let service = LabelService::new(FakeSource::default());
        let cursor = RecordingCursor::default();

        let err = service.perform(&ctx(), &cursor).await.unwrap_err();

        assert!(err.is_halted());
        assert_eq!(err.to_string(), MISSING_TEAM_MESSAGE);
        assert!(service.source.calls().is_empty());
        assert!(cursor.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_team_fields_count_as_missing() {
        let service = LabelService::new(FakeSource::default());
        let request = ctx()
            .with_input("teamId", "")
            .with_input("team_id", "")
            .with_input("issueIdToUpdate", "");

        let err = service
            .perform(&request, &MemoryCursorStore::new())
            .await
            .unwrap_err();
        assert!(err.is_halted());
        assert!(service.source.calls().is_empty());
    }

    #[tokio::test]
    async fn snake_case_team_field_is_accepted() {
        let service = LabelService::new(FakeSource::default());
        service
            .perform(&ctx().with_input("team_id", "team-2"), &MemoryCursorStore::new())
            .await
            .unwrap();
        assert_eq!(service.source.calls(), vec![labels_call("team-2", None)]);
    }

    #[tokio::test]
    async fn issue_team_is_used_when_no_team_selected() {
        let mut source = FakeSource::with_labels(vec![label("L1", "Bug")]);
        source
            .issue_teams
            .insert("I1".into(), "team-9".into());
        let service = LabelService::new(source);

        service
            .perform(
                &ctx().with_input("issueIdToUpdate", "I1"),
                &MemoryCursorStore::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            service.source.calls(),
            vec![Call::IssueTeam("I1".into()), labels_call("team-9", None)]
        );
    }

    #[tokio::test]
    async fn explicit_team_wins_over_issue_team() {
        let service = LabelService::new(FakeSource::default());
        let request = ctx()
            .with_input("teamId", "team-1")
            .with_input("issueIdToUpdate", "I1");

        service
            .perform(&request, &MemoryCursorStore::new())
            .await
            .unwrap();
        assert_eq!(service.source.calls(), vec![labels_call("team-1", None)]);
    }

    #[tokio::test]
    async fn issue_lookup_failure_propagates() {
        let service = LabelService::new(FakeSource::default());
        let err = service
            .perform(
                &ctx().with_input("issueIdToUpdate", "I404"),
                &MemoryCursorStore::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TriggerError::Api(GraphqlError::NotFound)));
    }

    #[tokio::test]
    async fn full_page_stores_last_node_id() {
        let labels = (1..=50)
            .map(|n| label(&format!("L{n}"), &format!("Label {n}")))
            .collect();
        let service = LabelService::new(FakeSource::with_labels(labels));
        let cursor = RecordingCursor::default();

        let options = service
            .perform(&ctx().with_input("teamId", "team-1"), &cursor)
            .await
            .unwrap();

        assert_eq!(options.len(), 50);
        assert_eq!(*cursor.writes.lock().unwrap(), vec!["L50".to_owned()]);
    }

    #[tokio::test]
    async fn empty_page_leaves_cursor_untouched() {
        let service = LabelService::new(FakeSource::default());
        let cursor = RecordingCursor::default();

        let options = service
            .perform(&ctx().with_input("teamId", "team-1").with_page(3), &cursor)
            .await
            .unwrap();

        assert!(options.is_empty());
        assert!(cursor.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn continuation_sends_stored_cursor() {
        let service = LabelService::new(FakeSource::with_labels(vec![label("L51", "Late")]));
        let cursor = MemoryCursorStore::with_cursor("L50");

        service
            .perform(&ctx().with_input("teamId", "team-1").with_page(1), &cursor)
            .await
            .unwrap();

        assert_eq!(
            service.source.calls(),
            vec![labels_call("team-1", Some("L50"))]
        );
        assert_eq!(cursor.get().unwrap().as_deref(), Some("L51"));
    }

    #[tokio::test]
    async fn first_page_ignores_stored_cursor() {
        let service = LabelService::new(FakeSource::default());
        let cursor = MemoryCursorStore::with_cursor("stale");

        service
            .perform(&ctx().with_input("teamId", "team-1"), &cursor)
            .await
            .unwrap();

        assert_eq!(service.source.calls(), vec![labels_call("team-1", None)]);
    }

    #[tokio::test]
    async fn api_failure_propagates_without_cursor_write() {
        let source = FakeSource {
            fail_labels: true,
            ..Default::default()
        };
        let service = LabelService::new(source);
        let cursor = RecordingCursor::default();

        let err = service
            .perform(&ctx().with_input("teamId", "team-1"), &cursor)
            .await
            .unwrap_err();

        assert!(!err.is_halted());
        assert!(cursor.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn definition_is_hidden_and_paginated() {
        assert_eq!(LABEL_TRIGGER.key, "label");
        assert_eq!(LABEL_TRIGGER.noun, "Label");
        assert!(LABEL_TRIGGER.display.hidden);
        assert!(LABEL_TRIGGER.can_paginate);
    }

    mod wire {
        use super::*;
        use httpmock::prelude::*;

        #[tokio::test]
        async fn issue_team_flows_into_label_query() {
            let server = MockServer::start();
            let issue = server.mock(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .json_body_partial(r#"{ "variables": { "issueId": "I1" } }"#);
                then.status(200).json_body_obj(&serde_json::json!({
                    "data": { "issue": { "team": { "id": "team-9" } } }
                }));
            });
            let labels = server.mock(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("authorization", "lin_api_test")
                    .json_body_partial(r#"{ "variables": { "teamId": "team-9" } }"#);
                then.status(200).json_body_obj(&serde_json::json!({
                    "data": {
                        "team": {
                            "labels": {
                                "nodes": [
                                    { "id": "L1", "name": "Bug" },
                                    {
                                        "id": "L2",
                                        "name": "Sub",
                                        "parent": { "id": "P1", "name": "Feature" }
                                    }
                                ]
                            }
                        }
                    }
                }));
            });

            let client = LinearGraphqlClient::with_endpoint(
                &AuthData::new_api_key("lin_api_test".into()),
                &format!("{}{}", server.base_url(), "/graphql"),
            )
            .unwrap();
            let service = LabelService::new(client);
            let cursor = MemoryCursorStore::new();

            let options = service
                .perform(&ctx().with_input("issueIdToUpdate", "I1"), &cursor)
                .await
                .unwrap();

            issue.assert();
            labels.assert();
            assert_eq!(options[1].name, "Feature → Sub");
            assert_eq!(cursor.get().unwrap().as_deref(), Some("L2"));
        }
    }
}
