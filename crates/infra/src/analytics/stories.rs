use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;
use zephyr_core::{EpicStoryView, StoryQuery};
use zephyr_domain::{Result, ZephyrError};

use super::session::AnalyticsSession;

/// Upper bound on followed `@odata.nextLink` pages.
const MAX_PAGES: usize = 50;

/// Run `query` against the analytics service and group the stories by epic,
/// following server-driven paging.
#[instrument(skip(session, query), fields(sprint = %query.sprint))]
pub async fn fetch_epic_stories(
    session: &AnalyticsSession,
    query: &StoryQuery,
) -> Result<EpicStoryView> {
    let mut view = EpicStoryView::new(query);
    let mut next = Some(session.url_for(query.resource(), Some(&query.to_odata()))?);
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        if pages == MAX_PAGES {
            warn!(pages, "stopping at page limit with more work items pending");
            break;
        }

        let payload = session.get_json_url(url).await?;
        view.ingest(&payload)?;
        pages += 1;

        next = next_link(&payload)?;
    }

    info!(pages, epics = view.len(), "loaded epic/story view");
    Ok(view)
}

fn next_link(payload: &Value) -> Result<Option<Url>> {
    payload
        .get("@odata.nextLink")
        .and_then(Value::as_str)
        .map(|link| {
            Url::parse(link).map_err(|e| {
                ZephyrError::Deserialization(format!("invalid @odata.nextLink '{link}': {e}"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zephyr_domain::{AnalyticsEndpoint, ClientCredentials};

    use super::*;
    use crate::http::HttpClient;
    use crate::session::TransportPolicy;

    fn story(id: i64, epic_id: i64) -> Value {
        json!({
            "WorkItemId": id,
            "Title": format!("Story {id}"),
            "State": "Active",
            "WorkItemType": "User Story",
            "Area": { "AreaPath": "NL\\App Programs", "AreaLevel1": "App Programs" },
            "Parent": {
                "WorkItemId": epic_id,
                "WorkItemType": "Epic",
                "Area": { "AreaLevel1": "NARS Flowpath" }
            }
        })
    }

    #[tokio::test]
    async fn follows_next_link_and_groups_stories() {
        let server = MockServer::start().await;
        let next = format!("{}/_odata/WorkItems?$skiptoken=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/_odata/WorkItems"))
            .and(query_param("$skiptoken", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [story(2, 100)] })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/_odata/WorkItems"))
            .and(query_param("$select", "WorkItemId,Title,State,WorkItemType"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [story(1, 100), story(3, 200)],
                "@odata.nextLink": next,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = AnalyticsSession::new(
            AnalyticsEndpoint {
                scheme: "http".into(),
                host: server.address().to_string(),
                odata: "/_odata".into(),
            },
            ClientCredentials::new("user", "pat"),
            HttpClient::new().unwrap(),
            TransportPolicy::AllowInsecure,
        );
        let query = StoryQuery::new("NL\\Sprint 8", vec!["NL\\App Programs".into()], "NL\\NARS Flowpath");

        let view = fetch_epic_stories(&session, &query).await.unwrap();
        let epics = view.epics();

        assert_eq!(epics.len(), 2);
        assert_eq!(epics[0]["stories"].as_array().map(Vec::len), Some(2));
        assert_eq!(epics[1]["WorkItemId"], json!(200));
    }

    #[test]
    fn malformed_next_link_is_rejected() {
        let payload = json!({ "value": [], "@odata.nextLink": "not a url" });
        assert!(matches!(next_link(&payload), Err(ZephyrError::Deserialization(_))));
        assert!(matches!(next_link(&json!({ "value": [] })), Ok(None)));
    }
}
