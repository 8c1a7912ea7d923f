use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;
use zephyr_domain::{Result, ZephyrError};

use super::query::StoryQuery;

/// User stories grouped under their oldest ancestor epic
#[derive(Debug, Clone, Default)]
pub struct EpicStoryView {
    epic_area_level1: String,
    epics: Vec<Map<String, Value>>,
    index: HashMap<String, usize>,
}

impl EpicStoryView {
    #[must_use]
    pub fn new(query: &StoryQuery) -> Self {
        Self { epic_area_level1: query.epic_area_level1().to_string(), ..Self::default() }
    }

    /// Fold one OData payload (`{"value": [story, ...]}`) into the view.
    ///
    /// # Errors
    /// Returns `ZephyrError::Deserialization` if the payload has no `value`
    /// array.
    pub fn ingest(&mut self, payload: &Value) -> Result<()> {
        let stories = payload.get("value").and_then(Value::as_array).ok_or_else(|| {
            ZephyrError::Deserialization("work item payload has no 'value' array".into())
        })?;

        let mut kept = 0usize;
        for story in stories.iter().filter_map(Value::as_object) {
            let Some(parent) = story.get("Parent").and_then(Value::as_object) else {
                continue;
            };
            let epic = oldest_ancestor(parent);

            if self.is_tracked_epic(epic) {
                self.add(trim_story(story), trim_epic(epic));
                kept += 1;
            }
        }

        debug!(received = stories.len(), kept, epics = self.epics.len(), "ingested work items");
        Ok(())
    }

    /// Grouped epics in first-seen order, each with a `stories` list.
    #[must_use]
    pub fn epics(&self) -> Vec<Value> {
        self.epics.iter().cloned().map(Value::Object).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.epics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epics.is_empty()
    }

    fn is_tracked_epic(&self, item: &Map<String, Value>) -> bool {
        let area = item.get("Area").and_then(|area| area.get("AreaLevel1")).and_then(Value::as_str);
        let kind = item.get("WorkItemType").and_then(Value::as_str);
        area == Some(self.epic_area_level1.as_str()) && kind == Some("Epic")
    }

    fn add(&mut self, story: Map<String, Value>, mut epic: Map<String, Value>) {
        let id = epic.get("WorkItemId").map(work_item_key).unwrap_or_default();

        if let Some(&slot) = self.index.get(&id) {
            if let Some(Value::Array(stories)) = self.epics[slot].get_mut("stories") {
                stories.push(Value::Object(story));
            }
            return;
        }

        epic.insert("stories".into(), Value::Array(vec![Value::Object(story)]));
        self.index.insert(id, self.epics.len());
        self.epics.push(epic);
    }
}

fn oldest_ancestor(item: &Map<String, Value>) -> &Map<String, Value> {
    let mut current = item;
    while let Some(parent) = current.get("Parent").and_then(Value::as_object) {
        current = parent;
    }
    current
}

fn work_item_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn trim_story(story: &Map<String, Value>) -> Map<String, Value> {
    let mut trimmed = story.clone();
    trimmed.remove("Parent");
    lift_area(&mut trimmed, &["AreaLevel1", "AreaPath"]);
    trimmed
}

fn trim_epic(epic: &Map<String, Value>) -> Map<String, Value> {
    let mut trimmed = epic.clone();
    trimmed.remove("Parent");
    lift_area(&mut trimmed, &["AreaLevel1"]);
    trimmed
}

fn lift_area(item: &mut Map<String, Value>, fields: &[&str]) {
    if let Some(Value::Object(area)) = item.remove("Area") {
        for field in fields {
            if let Some(value) = area.get(*field) {
                item.insert((*field).to_string(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn view() -> EpicStoryView {
        EpicStoryView::new(&StoryQuery::new("NL\\Sprint 8", vec![], "NL\\NARS Flowpath"))
    }

    fn epic(id: i64, area: &str) -> Value {
        json!({
            "WorkItemId": id,
            "Title": format!("Epic {id}"),
            "WorkItemType": "Epic",
            "Area": { "AreaLevel1": area },
            "Parent": null
        })
    }

    fn story(id: i64, parent: Value) -> Value {
        json!({
            "WorkItemId": id,
            "Title": format!("Story {id}"),
            "State": "Active",
            "WorkItemType": "User Story",
            "Area": { "AreaPath": "NL\\App Programs\\Team", "AreaLevel1": "App Programs" },
            "Parent": parent
        })
    }

    fn feature(id: i64, parent: Value) -> Value {
        json!({
            "WorkItemId": id,
            "WorkItemType": "Feature",
            "Area": { "AreaLevel1": "NARS Flowpath" },
            "Parent": parent
        })
    }

    #[test]
    fn test_groups_stories_under_oldest_epic() {
        let mut view = view();
        let payload = json!({ "value": [
            story(1, feature(10, epic(100, "NARS Flowpath"))),
            story(2, epic(100, "NARS Flowpath")),
            story(3, feature(11, epic(200, "NARS Flowpath"))),
        ]});

        view.ingest(&payload).unwrap();
        let epics = view.epics();

        assert_eq!(epics.len(), 2);
        assert_eq!(epics[0]["WorkItemId"], json!(100));
        assert_eq!(epics[0]["AreaLevel1"], json!("NARS Flowpath"));
        assert!(epics[0].get("Area").is_none());

        let stories = epics[0]["stories"].as_array().unwrap();
        assert_eq!(stories.len(), 2);
        assert_eq!(stories[0]["WorkItemId"], json!(1));
        assert_eq!(stories[0]["AreaPath"], json!("NL\\App Programs\\Team"));
        assert!(stories[0].get("Parent").is_none());
        assert!(stories[0].get("Area").is_none());

        assert_eq!(epics[1]["WorkItemId"], json!(200));
    }

    #[test]
    fn test_skips_orphans_other_areas_and_non_epics() {
        let mut view = view();
        let payload = json!({ "value": [
            story(1, Value::Null),
            story(2, epic(100, "Some Other Area")),
            story(3, feature(10, Value::Null)),
            { "WorkItemId": 4, "Title": "no parent key" },
        ]});

        view.ingest(&payload).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_ingest_accumulates_across_pages() {
        let mut view = view();
        view.ingest(&json!({ "value": [story(1, epic(100, "NARS Flowpath"))] })).unwrap();
        view.ingest(&json!({ "value": [story(2, epic(100, "NARS Flowpath"))] })).unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(view.epics()[0]["stories"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_payload_without_value_is_rejected() {
        let mut view = view();
        let result = view.ingest(&json!({ "error": "nope" }));
        assert!(matches!(result, Err(ZephyrError::Deserialization(_))));
    }
}
