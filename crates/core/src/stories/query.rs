use serde::{Deserialize, Serialize};

/// Work items collection queried for stories
pub const WORK_ITEMS_RESOURCE: &str = "/WorkItems";

/// Area and iteration scope of an epic/story view
///
/// Paths use the analytics `Project\Level1\...` form, e.g.
/// `NL\NARS Flowpath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryQuery {
    /// Iteration path; only its last segment is matched.
    pub sprint: String,
    /// Area path prefixes that stories must live under.
    pub story_areas: Vec<String>,
    /// Area path the owning epics must live under.
    pub epic_area: String,
}

impl StoryQuery {
    #[must_use]
    pub fn new(
        sprint: impl Into<String>,
        story_areas: Vec<String>,
        epic_area: impl Into<String>,
    ) -> Self {
        Self { sprint: sprint.into(), story_areas, epic_area: epic_area.into() }
    }

    #[must_use]
    pub fn resource(&self) -> &'static str {
        WORK_ITEMS_RESOURCE
    }

    /// Iteration name, i.e. the last segment of the sprint path.
    #[must_use]
    pub fn iteration_name(&self) -> &str {
        last_segment(&self.sprint)
    }

    /// `AreaLevel1` value the owning epic must carry: the first segment
    /// below the project, or the whole path when it has a single segment.
    #[must_use]
    pub fn epic_area_level1(&self) -> &str {
        self.epic_area.split('\\').nth(1).unwrap_or(&self.epic_area)
    }

    /// Unencoded OData query string (`$filter`, `$select`, `$expand`).
    #[must_use]
    pub fn to_odata(&self) -> String {
        let mut filter = format!(
            "Iteration/IterationName eq '{}' and WorkItemType eq 'User Story'",
            escape(self.iteration_name())
        );

        if !self.story_areas.is_empty() {
            let areas = self
                .story_areas
                .iter()
                .map(|area| format!("startswith(Area/AreaPath,'{}')", escape(area)))
                .collect::<Vec<_>>()
                .join(" or ");
            filter.push_str(&format!(" and ({areas})"));
        }
        filter.push_str(" and State ne 'Removed'");

        format!(
            "$filter={filter}\
             &$select=WorkItemId,Title,State,WorkItemType\
             &$expand=Area($select=AreaPath,AreaLevel1),\
             Parent($select=WorkItemId,Title,StackRank,WorkItemType;$levels=max;\
             $expand=Area($select=AreaLevel1))"
        )
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('\\').next().unwrap_or(path)
}

/// OData string literals escape `'` by doubling it.
fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
