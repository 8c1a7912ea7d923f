//! Epic → user story view over analytics work items
//!
//! [`StoryQuery`] renders the OData request; [`EpicStoryView`] walks each
//! story's parent chain to its oldest ancestor and groups stories under the
//! epics that pass the area filter.

pub mod query;
pub mod view;

pub use query::StoryQuery;
pub use view::EpicStoryView;
