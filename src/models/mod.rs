use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Shared handle to a tree node. Unchanged subtrees are shared between tree
/// versions, so identity (`Arc::ptr_eq`) tells the view what it can skip.
pub(crate) type NodeRef = Arc<ContentNode>;

/// Display priority, `0..=3`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub(crate) struct Priority(u8);

impl Priority {
    pub const MAX: u8 = 3;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("priority {value} is out of range 0..=3"))
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum MediaType {
    Video,
    Slide,
}

/// Any JSON number, floored to whole seconds. Negative and non-finite values are rejected.
fn seconds_from_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = serde_json::Number::deserialize(deserializer)?;
    if let Some(secs) = n.as_u64() {
        return Ok(secs);
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Ok(f.floor() as u64),
        _ => Err(de::Error::custom(format!("invalid duration {n}"))),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Lesson {
    pub id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_pinned: bool,
    pub title: String,
    #[serde(deserialize_with = "seconds_from_number")]
    pub duration_seconds: u64,
    pub media_type: MediaType,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Chapter {
    pub id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_pinned: bool,
    pub name: String,
    #[serde(default)]
    pub is_completed: bool,

    /// `None` until the children were fetched; `Some(vec![])` once fetched and empty.
    #[serde(default)]
    pub children: Option<Vec<NodeRef>>,
}

impl Chapter {
    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum ContentNode {
    Lesson(Lesson),
    Chapter(Chapter),
}

impl ContentNode {
    pub fn id(&self) -> &str {
        match self {
            ContentNode::Lesson(l) => &l.id,
            ContentNode::Chapter(c) => &c.id,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            ContentNode::Lesson(l) => l.priority,
            ContentNode::Chapter(c) => c.priority,
        }
    }

    pub fn is_pinned(&self) -> bool {
        match self {
            ContentNode::Lesson(l) => l.is_pinned,
            ContentNode::Chapter(c) => c.is_pinned,
        }
    }

    pub fn as_chapter(&self) -> Option<&Chapter> {
        match self {
            ContentNode::Chapter(c) => Some(c),
            ContentNode::Lesson(_) => None,
        }
    }

    pub fn as_lesson(&self) -> Option<&Lesson> {
        match self {
            ContentNode::Lesson(l) => Some(l),
            ContentNode::Chapter(_) => None,
        }
    }
}

/// Filter applied to a tab's tree. Changing it invalidates the whole tree.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterCriteria {
    pub filter_by: String,
    pub query_text: String,
}

impl FilterCriteria {
    pub fn new(filter_by: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            filter_by: filter_by.into(),
            query_text: query_text.into(),
        }
    }
}

/// "Children of `parent_id` in `tab_id` under `filter`". `parent_id = None` is the root level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FetchRequest {
    pub tab_id: String,
    pub parent_id: Option<String>,
    pub filter: FilterCriteria,
}

impl FetchRequest {
    pub fn root(tab_id: impl Into<String>, filter: FilterCriteria) -> Self {
        Self {
            tab_id: tab_id.into(),
            parent_id: None,
            filter,
        }
    }

    pub fn children(
        tab_id: impl Into<String>,
        parent_id: impl Into<String>,
        filter: FilterCriteria,
    ) -> Self {
        Self {
            tab_id: tab_id.into(),
            parent_id: Some(parent_id.into()),
            filter,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
