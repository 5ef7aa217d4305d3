use serde::Serialize;
use crate::models::domain::ProfileRecord;

/// Status of the upstream people fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    Loading,
    Error(String),
    Ready,
}

/// Cards the renderer draws, top card first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackView<'a> {
    pub current: &'a ProfileRecord,
    pub next: Option<&'a ProfileRecord>,
    pub next_next: Option<&'a ProfileRecord>,
    /// Live horizontal displacement of the top card
    pub offset: f64,
    /// Live rotation of the top card in degrees
    pub rotation: f64,
    pub alpha: f64,
}

/// What the explore screen should show
///
/// `NoProfiles` and `Exhausted` both mean there is no current card; the first
/// is an empty dataset, the second is the end of a deck that had cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ExploreView<'a> {
    Loading,
    Error(&'a str),
    NoProfiles,
    Browsing(StackView<'a>),
    Exhausted,
}
