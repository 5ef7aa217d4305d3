// Model exports
pub mod domain;
pub mod ui_state;

pub use domain::{ProfileRecord, RecordKey, Swipe, SwipeDirection, ConnectionEvent, PLACEHOLDER_IMAGE};
pub use ui_state::{LoadState, ExploreView, StackView};
