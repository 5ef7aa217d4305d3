// Core engine exports
pub mod deck;
pub mod filters;
pub mod gesture;
pub mod session;

pub use deck::{DeckController, DeckState};
pub use filters::{matches_selection, toggle, FilterCatalog, FilterSelection, FilterState};
pub use gesture::{Decision, GestureEvent, GesturePhase, GestureInterpreter};
pub use session::{ExploreSession, FetchReason, FetchRequest, FetchResponse, FetchScope, SwipeObserver};
