//! Connect Deck - card-stack interaction engine for the Connectathon discovery app
//!
//! This library holds the state behind the explore screen: the filtered deck of
//! profile cards, the cursor into it, and the swipe gesture that commits an
//! accept or skip decision.

pub mod config;
pub mod core;
pub mod models;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use crate::config::{FilterMode, GestureSettings, Settings};
pub use crate::core::{Decision, DeckController, DeckState, ExploreSession, FilterState, GestureInterpreter};
pub use crate::models::{ConnectionEvent, ExploreView, ProfileRecord, Swipe, SwipeDirection};
pub use crate::services::{ConnectivityError, FirestorePeopleSource, InMemoryPeopleSource, PeopleSource};
