// Service exports
pub mod firestore;
pub mod people_source;

pub use firestore::FirestorePeopleSource;
pub use people_source::{ConnectivityError, InMemoryPeopleSource, PeopleSource};
