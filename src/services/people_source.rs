use crate::core::filters::{matches_selection, FilterSelection};
use crate::models::ProfileRecord;
use std::future::Future;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur while fetching people
///
/// Every variant surfaces to the UI as an error state with its message; none is
/// retried automatically.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of profile records
pub trait PeopleSource {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<ProfileRecord>, ConnectivityError>> + Send;

    /// Domain is an exact match, interest a membership test; both unset is `fetch_all`
    fn fetch_filtered(
        &self,
        domain: Option<&str>,
        interest: Option<&str>,
    ) -> impl Future<Output = Result<Vec<ProfileRecord>, ConnectivityError>> + Send;
}

/// People source backed by a shared in-memory list
///
/// Clones share the same data, so a test can swap records or inject a failure
/// after handing a clone to the session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPeopleSource {
    inner: Arc<Mutex<InMemoryState>>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    people: Vec<ProfileRecord>,
    failure: Option<String>,
    calls: usize,
}

impl InMemoryPeopleSource {
    pub fn new(people: Vec<ProfileRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryState {
                people,
                failure: None,
                calls: 0,
            })),
        }
    }

    pub fn set_people(&self, people: Vec<ProfileRecord>) {
        self.with_state(|state| state.people = people);
    }

    /// Make every following fetch fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        let message = message.into();
        self.with_state(|state| state.failure = Some(message));
    }

    pub fn recover(&self) {
        self.with_state(|state| state.failure = None);
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.with_state(|state| state.calls)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut InMemoryState) -> T) -> T {
        // A poisoned lock only means another holder panicked; the data is still usable
        let mut state = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }

    fn serve(&self, selection: &FilterSelection) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        self.with_state(|state| {
            state.calls += 1;
            if let Some(message) = &state.failure {
                return Err(ConnectivityError::Unavailable(message.clone()));
            }
            Ok(state
                .people
                .iter()
                .filter(|record| matches_selection(record, selection))
                .cloned()
                .collect())
        })
    }
}

impl PeopleSource for InMemoryPeopleSource {
    async fn fetch_all(&self) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        self.serve(&FilterSelection::default())
    }

    async fn fetch_filtered(
        &self,
        domain: Option<&str>,
        interest: Option<&str>,
    ) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        let selection = FilterSelection::new(domain.map(String::from), interest.map(String::from));
        self.serve(&selection)
    }
}
