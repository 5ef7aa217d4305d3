use crate::config::{FilterMode, GestureSettings, Settings};
use crate::core::deck::{DeckController, DeckState};
use crate::core::filters::{toggle, FilterCatalog, FilterSelection, FilterState};
use crate::core::gesture::{Decision, GestureEvent, GestureInterpreter};
use crate::models::{
    ConnectionEvent, ExploreView, LoadState, ProfileRecord, StackView, Swipe, SwipeDirection,
};
use crate::services::{ConnectivityError, PeopleSource};
use std::time::Duration;
use tokio::sync::broadcast;

const CONNECTION_CHANNEL_CAPACITY: usize = 64;

/// Notified of every committed decision, before the deck advances
pub trait SwipeObserver {
    fn on_accept(&mut self, _record: &ProfileRecord) {}
    fn on_skip(&mut self, _record: &ProfileRecord) {}
}

/// What a fetch asks the source for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    All,
    Filtered(FilterSelection),
}

/// Why a fetch was issued; decides how the deck cursor is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    /// Same filter, fresh data: keep the reader's place
    Reload,
    /// New filter: start from the top
    FilterChange,
}

/// A fetch tagged with the generation it was issued under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub token: u64,
    pub scope: FetchScope,
    pub reason: FetchReason,
}

impl FetchRequest {
    pub async fn execute<S: PeopleSource>(self, source: &S) -> FetchResponse {
        let result = match &self.scope {
            FetchScope::All => source.fetch_all().await,
            FetchScope::Filtered(selection) => {
                source
                    .fetch_filtered(selection.domain.as_deref(), selection.interest.as_deref())
                    .await
            }
        };
        FetchResponse { request: self, result }
    }
}

/// A completed fetch, still carrying its token
#[derive(Debug)]
pub struct FetchResponse {
    pub request: FetchRequest,
    pub result: Result<Vec<ProfileRecord>, ConnectivityError>,
}

/// Explore screen state: filters, deck and the top card's gesture
///
/// All methods run on one logical UI sequence. The only suspension point is
/// the people fetch, which is split into `begin_fetch` / `complete_fetch` so a
/// response for a superseded request can be recognised and dropped.
pub struct ExploreSession {
    mode: FilterMode,
    catalog: FilterCatalog,
    filters: FilterState,
    all_people: Vec<ProfileRecord>,
    load_state: LoadState,
    deck: DeckController,
    gesture: GestureInterpreter,
    generation: u64,
    connections: broadcast::Sender<ConnectionEvent>,
    observers: Vec<Box<dyn SwipeObserver + Send>>,
}

impl ExploreSession {
    pub fn new(settings: &Settings) -> Self {
        Self::with_parts(
            settings.source.filter_mode,
            settings.gesture,
            FilterCatalog::from_settings(&settings.filters),
        )
    }

    pub fn with_parts(mode: FilterMode, gesture: GestureSettings, catalog: FilterCatalog) -> Self {
        let (connections, _) = broadcast::channel(CONNECTION_CHANNEL_CAPACITY);
        Self {
            mode,
            catalog,
            filters: FilterState::new(),
            all_people: Vec::new(),
            load_state: LoadState::Loading,
            deck: DeckController::new(),
            gesture: GestureInterpreter::new(gesture),
            generation: 0,
            connections,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn SwipeObserver + Send>) {
        self.observers.push(observer);
    }

    /// Subscribe to accept notifications
    pub fn connection_events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.connections.subscribe()
    }

    // ---- fetching ----

    /// Issue a reload under the current filter
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.issue(FetchReason::Reload)
    }

    fn issue(&mut self, reason: FetchReason) -> FetchRequest {
        self.generation += 1;
        self.load_state = LoadState::Loading;

        let scope = match self.mode {
            FilterMode::Local => FetchScope::All,
            FilterMode::Remote if self.filters.selection().is_unfiltered() => FetchScope::All,
            FilterMode::Remote => FetchScope::Filtered(self.filters.selection().clone()),
        };

        tracing::info!("Issued fetch #{} ({:?}, {:?})", self.generation, scope, reason);

        FetchRequest {
            token: self.generation,
            scope,
            reason,
        }
    }

    /// Apply a finished fetch; false when it was superseded and dropped
    pub fn complete_fetch(&mut self, response: FetchResponse) -> bool {
        let FetchResponse { request, result } = response;

        if request.token != self.generation {
            tracing::warn!(
                "Discarding stale fetch #{} (current #{})",
                request.token,
                self.generation
            );
            return false;
        }

        // Any animation was running against the old card set
        self.gesture.reset();

        match result {
            Ok(people) => {
                tracing::info!("Fetch #{} returned {} people", request.token, people.len());
                self.all_people = people;
                self.filters.republish(&self.all_people);
                let visible = self.filters.visible_people().to_vec();
                match request.reason {
                    FetchReason::Reload => self.deck.load(visible),
                    FetchReason::FilterChange => self.deck.replace(visible),
                }
                self.load_state = LoadState::Ready;
            }
            Err(e) => {
                tracing::error!("Fetch #{} failed: {}", request.token, e);
                self.all_people.clear();
                self.filters.clear_visible();
                self.deck.replace(Vec::new());
                self.load_state = LoadState::Error(e.to_string());
            }
        }
        true
    }

    /// Fetch and apply in place
    pub async fn refresh<S: PeopleSource>(&mut self, source: &S) -> bool {
        let request = self.begin_fetch();
        let response = request.execute(source).await;
        self.complete_fetch(response)
    }

    // ---- filtering ----

    /// Change both filter predicates
    ///
    /// In local mode the deck is rebuilt immediately and `None` is returned.
    /// In remote mode the returned request must be executed and completed.
    /// Either way browsing restarts from the first card.
    pub fn apply_filter(
        &mut self,
        domain: Option<String>,
        interest: Option<String>,
    ) -> Option<FetchRequest> {
        tracing::info!("Applying filter domain={:?} interest={:?}", domain, interest);

        match self.mode {
            FilterMode::Local => {
                self.filters.set_filter(domain, interest, &self.all_people);
                self.deck.replace(self.filters.visible_people().to_vec());
                self.gesture.reset();
                None
            }
            FilterMode::Remote => {
                self.filters.select(domain, interest);
                self.gesture.reset();
                Some(self.issue(FetchReason::FilterChange))
            }
        }
    }

    pub fn toggle_domain(&mut self, domain: &str) -> Option<FetchRequest> {
        let selection = self.filters.selection().clone();
        self.apply_filter(toggle(selection.domain.as_deref(), domain), selection.interest)
    }

    pub fn toggle_interest(&mut self, interest: &str) -> Option<FetchRequest> {
        let selection = self.filters.selection().clone();
        self.apply_filter(selection.domain, toggle(selection.interest.as_deref(), interest))
    }

    pub fn clear_filters(&mut self) -> Option<FetchRequest> {
        self.apply_filter(None, None)
    }

    // ---- gestures ----

    /// Bind a drag to the current top card
    ///
    /// Refused unless the last fetch settled successfully.
    pub fn begin_drag(&mut self) -> bool {
        if self.load_state != LoadState::Ready {
            tracing::debug!("Ignored drag while {:?}", self.load_state);
            return false;
        }
        match self.deck.current().map(ProfileRecord::key) {
            Some(key) => self.gesture.begin_drag(key),
            None => false,
        }
    }

    pub fn on_drag_update(&mut self, delta_x: f64) {
        self.gesture.on_drag_update(delta_x);
    }

    pub fn on_drag_end(&mut self) -> Decision {
        self.gesture.on_drag_end()
    }

    /// Advance the gesture animation; a finished commit dismisses the card
    pub fn tick(&mut self, dt: Duration) -> Option<Swipe> {
        match self.gesture.tick(dt)? {
            GestureEvent::Committed { card, direction } => {
                if self.deck.current().map(ProfileRecord::key) != Some(card) {
                    tracing::warn!("Commit for {} arrived after the top card changed", card);
                    self.gesture.reset();
                    return None;
                }
                self.dismiss(direction)
            }
            GestureEvent::Returned { .. } => None,
        }
    }

    /// Drive the running animation on tokio time until it finishes
    pub async fn play_animation(&mut self) -> Option<Swipe> {
        let frame = self.gesture.settings().frame_interval();
        let mut interval = tokio::time::interval(frame);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        while self.gesture.is_animating() {
            interval.tick().await;
            if let Some(swipe) = self.tick(frame) {
                return Some(swipe);
            }
        }
        None
    }

    // ---- taps ----

    pub fn tap_connect(&mut self) -> Option<Swipe> {
        self.tap(SwipeDirection::Right)
    }

    pub fn tap_skip(&mut self) -> Option<Swipe> {
        self.tap(SwipeDirection::Left)
    }

    fn tap(&mut self, direction: SwipeDirection) -> Option<Swipe> {
        if self.load_state != LoadState::Ready {
            tracing::debug!("Ignored {:?} tap while {:?}", direction, self.load_state);
            return None;
        }
        if self.gesture.is_animating() {
            tracing::warn!("Ignored {:?} tap while a swipe animation is in flight", direction);
            return None;
        }
        self.dismiss(direction)
    }

    /// Restart browsing after the deck is exhausted
    pub fn start_over(&mut self) {
        self.deck.reset();
        self.gesture.reset();
    }

    /// Notify with the outgoing card, then advance
    fn dismiss(&mut self, direction: SwipeDirection) -> Option<Swipe> {
        let record = self.deck.current()?.clone();

        for observer in &mut self.observers {
            match direction {
                SwipeDirection::Right => observer.on_accept(&record),
                SwipeDirection::Left => observer.on_skip(&record),
            }
        }

        if direction == SwipeDirection::Right {
            // No subscribers is fine: the notification is fire-and-forget
            let _ = self.connections.send(ConnectionEvent::for_record(&record));
            tracing::info!("Connected with {}", record.name);
        } else {
            tracing::debug!("Skipped {}", record.name);
        }

        self.deck.advance();
        self.gesture.reset();

        Some(Swipe { record, direction })
    }

    // ---- views ----

    pub fn view(&self) -> ExploreView<'_> {
        match &self.load_state {
            LoadState::Loading => ExploreView::Loading,
            LoadState::Error(message) => ExploreView::Error(message),
            LoadState::Ready => match self.deck.state() {
                DeckState::Empty => ExploreView::NoProfiles,
                DeckState::Exhausted => ExploreView::Exhausted,
                DeckState::Browsing => match self.stack() {
                    Some(stack) => ExploreView::Browsing(stack),
                    None => ExploreView::Exhausted,
                },
            },
        }
    }

    /// Top card plus the two behind it
    pub fn stack(&self) -> Option<StackView<'_>> {
        let current = self.deck.current()?;
        // Gesture values only belong to the card they were recorded on
        let live = self.gesture.card() == Some(current.key());
        Some(StackView {
            current,
            next: self.deck.peek(1),
            next_next: self.deck.peek(2),
            offset: if live { self.gesture.offset() } else { 0.0 },
            rotation: if live { self.gesture.rotation() } else { 0.0 },
            alpha: if live { self.gesture.alpha() } else { 1.0 },
        })
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn visible_people(&self) -> &[ProfileRecord] {
        self.filters.visible_people()
    }

    pub fn selection(&self) -> &FilterSelection {
        self.filters.selection()
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn deck(&self) -> &DeckController {
        &self.deck
    }

    pub fn gesture(&self) -> &GestureInterpreter {
        &self.gesture
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryPeopleSource;
    use std::sync::{Arc, Mutex};

    fn people() -> Vec<ProfileRecord> {
        vec![
            ProfileRecord::new("A", 25).with_domain("Tech").with_interests(["Coding"]),
            ProfileRecord::new("B", 26).with_domain("Design").with_interests(["UI/UX"]),
            ProfileRecord::new("C", 27).with_domain("Tech").with_interests(["Startups"]),
        ]
    }

    fn session(mode: FilterMode) -> ExploreSession {
        ExploreSession::with_parts(mode, GestureSettings::default(), FilterCatalog::default())
    }

    fn ready_session(mode: FilterMode) -> ExploreSession {
        let mut session = session(mode);
        let request = session.begin_fetch();
        let ok = session.complete_fetch(FetchResponse { request, result: Ok(people()) });
        assert!(ok);
        session
    }

    fn current_name(session: &ExploreSession) -> Option<String> {
        session.deck().current().map(|p| p.name.clone())
    }

    struct Recorder(Arc<Mutex<Vec<(SwipeDirection, String)>>>);

    impl SwipeObserver for Recorder {
        fn on_accept(&mut self, record: &ProfileRecord) {
            self.0.lock().unwrap().push((SwipeDirection::Right, record.name.clone()));
        }
        fn on_skip(&mut self, record: &ProfileRecord) {
            self.0.lock().unwrap().push((SwipeDirection::Left, record.name.clone()));
        }
    }

    #[test]
    fn test_starts_loading() {
        let session = session(FilterMode::Local);
        assert_eq!(session.view(), ExploreView::Loading);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = session(FilterMode::Remote);
        let tech = session.apply_filter(Some("Tech".into()), None).unwrap();
        let design = session.apply_filter(Some("Design".into()), None).unwrap();
        assert_eq!((tech.token, design.token), (1, 2));

        let design_people = vec![people()[1].clone()];
        assert!(session.complete_fetch(FetchResponse { request: design, result: Ok(design_people) }));
        assert!(!session.complete_fetch(FetchResponse { request: tech, result: Ok(people()) }));

        assert_eq!(session.visible_people().len(), 1);
        assert_eq!(current_name(&session).as_deref(), Some("B"));
    }

    #[test]
    fn test_stale_failure_is_discarded() {
        let mut session = session(FilterMode::Local);
        let first = session.begin_fetch();
        let second = session.begin_fetch();
        session.complete_fetch(FetchResponse { request: second, result: Ok(people()) });

        let stale = FetchResponse {
            request: first,
            result: Err(ConnectivityError::Unavailable("offline".into())),
        };
        assert!(!session.complete_fetch(stale));
        assert_eq!(session.load_state(), &LoadState::Ready);
    }

    #[test]
    fn test_fetch_failure_surfaces_error_and_empties_deck() {
        let mut session = ready_session(FilterMode::Local);
        let request = session.begin_fetch();
        session.complete_fetch(FetchResponse {
            request,
            result: Err(ConnectivityError::Unauthorized),
        });

        assert!(matches!(session.view(), ExploreView::Error(m) if m.contains("Unauthorized")));
        assert!(session.deck().is_empty());
    }

    #[test]
    fn test_local_filter_resets_cursor() {
        let mut session = ready_session(FilterMode::Local);
        session.tap_skip();
        assert_eq!(current_name(&session).as_deref(), Some("B"));

        assert!(session.apply_filter(Some("Tech".into()), None).is_none());
        assert_eq!(current_name(&session).as_deref(), Some("A"));
        assert_eq!(session.deck().len(), 2);
    }

    #[test]
    fn test_reload_preserves_current_card() {
        let mut session = ready_session(FilterMode::Local);
        session.tap_skip();

        let mut reordered = people();
        reordered.reverse();
        let request = session.begin_fetch();
        session.complete_fetch(FetchResponse { request, result: Ok(reordered) });

        assert_eq!(current_name(&session).as_deref(), Some("B"));
        assert_eq!(session.deck().cursor(), 1);
    }

    #[test]
    fn test_toggle_semantics() {
        let mut session = ready_session(FilterMode::Local);
        session.toggle_domain("Tech");
        assert_eq!(session.selection().domain.as_deref(), Some("Tech"));
        session.toggle_interest("Startups");
        assert_eq!(session.visible_people().len(), 1);

        session.toggle_domain("Tech");
        assert_eq!(session.selection().domain, None);
        assert_eq!(session.selection().interest.as_deref(), Some("Startups"));

        session.clear_filters();
        assert_eq!(session.visible_people(), people().as_slice());
    }

    #[test]
    fn test_tap_connect_notifies_before_advance() {
        let mut session = ready_session(FilterMode::Local);
        let log = Arc::new(Mutex::new(Vec::new()));
        session.add_observer(Box::new(Recorder(log.clone())));
        let mut events = session.connection_events();

        let swipe = session.tap_connect().unwrap();
        assert_eq!(swipe.record.name, "A");
        assert_eq!(current_name(&session).as_deref(), Some("B"));

        session.tap_skip();
        assert_eq!(
            *log.lock().unwrap(),
            vec![(SwipeDirection::Right, "A".to_string()), (SwipeDirection::Left, "B".to_string())]
        );

        let event = events.try_recv().unwrap();
        assert_eq!(event.message, "✨ Connected with A!");
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_commit_right_on_last_card() {
        let mut session = ready_session(FilterMode::Local);
        session.tap_skip();
        session.tap_skip();

        let log = Arc::new(Mutex::new(Vec::new()));
        session.add_observer(Box::new(Recorder(log.clone())));

        assert!(session.begin_drag());
        session.on_drag_update(260.0);
        assert_eq!(session.on_drag_end(), Decision::CommitRight);

        let mut swipe = None;
        for _ in 0..100 {
            if let Some(s) = session.tick(Duration::from_millis(16)) {
                swipe = Some(s);
                break;
            }
        }

        let swipe = swipe.unwrap();
        assert_eq!(swipe.record.name, "C");
        assert!(swipe.is_accept());
        assert_eq!(session.deck().state(), DeckState::Exhausted);
        assert_eq!(session.view(), ExploreView::Exhausted);
        assert_eq!(*log.lock().unwrap(), vec![(SwipeDirection::Right, "C".to_string())]);
    }

    #[test]
    fn test_card_advances_only_after_settle() {
        let mut session = ready_session(FilterMode::Local);
        session.begin_drag();
        session.on_drag_update(-300.0);
        session.on_drag_end();

        assert!(session.tick(Duration::from_millis(250)).is_none());
        assert_eq!(current_name(&session).as_deref(), Some("A"));
        assert!(session.tick(Duration::from_millis(50)).is_none());
        assert_eq!(current_name(&session).as_deref(), Some("A"));

        let swipe = session.tick(Duration::from_millis(50)).unwrap();
        assert_eq!(swipe.direction, SwipeDirection::Left);
        assert_eq!(current_name(&session).as_deref(), Some("B"));
        assert_eq!(session.stack().unwrap().offset, 0.0);
    }

    #[test]
    fn test_reload_cancels_animation() {
        let mut session = ready_session(FilterMode::Local);
        session.begin_drag();
        session.on_drag_update(300.0);
        session.on_drag_end();
        session.tick(Duration::from_millis(100));

        let request = session.begin_fetch();
        session.complete_fetch(FetchResponse { request, result: Ok(people()) });

        assert!(!session.gesture().is_animating());
        for _ in 0..100 {
            assert!(session.tick(Duration::from_millis(16)).is_none());
        }
        assert_eq!(current_name(&session).as_deref(), Some("A"));
    }

    #[test]
    fn test_taps_ignored_during_animation() {
        let mut session = ready_session(FilterMode::Local);
        session.begin_drag();
        session.on_drag_update(300.0);
        session.on_drag_end();

        assert!(session.tap_connect().is_none());
        assert_eq!(current_name(&session).as_deref(), Some("A"));
    }

    #[test]
    fn test_taps_and_drags_ignored_while_filtered_fetch_pending() {
        let mut session = ready_session(FilterMode::Remote);
        session.tap_skip();
        assert_eq!(session.deck().cursor(), 1);

        let request = session.apply_filter(Some("Tech".into()), None).unwrap();
        assert_eq!(session.load_state(), &LoadState::Loading);

        assert!(session.tap_connect().is_none());
        assert!(session.tap_skip().is_none());
        assert!(!session.begin_drag());
        assert_eq!(session.deck().cursor(), 1);

        let tech = people().into_iter().filter(|p| p.domain == "Tech").collect();
        assert!(session.complete_fetch(FetchResponse { request, result: Ok(tech) }));
        assert_eq!(current_name(&session).as_deref(), Some("A"));
        assert!(session.begin_drag());
    }

    #[test]
    fn test_taps_ignored_after_failed_fetch() {
        let mut session = session(FilterMode::Local);
        let request = session.begin_fetch();
        session.complete_fetch(FetchResponse {
            request,
            result: Err(ConnectivityError::Unavailable("offline".into())),
        });

        assert!(session.tap_connect().is_none());
        assert!(!session.begin_drag());
    }

    #[test]
    fn test_cancel_keeps_card() {
        let mut session = ready_session(FilterMode::Local);
        session.begin_drag();
        session.on_drag_update(200.0);
        assert_eq!(session.on_drag_end(), Decision::Cancel);

        for _ in 0..100 {
            assert!(session.tick(Duration::from_millis(16)).is_none());
        }
        assert_eq!(current_name(&session).as_deref(), Some("A"));
        assert!(session.begin_drag());
    }

    #[test]
    fn test_empty_dataset_view() {
        let mut session = session(FilterMode::Local);
        let request = session.begin_fetch();
        session.complete_fetch(FetchResponse { request, result: Ok(Vec::new()) });

        assert_eq!(session.view(), ExploreView::NoProfiles);
        assert!(!session.begin_drag());
        assert!(session.tap_connect().is_none());
    }

    #[test]
    fn test_stack_view_and_start_over() {
        let mut session = ready_session(FilterMode::Local);
        let stack = session.stack().unwrap();
        assert_eq!(stack.current.name, "A");
        assert_eq!(stack.next.map(|p| p.name.as_str()), Some("B"));
        assert_eq!(stack.next_next.map(|p| p.name.as_str()), Some("C"));

        for _ in 0..3 {
            session.tap_skip();
        }
        assert_eq!(session.view(), ExploreView::Exhausted);
        assert!(session.tap_skip().is_none());

        session.start_over();
        assert_eq!(current_name(&session).as_deref(), Some("A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_animation_on_tokio_time() {
        let source = InMemoryPeopleSource::new(people());
        let mut session = session(FilterMode::Local);
        assert!(session.refresh(&source).await);

        session.begin_drag();
        session.on_drag_update(400.0);
        session.on_drag_end();

        let started = tokio::time::Instant::now();
        let swipe = session.play_animation().await.unwrap();

        assert_eq!(swipe.record.name, "A");
        assert!(started.elapsed() >= Duration::from_millis(350));
        assert_eq!(current_name(&session).as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_remote_mode_fetches_filtered() {
        let source = InMemoryPeopleSource::new(people());
        let mut session = session(FilterMode::Remote);
        session.refresh(&source).await;

        let request = session.apply_filter(None, Some("UI/UX".into())).unwrap();
        assert_eq!(session.load_state(), &LoadState::Loading);
        assert_eq!(
            request.scope,
            FetchScope::Filtered(FilterSelection::new(None, Some("UI/UX".into())))
        );

        let response = request.execute(&source).await;
        assert!(session.complete_fetch(response));
        assert_eq!(current_name(&session).as_deref(), Some("B"));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_local_mode_filters_without_fetching() {
        let source = InMemoryPeopleSource::new(people());
        let mut session = session(FilterMode::Local);
        session.refresh(&source).await;

        session.apply_filter(Some("Design".into()), None);
        session.apply_filter(None, None);
        assert_eq!(source.calls(), 1);
        assert_eq!(session.visible_people().len(), 3);
    }
}
