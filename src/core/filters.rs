use crate::config::FilterSettings;
use crate::models::ProfileRecord;

/// Active domain / interest selection
///
/// `None` means the predicate is unset and every record passes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub domain: Option<String>,
    pub interest: Option<String>,
}

impl FilterSelection {
    pub fn new(domain: Option<String>, interest: Option<String>) -> Self {
        Self { domain, interest }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.domain.is_none() && self.interest.is_none()
    }
}

/// Check if a record passes both tag predicates
///
/// Domain is an exact match, interest a membership test.
#[inline]
pub fn matches_selection(record: &ProfileRecord, selection: &FilterSelection) -> bool {
    let domain_match = selection
        .domain
        .as_deref()
        .map_or(true, |domain| record.domain == domain);

    let interest_match = selection
        .interest
        .as_deref()
        .map_or(true, |interest| record.has_interest(interest));

    domain_match && interest_match
}

/// Filtered view of the full dataset
///
/// Holds no index: the visible list is recomputed from scratch whenever the
/// selection or the source data changes.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    selection: FilterSelection,
    visible: Vec<ProfileRecord>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn visible_people(&self) -> &[ProfileRecord] {
        &self.visible
    }

    /// Replace the selection and recompute the visible list from `all`
    pub fn set_filter(
        &mut self,
        domain: Option<String>,
        interest: Option<String>,
        all: &[ProfileRecord],
    ) {
        self.selection = FilterSelection::new(domain, interest);
        self.republish(all);
    }

    /// Replace only the selection; the visible list is rebuilt on the next republish
    pub fn select(&mut self, domain: Option<String>, interest: Option<String>) {
        self.selection = FilterSelection::new(domain, interest);
    }

    /// Recompute the visible list from `all` under the current selection
    pub fn republish(&mut self, all: &[ProfileRecord]) {
        self.visible = all
            .iter()
            .filter(|record| matches_selection(record, &self.selection))
            .cloned()
            .collect();

        tracing::debug!(
            "Filtered {} people to {} (domain: {:?}, interest: {:?})",
            all.len(),
            self.visible.len(),
            self.selection.domain,
            self.selection.interest
        );
    }

    pub fn clear_visible(&mut self) {
        self.visible.clear();
    }
}

/// Tags offered as filter chips
#[derive(Debug, Clone)]
pub struct FilterCatalog {
    pub domains: Vec<String>,
    pub interests: Vec<String>,
}

impl FilterCatalog {
    pub fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            domains: settings.domains.clone(),
            interests: settings.interests.clone(),
        }
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

/// Chip toggle: picking the selected item clears it, anything else selects it
pub fn toggle(current: Option<&str>, item: &str) -> Option<String> {
    if current == Some(item) {
        None
    } else {
        Some(item.to_string())
    }
}
