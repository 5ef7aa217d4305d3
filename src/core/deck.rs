use crate::models::{ProfileRecord, RecordKey};

/// Coarse deck state derived from the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    /// No cards at all
    Empty,
    /// `cursor < len`
    Browsing,
    /// Every card has been decided
    Exhausted,
}

/// Ordered deck with a cursor at the next card to present
///
/// Invariant: `0 <= cursor <= deck.len()`; `cursor == deck.len()` is exhaustion.
#[derive(Debug, Clone, Default)]
pub struct DeckController {
    deck: Vec<ProfileRecord>,
    cursor: usize,
}

impl DeckController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the deck, keeping the reader's place where possible
    ///
    /// The current card is looked up by key in the new deck; among duplicate
    /// copies the one nearest the old cursor wins. If it is gone the old
    /// position is kept when it still points at a card, otherwise browsing
    /// restarts from the top. A nonempty load never lands exhausted.
    pub fn load(&mut self, records: Vec<ProfileRecord>) {
        let previous_key = self.current().map(ProfileRecord::key);
        let previous_cursor = self.cursor;

        let cursor = match previous_key
            .and_then(|key| nearest_with_key(&records, key, previous_cursor))
        {
            Some(index) => index,
            None if previous_cursor < records.len() => previous_cursor,
            None => 0,
        };

        tracing::debug!(
            "Deck reloaded: {} -> {} cards, cursor {} -> {}",
            self.deck.len(),
            records.len(),
            previous_cursor,
            cursor
        );

        self.deck = records;
        self.cursor = cursor;
    }

    /// Replace the deck and start from the first card
    pub fn replace(&mut self, records: Vec<ProfileRecord>) {
        tracing::debug!("Deck rebuilt with {} cards", records.len());
        self.deck = records;
        self.cursor = 0;
    }

    pub fn current(&self) -> Option<&ProfileRecord> {
        self.deck.get(self.cursor)
    }

    /// Card `n` positions behind the current one; `peek(0)` is the current card
    pub fn peek(&self, n: usize) -> Option<&ProfileRecord> {
        self.cursor
            .checked_add(n)
            .and_then(|index| self.deck.get(index))
    }

    /// Move to the next card, saturating at exhaustion
    pub fn advance(&mut self) {
        if self.cursor < self.deck.len() {
            self.cursor += 1;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.deck.len()
    }

    pub fn state(&self) -> DeckState {
        if self.deck.is_empty() {
            DeckState::Empty
        } else if self.is_exhausted() {
            DeckState::Exhausted
        } else {
            DeckState::Browsing
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    /// Cards not yet decided, including the current one
    pub fn remaining(&self) -> usize {
        self.deck.len() - self.cursor
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.deck
    }
}

/// Index of the record carrying `key` closest to `cursor`, earlier index on ties
fn nearest_with_key(records: &[ProfileRecord], key: RecordKey, cursor: usize) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.key() == key)
        .map(|(index, _)| index)
        .min_by_key(|index| index.abs_diff(cursor))
}
