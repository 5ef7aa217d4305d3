use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Image shown when a profile has no picture of its own
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400";

/// Namespace for name-based record keys
const RECORD_KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a7e_93d4_4b1a_8e55_c0ad_de5e_c4a1);

/// Profile card shown in the discovery deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Source document identifier, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(rename = "image", default)]
    pub image_ref: String,
}

impl ProfileRecord {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            bio: String::new(),
            domain: String::new(),
            interests: Vec::new(),
            image_ref: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    /// Stable key for deck continuity across reloads
    ///
    /// Derived from the source identifier when present, otherwise from every
    /// field of the record, so two value-equal records share a key.
    pub fn key(&self) -> RecordKey {
        let name = match &self.id {
            Some(id) => format!("id:{}", id),
            None => format!(
                "fields:{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
                self.name,
                self.age,
                self.bio,
                self.domain,
                self.interests.join("\u{1e}"),
                self.image_ref,
            ),
        };
        RecordKey(Uuid::new_v5(&RECORD_KEY_NAMESPACE, name.as_bytes()))
    }

    pub fn has_interest(&self, interest: &str) -> bool {
        self.interests.iter().any(|i| i == interest)
    }

    pub fn image_or_placeholder(&self) -> &str {
        if self.image_ref.is_empty() {
            PLACEHOLDER_IMAGE
        } else {
            &self.image_ref
        }
    }
}

/// Synthetic identity of a profile record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey(pub Uuid);

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction a card left the deck in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Skip
    Left,
    /// Accept / connect
    Right,
}

/// A committed decision about one card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swipe {
    pub record: ProfileRecord,
    pub direction: SwipeDirection,
}

impl Swipe {
    pub fn is_accept(&self) -> bool {
        self.direction == SwipeDirection::Right
    }
}

/// Notification emitted for every accepted card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub key: RecordKey,
    pub name: String,
    pub message: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

impl ConnectionEvent {
    pub fn for_record(record: &ProfileRecord) -> Self {
        Self {
            key: record.key(),
            name: record.name.clone(),
            message: format!("✨ Connected with {}!", record.name),
            connected_at: chrono::Utc::now(),
        }
    }
}
