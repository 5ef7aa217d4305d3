use crate::config::SourceSettings;
use crate::models::ProfileRecord;
use crate::services::people_source::{ConnectivityError, PeopleSource};
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Firestore REST client for the people collection
///
/// Uses the `documents:runQuery` endpoint so the unfiltered and filtered
/// fetches share one request shape:
/// - `fetch_all` sends a bare `structuredQuery`
/// - `fetch_filtered` adds `EQUAL` on `domain` and `ARRAY_CONTAINS` on `interests`
pub struct FirestorePeopleSource {
    base_url: String,
    project_id: String,
    database: String,
    collection: String,
    api_key: Option<String>,
    client: Client,
}

impl FirestorePeopleSource {
    /// Create a new Firestore client
    pub fn new(settings: &SourceSettings) -> Result<Self, ConnectivityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.endpoint.clone(),
            project_id: settings.project_id.clone(),
            database: settings.database.clone(),
            collection: settings.collection.clone(),
            api_key: settings.api_key.clone(),
            client,
        })
    }

    fn run_query_url(&self) -> String {
        let url = format!(
            "{}/projects/{}/databases/{}/documents:runQuery",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        );

        match &self.api_key {
            Some(key) => format!("{}?key={}", url, urlencoding::encode(key)),
            None => url,
        }
    }

    /// Build the `structuredQuery` body for the given predicates
    fn query_body(&self, domain: Option<&str>, interest: Option<&str>) -> Value {
        let mut filters = Vec::new();

        if let Some(domain) = domain {
            filters.push(field_filter("domain", "EQUAL", domain));
        }
        if let Some(interest) = interest {
            filters.push(field_filter("interests", "ARRAY_CONTAINS", interest));
        }

        let mut query = json!({
            "from": [{ "collectionId": self.collection }],
        });

        let where_clause = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            })),
        };

        if let (Some(clause), Some(obj)) = (where_clause, query.as_object_mut()) {
            obj.insert("where".to_string(), clause);
        }

        json!({ "structuredQuery": query })
    }

    async fn run_query(&self, body: Value) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        let url = self.run_query_url();

        tracing::debug!("Querying collection {} in project {}", self.collection, self.project_id);

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ConnectivityError::Unauthorized);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Firestore query failed: {} - {}", status, message);
            return Err(ConnectivityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response.json().await?;

        let rows = json
            .as_array()
            .ok_or_else(|| ConnectivityError::InvalidResponse("Expected an array of query results".into()))?;

        // Rows without a document only carry a readTime
        let people: Vec<ProfileRecord> = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect::<Result<_, _>>()?;

        tracing::debug!("Fetched {} people from Firestore", people.len());

        Ok(people)
    }
}

impl PeopleSource for FirestorePeopleSource {
    async fn fetch_all(&self) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        self.run_query(self.query_body(None, None)).await
    }

    async fn fetch_filtered(
        &self,
        domain: Option<&str>,
        interest: Option<&str>,
    ) -> Result<Vec<ProfileRecord>, ConnectivityError> {
        self.run_query(self.query_body(domain, interest)).await
    }
}

fn field_filter(field: &str, op: &str, value: &str) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field },
            "op": op,
            "value": { "stringValue": value }
        }
    })
}

/// Map a Firestore document onto a profile record
///
/// Missing or mistyped fields fall back to their empty defaults, matching how
/// the mobile client maps documents.
fn decode_document(document: &Value) -> Result<ProfileRecord, ConnectivityError> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ConnectivityError::InvalidResponse("Document without a name".into()))?;

    let empty = Map::new();
    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    Ok(ProfileRecord {
        id: Some(name.to_string()),
        name: string_field(fields, "name"),
        age: integer_field(fields, "age"),
        bio: string_field(fields, "bio"),
        domain: string_field(fields, "domain"),
        interests: string_array_field(fields, "interests"),
        image_ref: string_field(fields, "image"),
    })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn integer_field(fields: &Map<String, Value>, key: &str) -> u32 {
    let Some(value) = fields.get(key) else {
        return 0;
    };

    // integerValue is serialized as a string, doubleValue as a number
    if let Some(int) = value.get("integerValue") {
        let parsed = match int {
            Value::String(s) => s.parse::<i64>().ok(),
            other => other.as_i64(),
        };
        return parsed.and_then(|n| u32::try_from(n).ok()).unwrap_or(0);
    }

    value
        .get("doubleValue")
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u32)
        .unwrap_or(0)
}

fn string_array_field(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(|v| v.get("arrayValue"))
        .and_then(|v| v.get("values"))
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.get("stringValue").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
