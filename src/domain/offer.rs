// src/domain/offer.rs

use crate::domain::fields::{FieldValue, OfferField};
use crate::errors::ServerError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STATUS_IN_PROGRESS: &str = "EN PROCESO";
pub const STATUS_DELIVERED: &str = "ENTREGADA";
pub const RESULT_EMPTY: &str = "VACÍO";
pub const RESULT_WON: &str = "OK";
pub const RESULT_NO_GO: &str = "NO GO";

/// Offered when the store has no status list. Not a closed set: any other
/// status coming from the store or an import is kept as-is.
pub const DEFAULT_STATUSES: [&str; 2] = [STATUS_IN_PROGRESS, STATUS_DELIVERED];
/// Offered when the store has no result list. Same open-set rule as statuses.
pub const DEFAULT_RESULTS: [&str; 4] = [RESULT_EMPTY, RESULT_WON, "KO", RESULT_NO_GO];

/// Store-assigned, opaque offer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(pub i64);

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The writable part of an offer. Doubles as the creation request and as the
/// edit form, so every field is always populated (dates use "" for absent).
#[derive(Debug, Clone, PartialEq)]
pub struct OfferFields {
    pub offer_number: String,
    pub description: String,
    pub client: String,
    pub final_client: String,
    pub seller: String,
    pub received_on: String,
    pub due_on: String,
    pub status: String,
    pub result: String,
    pub estimated_revenue: i64,
}

/// A canonical offer-creation request.
pub type NewOffer = OfferFields;

impl Default for OfferFields {
    fn default() -> Self {
        Self {
            offer_number: String::new(),
            description: String::new(),
            client: String::new(),
            final_client: String::new(),
            seller: String::new(),
            received_on: String::new(),
            due_on: String::new(),
            status: STATUS_IN_PROGRESS.to_string(),
            result: RESULT_EMPTY.to_string(),
            estimated_revenue: 0,
        }
    }
}

impl OfferFields {
    pub fn get(&self, field: OfferField) -> FieldValue {
        let text = |s: &String| FieldValue::Text(s.clone());
        match field {
            OfferField::OfferNumber => text(&self.offer_number),
            OfferField::Description => text(&self.description),
            OfferField::Client => text(&self.client),
            OfferField::FinalClient => text(&self.final_client),
            OfferField::Seller => text(&self.seller),
            OfferField::ReceivedOn => text(&self.received_on),
            OfferField::DueOn => text(&self.due_on),
            OfferField::Status => text(&self.status),
            OfferField::Result => text(&self.result),
            OfferField::EstimatedRevenue => FieldValue::Int(self.estimated_revenue),
        }
    }

    pub fn set(&mut self, field: OfferField, value: FieldValue) {
        let slot = match field {
            OfferField::OfferNumber => &mut self.offer_number,
            OfferField::Description => &mut self.description,
            OfferField::Client => &mut self.client,
            OfferField::FinalClient => &mut self.final_client,
            OfferField::Seller => &mut self.seller,
            OfferField::ReceivedOn => &mut self.received_on,
            OfferField::DueOn => &mut self.due_on,
            OfferField::Status => &mut self.status,
            OfferField::Result => &mut self.result,
            OfferField::EstimatedRevenue => {
                self.estimated_revenue = match value {
                    FieldValue::Int(n) => n.max(0),
                    FieldValue::Text(s) => coerce_revenue(&s),
                };
                return;
            }
        };
        *slot = match value {
            FieldValue::Text(s) => s,
            FieldValue::Int(n) => n.to_string(),
        };
    }

    /// All fields as store assignments, in column order.
    pub fn assignments(&self) -> Vec<(OfferField, FieldValue)> {
        OfferField::ALL.iter().map(|f| (*f, self.get(*f))).collect()
    }

    /// Description and client are required before anything is persisted.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.description.trim().is_empty() || self.client.trim().is_empty() {
            return Err(ServerError::Validation(
                "Por favor completa los campos obligatorios: Descripción y Cliente".into(),
            ));
        }
        Ok(())
    }

    /// Apply the data-model defaults: final client falls back to client,
    /// blank status/result fall back to the defaults.
    pub fn with_defaults(mut self) -> Self {
        if self.final_client.trim().is_empty() {
            self.final_client = self.client.clone();
        }
        if self.status.trim().is_empty() {
            self.status = STATUS_IN_PROGRESS.to_string();
        }
        if self.result.trim().is_empty() {
            self.result = RESULT_EMPTY.to_string();
        }
        self.estimated_revenue = self.estimated_revenue.max(0);
        self
    }

    /// Serialize under the naming chosen by `key` (canonical or store column).
    pub fn to_json_map(&self, key: fn(OfferField) -> &'static str) -> Map<String, Value> {
        let mut map = Map::new();
        for (field, value) in self.assignments() {
            map.insert(key(field).to_string(), value.to_json());
        }
        map
    }

    /// Read fields named by `key`; missing or null entries keep their default.
    pub fn from_json_map(map: &Map<String, Value>, key: fn(OfferField) -> &'static str) -> Self {
        let mut fields = OfferFields::default();
        for field in OfferField::ALL {
            if let Some(value) = map.get(key(field)).and_then(json_to_field_value) {
                fields.set(field, value);
            }
        }
        fields
    }
}

/// A stored offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub fields: OfferFields,
    /// Number of documents attached in the blob store. Never persisted.
    pub docs_count: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Offer {
    /// Canonical JSON, as served to clients.
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.to_json_map(OfferField::canonical);
        map.insert("id".into(), Value::from(self.id.0));
        map.insert("docsCount".into(), Value::from(self.docs_count));
        map.insert("createdAt".into(), timestamp_json(self.created_at));
        map.insert("updatedAt".into(), timestamp_json(self.updated_at));
        Value::Object(map)
    }

    /// Store-side JSON row (underscore names), as returned by the hosted backend.
    pub fn from_store_json(map: &Map<String, Value>) -> Result<Self, ServerError> {
        let id = map
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| ServerError::Transport("store row without numeric id".into()))?;
        let ts = |k: &str| {
            map.get(k)
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
        };
        Ok(Offer {
            id: OfferId(id),
            fields: OfferFields::from_json_map(map, OfferField::column),
            docs_count: 0,
            created_at: ts("created_at"),
            updated_at: ts("updated_at"),
        })
    }

    /// The edit form for this offer: what the user sees before changing it.
    pub fn edit_form(&self) -> OfferFields {
        self.fields.clone().with_defaults()
    }

    /// Placeholder shown when the offer list cannot be read.
    pub fn sample() -> Offer {
        Offer {
            id: OfferId(1),
            fields: OfferFields {
                offer_number: "OF-2024-001".into(),
                description: "Sistema de gestión empresarial completo".into(),
                client: "TechCorp Solutions".into(),
                final_client: "TechCorp Solutions".into(),
                seller: "Juan Pérez".into(),
                received_on: "2024-01-15".into(),
                due_on: "2024-02-15".into(),
                status: STATUS_IN_PROGRESS.into(),
                result: RESULT_WON.into(),
                estimated_revenue: 45000,
            },
            docs_count: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

/// A partial update: only the listed fields change at the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferPatch {
    changes: Vec<(OfferField, FieldValue)>,
}

impl OfferPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: OfferField, value: FieldValue) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self.changes.push((field, value));
        self
    }

    pub fn text(self, field: OfferField, value: impl Into<String>) -> Self {
        self.set(field, FieldValue::Text(value.into()))
    }

    /// Every field of a form. Used by the full edit.
    pub fn from_fields(fields: &OfferFields) -> Self {
        Self {
            changes: fields.assignments(),
        }
    }

    /// Only the canonical keys present in `map`.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let mut patch = OfferPatch::new();
        for field in OfferField::ALL {
            if let Some(value) = map.get(field.canonical()).and_then(json_to_field_value) {
                patch = patch.set(field, value);
            }
        }
        patch
    }

    pub fn without(mut self, field: OfferField) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self
    }

    pub fn changes(&self) -> &[(OfferField, FieldValue)] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply_to(&self, fields: &mut OfferFields) {
        for (field, value) in &self.changes {
            fields.set(*field, value.clone());
        }
    }
}

/// Revenue is a non-negative integer. Anything that does not parse as one
/// (including "45,000" and "") becomes 0.
pub fn coerce_revenue(raw: &str) -> i64 {
    raw.trim().parse::<i64>().map(|n| n.max(0)).unwrap_or(0)
}

/// Lenient calendar-date reading for stored date text.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn json_to_field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(FieldValue::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(FieldValue::Int),
        Value::Bool(b) => Some(FieldValue::Text(b.to_string())),
        _ => None,
    }
}

fn timestamp_json(ts: Option<DateTime<Utc>>) -> Value {
    ts.map(|t| Value::String(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}
