// src/store/rest.rs
//
// Record store on a hosted PostgREST-style backend (tables exposed under
// `/rest/v1/<table>`, filters such as `id=eq.7` in the query string).

use super::{RecordStore, ReferenceKind};
use crate::domain::fields::OfferField;
use crate::domain::offer::{NewOffer, Offer, OfferId, OfferPatch};
use crate::errors::ServerError;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct RestStore {
    base: Url,
    api_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ServerError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| ServerError::BadRequest(format!("Invalid store URL {base_url}: {e}")))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            base,
            api_key: api_key.into(),
            client,
        })
    }

    /// `<base>/rest/v1/<table>?<query>`
    pub fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, ServerError> {
        let mut url = self
            .base
            .join(&format!("rest/v1/{table}"))
            .map_err(|e| ServerError::BadRequest(format!("Invalid table path {table}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Sends the request and returns the JSON array the backend answers with.
    fn send(&self, req: RequestBuilder) -> Result<Vec<Value>, ServerError> {
        let resp = req.send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(ServerError::Transport(format!("Unreadable store answer: {e}"))),
        }
    }

    fn first_offer(rows: Vec<Value>) -> Result<Offer, ServerError> {
        let row = rows.into_iter().next().ok_or(ServerError::NotFound)?;
        let map = row
            .as_object()
            .ok_or_else(|| ServerError::Transport("store row is not an object".into()))?;
        Offer::from_store_json(map)
    }
}

/// Data rejections (bad request, conflict, unprocessable) mean the store
/// refused the data. Auth failures, missing tables, timeouts and everything
/// else mean it could not serve the call.
pub fn error_for_status(status: StatusCode, body: &str) -> ServerError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ServerError::Validation(format!("{status}: {detail}"))
        }
        _ => ServerError::Transport(format!("{status}: {detail}")),
    }
}

fn patch_body(patch: &OfferPatch) -> Value {
    let map: Map<String, Value> = patch
        .changes()
        .iter()
        .map(|(f, v)| (f.column().to_string(), v.to_json()))
        .collect();
    Value::Object(map)
}

fn id_list(ids: &[OfferId]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("in.({})", ids.join(","))
}

impl RecordStore for RestStore {
    fn list_offers(&self) -> Result<Vec<Offer>, ServerError> {
        let url = self.table_url(
            "offers",
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )?;
        self.send(self.request(Method::GET, url))?
            .iter()
            .filter_map(Value::as_object)
            .map(Offer::from_store_json)
            .collect()
    }

    fn create_offer(&self, offer: &NewOffer) -> Result<Offer, ServerError> {
        let url = self.table_url("offers", &[])?;
        let body = Value::Array(vec![Value::Object(offer.to_json_map(OfferField::column))]);
        let req = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&body);
        Self::first_offer(self.send(req)?)
    }

    fn update_offer(&self, id: OfferId, patch: &OfferPatch) -> Result<Offer, ServerError> {
        let url = self.table_url("offers", &[("id", format!("eq.{id}"))])?;
        let req = if patch.is_empty() {
            self.request(Method::GET, url)
        } else {
            self.request(Method::PATCH, url)
                .header("Prefer", "return=representation")
                .json(&patch_body(patch))
        };
        Self::first_offer(self.send(req)?)
    }

    fn delete_offers(&self, ids: &[OfferId]) -> Result<(), ServerError> {
        if ids.is_empty() {
            return Ok(());
        }
        let url = self.table_url("offers", &[("id", id_list(ids))])?;
        self.send(self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn list_references(&self, kind: ReferenceKind) -> Result<Vec<String>, ServerError> {
        let col = kind.column();
        let url = self.table_url(
            kind.table(),
            &[("select", col.to_string()), ("order", col.to_string())],
        )?;
        Ok(self
            .send(self.request(Method::GET, url))?
            .iter()
            .filter_map(|row| row.get(col).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    fn add_reference(&self, kind: ReferenceKind, value: &str) -> Result<(), ServerError> {
        let url = self.table_url(kind.table(), &[])?;
        let mut row = Map::new();
        row.insert(kind.column().to_string(), Value::String(value.to_string()));
        let req = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=ignore-duplicates")
            .json(&Value::Array(vec![Value::Object(row)]));
        self.send(req)?;
        Ok(())
    }
}
