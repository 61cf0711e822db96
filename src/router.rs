use crate::app::{App, OfferFilter};
use crate::domain::fields::OfferField;
use crate::domain::offer::{OfferFields, OfferId, OfferPatch};
use crate::errors::ServerError;
use crate::responses::{json_response, json_response_with_status, xlsx_response, ResultResp};
use crate::spreadsheets::{DateRange, EXPORT_FILE_NAME};
use crate::store::{DocumentId, ReferenceKind};
use astra::Request;
use chrono::{Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Mutex, MutexGuard};

#[derive(Deserialize)]
struct ValueBody {
    value: String,
}

#[derive(Deserialize)]
struct IdsBody {
    #[serde(default)]
    ids: Vec<OfferId>,
}

#[derive(Deserialize)]
struct SelectionBody {
    ids: Vec<OfferId>,
    selected: bool,
}

pub fn handle(mut req: Request, app: &Mutex<App>) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = parse_query(&req);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["offers"]) => {
            let filter = OfferFilter {
                search: query.get("q").cloned(),
                only_in_progress: flag(&query, "in_progress"),
            };
            let app = lock(app)?;
            json_response(&app.views(&filter, Utc::now()))
        }
        ("POST", ["offers"]) => {
            let map: Map<String, Value> = read_json(&mut req)?;
            let form = OfferFields::from_json_map(&map, OfferField::canonical);
            let offer = lock(app)?.save_offer(None, form, today())?;
            json_response_with_status(201, &offer.to_json())
        }
        ("POST", ["refresh"]) => {
            let mut app = lock(app)?;
            app.refresh();
            json_response(&json!({ "offers": app.state.offers.len() }))
        }
        ("POST", ["offers", "import"]) => {
            let file_name = query
                .get("filename")
                .filter(|f| !f.trim().is_empty())
                .ok_or_else(|| ServerError::BadRequest("Missing filename".into()))?
                .clone();
            let bytes = read_body(&mut req)?;
            let created = lock(app)?.import(&file_name, &bytes, today())?;
            let offers: Vec<Value> = created.iter().map(|o| o.to_json()).collect();
            json_response_with_status(201, &json!({ "created": offers.len(), "offers": offers }))
        }
        ("GET", ["offers", "export"]) => {
            let range = DateRange {
                from: date_param(&query, "from")?,
                to: date_param(&query, "to")?,
            };
            let buffer = lock(app)?.export(range)?;
            xlsx_response(buffer, EXPORT_FILE_NAME)
        }
        ("GET", ["offers", "selection"]) => {
            let app = lock(app)?;
            json_response(&app.state.selection)
        }
        ("POST", ["offers", "selection"]) => {
            let body: SelectionBody = read_json(&mut req)?;
            let mut app = lock(app)?;
            app.select_all(&body.ids, body.selected);
            json_response(&app.state.selection)
        }
        // Without ids, deletes the current selection.
        ("POST", ["offers", "delete"]) => {
            let body: IdsBody = read_json(&mut req)?;
            let mut app = lock(app)?;
            let deleted = if body.ids.is_empty() {
                app.delete_selected()?
            } else {
                app.delete_offers(&body.ids)?
            };
            json_response(&json!({ "deleted": deleted }))
        }
        ("GET", ["offers", id, "form"]) => {
            let id = OfferId(parse_id(id)?);
            let app = lock(app)?;
            let offer = app.offer(id).ok_or(ServerError::NotFound)?;
            json_response(&Value::Object(
                offer.edit_form().to_json_map(OfferField::canonical),
            ))
        }
        ("PUT", ["offers", id]) => {
            let id = OfferId(parse_id(id)?);
            let map: Map<String, Value> = read_json(&mut req)?;
            let mut app = lock(app)?;
            let mut form = app.offer(id).ok_or(ServerError::NotFound)?.edit_form();
            OfferPatch::from_json(&map).apply_to(&mut form);
            let offer = app.save_offer(Some(id), form, today())?;
            json_response(&offer.to_json())
        }
        ("POST", ["offers", id, "status"]) => {
            let id = OfferId(parse_id(id)?);
            let body: ValueBody = read_json(&mut req)?;
            let offer = lock(app)?.update_status(id, &body.value)?;
            json_response(&offer.to_json())
        }
        ("POST", ["offers", id, "result"]) => {
            let id = OfferId(parse_id(id)?);
            let body: ValueBody = read_json(&mut req)?;
            let offer = lock(app)?.update_result(id, &body.value)?;
            json_response(&offer.to_json())
        }
        ("GET", ["offers", id, "documents"]) => {
            let id = OfferId(parse_id(id)?);
            json_response(&lock(app)?.documents(id)?)
        }
        ("POST", ["offers", id, "documents"]) => {
            let id = OfferId(parse_id(id)?);
            let file_name = query
                .get("filename")
                .cloned()
                .unwrap_or_else(|| "documento".to_string());
            let bytes = read_body(&mut req)?;
            let doc = lock(app)?.attach_document(id, &bytes, &file_name)?;
            json_response_with_status(201, &doc)
        }
        ("DELETE", ["documents", id]) => {
            let id = DocumentId(parse_id(id)?);
            lock(app)?.remove_document(id)?;
            json_response(&json!({ "deleted": 1 }))
        }
        ("POST", ["documents", "discard-orphans"]) => {
            let removed = lock(app)?.discard_orphan_documents()?;
            json_response(&json!({ "removed": removed }))
        }
        ("GET", ["kpis"]) => json_response(&lock(app)?.kpis()),
        ("GET", ["references"]) => json_response(&lock(app)?.state.references),
        ("POST", ["references", kind]) => {
            let kind = ReferenceKind::from_slug(kind).ok_or(ServerError::NotFound)?;
            let body: ValueBody = read_json(&mut req)?;
            let mut app = lock(app)?;
            app.add_reference(kind, &body.value)?;
            json_response(&app.state.references)
        }
        _ => Err(ServerError::NotFound),
    }
}

fn lock(app: &Mutex<App>) -> Result<MutexGuard<'_, App>, ServerError> {
    app.lock().map_err(|_| ServerError::InternalError)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn flag(query: &HashMap<String, String>, key: &str) -> bool {
    matches!(query.get(key).map(String::as_str), Some("1" | "true"))
}

fn date_param(query: &HashMap<String, String>, key: &str) -> Result<Option<NaiveDate>, ServerError> {
    match query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ServerError::BadRequest(format!("Invalid date for {key}: {v}"))),
    }
}

fn parse_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("Invalid id: {raw}")))
}

fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let mut bytes = Vec::new();
    req.body_mut()
        .reader()
        .read_to_end(&mut bytes)
        .map_err(|e| ServerError::BadRequest(format!("Unreadable body: {e}")))?;
    Ok(bytes)
}

fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let bytes = read_body(req)?;
    serde_json::from_slice(&bytes).map_err(|e| ServerError::BadRequest(format!("Invalid JSON: {e}")))
}
