use crate::app::App;
use crate::db::connection::{init_db, Database};
use crate::router::handle;
use crate::store::{LocalBlobStore, SqliteStore};
use astra::{Body, Request, Response};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

fn stamp() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

/// Fresh temporary database using the production schema
pub fn init_test_db(prefix: &str) -> (Database, PathBuf) {
    let tmp = std::env::temp_dir();
    let stamp = stamp();
    let db = Database::new(
        tmp.join(format!("{prefix}_{stamp}.sqlite"))
            .to_string_lossy()
            .into_owned(),
    );
    init_db(&db, "sql/schema.sql").unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    (db, tmp.join(format!("{prefix}_{stamp}_documents")))
}

/// Application on a fresh SQLite store, loaded as the server would
pub fn make_app(prefix: &str) -> Mutex<App> {
    let (db, blob_dir) = init_test_db(prefix);
    let blobs = LocalBlobStore::new(db.clone(), blob_dir).expect("blob dir");
    let mut app = App::new(Box::new(SqliteStore::new(db)), Box::new(blobs));
    app.refresh();
    Mutex::new(app)
}

pub fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &Value) -> Request {
    request(method, uri, body.to_string())
}

pub fn body_bytes(mut resp: Response) -> Vec<u8> {
    let mut bytes = Vec::new();
    resp.body_mut().reader().read_to_end(&mut bytes).unwrap();
    bytes
}

pub fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}

/// Sends the request, expecting success, and returns status and JSON body
pub fn call(app: &Mutex<App>, req: Request) -> (u16, Value) {
    let resp = handle(req, app).unwrap_or_else(|e| panic!("request failed: {e}"));
    (resp.status().as_u16(), body_json(resp))
}
