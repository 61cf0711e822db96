// src/tests/router_tests/documents_tests.rs

use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{call, json_request, make_app, request};
use serde_json::json;

#[test]
fn attach_list_and_remove() {
    let app = make_app("documents_flow");
    let (_, offer) = call(
        &app,
        json_request("POST", "/offers", &json!({ "descripcion": "Portal", "cliente": "ACME" })),
    );
    let id = offer["id"].as_i64().unwrap();

    let (status, doc) = call(
        &app,
        request("POST", &format!("/offers/{id}/documents?filename=pliego.pdf"), "%PDF-1.4"),
    );
    assert_eq!(status, 201);
    assert_eq!(doc["fileName"], "pliego.pdf");
    assert_eq!(doc["sizeBytes"], 8);
    assert!(doc.get("objectKey").is_none());

    let (_, offers) = call(&app, request("GET", "/offers", ""));
    assert_eq!(offers[0]["docsCount"], 1);

    let (_, docs) = call(&app, request("GET", &format!("/offers/{id}/documents"), ""));
    assert_eq!(docs.as_array().unwrap().len(), 1);

    let doc_id = doc["id"].as_i64().unwrap();
    call(&app, request("DELETE", &format!("/documents/{doc_id}"), ""));
    let (_, offers) = call(&app, request("GET", "/offers", ""));
    assert_eq!(offers[0]["docsCount"], 0);

    let (_, swept) = call(&app, request("POST", "/documents/discard-orphans", ""));
    assert_eq!(swept["removed"], 0);
}

#[test]
fn deleting_an_offer_removes_its_documents() {
    let app = make_app("documents_cascade");
    let (_, offer) = call(
        &app,
        json_request("POST", "/offers", &json!({ "descripcion": "Portal", "cliente": "ACME" })),
    );
    let id = offer["id"].as_i64().unwrap();
    call(&app, request("POST", &format!("/offers/{id}/documents?filename=a.txt"), "a"));

    call(&app, json_request("POST", "/offers/delete", &json!({ "ids": [id] })));
    let (_, docs) = call(&app, request("GET", &format!("/offers/{id}/documents"), ""));
    assert_eq!(docs, json!([]));
}

#[test]
fn attaching_to_unknown_offer_is_not_found() {
    let app = make_app("documents_unknown");
    assert!(matches!(
        handle(request("POST", "/offers/9/documents?filename=a.txt", "a"), &app),
        Err(ServerError::NotFound)
    ));
}
