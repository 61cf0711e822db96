// src/tests/router_tests/references_tests.rs

use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{call, json_request, make_app, request};
use serde_json::json;

#[test]
fn empty_store_falls_back_to_defaults() {
    let app = make_app("references_defaults");
    let (_, refs) = call(&app, request("GET", "/references", ""));
    assert_eq!(refs["clients"], json!([]));
    assert_eq!(refs["sellers"], json!(["Juan Pérez", "María García"]));
    assert_eq!(refs["statuses"], json!(["EN PROCESO", "ENTREGADA"]));
    assert_eq!(refs["results"], json!(["VACÍO", "OK", "KO", "NO GO"]));
}

#[test]
fn added_values_are_listed_and_persisted() {
    let app = make_app("references_add");
    call(&app, json_request("POST", "/references/clients", &json!({ "value": "Zeta" })));
    let (_, refs) = call(
        &app,
        json_request("POST", "/references/clients", &json!({ "value": "Alfa" })),
    );
    assert_eq!(refs["clients"], json!(["Alfa", "Zeta"]));

    // reloading reads them back from the store
    call(&app, request("POST", "/refresh", ""));
    let (_, refs) = call(&app, request("GET", "/references", ""));
    assert_eq!(refs["clients"], json!(["Alfa", "Zeta"]));
}

#[test]
fn unknown_list_and_blank_value() {
    let app = make_app("references_errors");
    assert!(matches!(
        handle(json_request("POST", "/references/colors", &json!({ "value": "rojo" })), &app),
        Err(ServerError::NotFound)
    ));
    assert!(matches!(
        handle(json_request("POST", "/references/sellers", &json!({ "value": " " })), &app),
        Err(ServerError::Validation(_))
    ));
}
