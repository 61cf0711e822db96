// src/tests/router_tests/offers_tests.rs

use crate::errors::ServerError;
use crate::router::handle;
use crate::tests::utils::{call, json_request, make_app, request};
use serde_json::json;

#[test]
fn create_requires_description_and_client() {
    let app = make_app("offers_validation");

    let req = json_request("POST", "/offers", &json!({ "descripcion": "Portal" }));
    let err = handle(req, &app).unwrap_err();
    assert!(matches!(err, ServerError::Validation(_)));
    assert!(err.to_string().contains("Error al guardar la oferta"));

    let (_, offers) = call(&app, request("GET", "/offers", ""));
    assert_eq!(offers.as_array().unwrap().len(), 0);
}

#[test]
fn create_list_and_kpis() {
    let app = make_app("offers_create");

    let (status, created) = call(
        &app,
        json_request(
            "POST",
            "/offers",
            &json!({
                "descripcion": "Portal web",
                "cliente": "ACME",
                "fechaRecepcion": "2024-02-15",
                "fechaEntrega": "2024-03-01",
                "ingresosEstimados": 12000
            }),
        ),
    );
    assert_eq!(status, 201);
    assert_eq!(created["numeroOferta"], "001.2.24");
    assert_eq!(created["clienteFinal"], "ACME");
    assert_eq!(created["estado"], "EN PROCESO");
    assert_eq!(created["resultado"], "VACÍO");

    let (_, offers) = call(&app, request("GET", "/offers", ""));
    let first = &offers[0];
    assert_eq!(first["descripcion"], "Portal web");
    assert_eq!(first["needsAttention"], true);
    // a past delivery date on an open offer
    assert_eq!(first["deadline"], "overdue");
    assert_eq!(first["indicator"], "Vencida");

    let (_, kpis) = call(&app, request("GET", "/kpis", ""));
    assert_eq!(kpis, json!({ "totalOffers": 1, "wonOffers": 0 }));
}

#[test]
fn quick_updates_and_edit() {
    let app = make_app("offers_update");
    let (_, created) = call(
        &app,
        json_request("POST", "/offers", &json!({ "descripcion": "CRM", "cliente": "Beta" })),
    );
    let id = created["id"].as_i64().unwrap();

    let (_, updated) = call(
        &app,
        json_request("POST", &format!("/offers/{id}/result"), &json!({ "value": "OK" })),
    );
    assert_eq!(updated["resultado"], "OK");
    assert_eq!(updated["descripcion"], "CRM");

    let (_, updated) = call(
        &app,
        json_request("POST", &format!("/offers/{id}/status"), &json!({ "value": "ENTREGADA" })),
    );
    assert_eq!(updated["estado"], "ENTREGADA");

    let (_, form) = call(&app, request("GET", &format!("/offers/{id}/form"), ""));
    assert_eq!(form["clienteFinal"], "Beta");

    let (_, edited) = call(
        &app,
        json_request(
            "PUT",
            &format!("/offers/{id}"),
            &json!({ "numeroOferta": "999.1.99", "enviadoPor": "María García" }),
        ),
    );
    assert_eq!(edited["numeroOferta"], created["numeroOferta"]);
    assert_eq!(edited["enviadoPor"], "María García");
    assert_eq!(edited["resultado"], "OK");

    let (_, kpis) = call(&app, request("GET", "/kpis", ""));
    assert_eq!(kpis["wonOffers"], 1);
}

#[test]
fn search_and_in_progress_filter() {
    let app = make_app("offers_filter");
    for (description, client) in [("Portal web", "ACME"), ("Auditoría", "Beta")] {
        call(
            &app,
            json_request("POST", "/offers", &json!({ "descripcion": description, "cliente": client })),
        );
    }
    let (_, audit) = call(&app, request("GET", "/offers?q=beta", ""));
    assert_eq!(audit.as_array().unwrap().len(), 1);
    let id = audit[0]["id"].as_i64().unwrap();
    call(
        &app,
        json_request("POST", &format!("/offers/{id}/status"), &json!({ "value": "ENTREGADA" })),
    );

    let (_, open) = call(&app, request("GET", "/offers?in_progress=1", ""));
    let open = open.as_array().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["descripcion"], "Portal web");

    let (_, searched) = call(&app, request("GET", "/offers?q=Auditor%C3%ADa", ""));
    assert_eq!(searched[0]["deadline"], "suppressed");
    assert_eq!(searched[0]["indicator"], "-");
}

#[test]
fn bulk_delete_by_selection() {
    let app = make_app("offers_delete");
    let mut ids = Vec::new();
    for n in 0..3 {
        let (_, o) = call(
            &app,
            json_request("POST", "/offers", &json!({ "descripcion": format!("o{n}"), "cliente": "ACME" })),
        );
        ids.push(o["id"].as_i64().unwrap());
    }

    call(
        &app,
        json_request("POST", "/offers/selection", &json!({ "ids": ids, "selected": true })),
    );
    let (_, selection) = call(
        &app,
        json_request("POST", "/offers/selection", &json!({ "ids": [ids[1]], "selected": false })),
    );
    assert_eq!(selection, json!([ids[0], ids[2]]));

    let (_, deleted) = call(&app, json_request("POST", "/offers/delete", &json!({})));
    assert_eq!(deleted["deleted"], 2);

    let (_, selection) = call(&app, request("GET", "/offers/selection", ""));
    assert_eq!(selection, json!([]));
    let (_, offers) = call(&app, request("GET", "/offers", ""));
    assert_eq!(offers.as_array().unwrap().len(), 1);
    assert_eq!(offers[0]["id"], ids[1]);
}

#[test]
fn unknown_routes_and_ids() {
    let app = make_app("offers_errors");
    assert!(matches!(
        handle(request("GET", "/nowhere", ""), &app),
        Err(ServerError::NotFound)
    ));
    assert!(matches!(
        handle(request("PUT", "/offers/abc", "{}"), &app),
        Err(ServerError::BadRequest(_))
    ));
    assert!(matches!(
        handle(json_request("POST", "/offers/42/status", &json!({ "value": "OK" })), &app),
        Err(ServerError::NotFound)
    ));
}
