// src/tests/router_tests/import_export_tests.rs

use crate::errors::ServerError;
use crate::import::{read_rows, CellValue};
use crate::router::handle;
use crate::tests::utils::{body_bytes, call, make_app, request};
use rust_xlsxwriter::Workbook;

const CSV: &str = "\u{feff}N° Oferta,Descripcion,CLIENTE,Fecha Recepción,Fecha Entrega,Ingresos Estimados\n\
,Portal web,ACME,15/2/24,2024-03-01,12000\n\
OF-7,Soporte,Beta,2024-05-10,,\"45,000\"\n";

#[test]
fn import_csv_then_export_range() {
    let app = make_app("import_export");

    let (status, report) = call(&app, request("POST", "/offers/import?filename=lote.csv", CSV));
    assert_eq!(status, 201);
    assert_eq!(report["created"], 2);
    let offers = &report["offers"];
    assert_eq!(offers[0]["numeroOferta"], "001.2.24");
    assert_eq!(offers[0]["fechaRecepcion"], "2024-02-15");
    assert_eq!(offers[0]["ingresosEstimados"], 12000);
    assert_eq!(offers[1]["numeroOferta"], "OF-7");
    assert_eq!(offers[1]["ingresosEstimados"], 0);
    assert_eq!(offers[1]["clienteFinal"], "Beta");

    let resp = handle(request("GET", "/offers/export?from=2024-05-01", ""), &app).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()["Content-Disposition"],
        "attachment; filename=\"ofertas.xlsx\""
    );
    let rows = read_rows("ofertas.xlsx", &body_bytes(resp)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].1, CellValue::Text("OF-7".into()));

    let resp = handle(request("GET", "/offers/export", ""), &app).unwrap();
    assert_eq!(read_rows("ofertas.xlsx", &body_bytes(resp)).unwrap().len(), 2);
}

#[test]
fn import_rejects_unknown_file_types() {
    let app = make_app("import_bad_type");
    assert!(matches!(
        handle(request("POST", "/offers/import?filename=lote.txt", "x"), &app),
        Err(ServerError::BadRequest(_))
    ));
    assert!(matches!(
        handle(request("POST", "/offers/import", CSV), &app),
        Err(ServerError::BadRequest(_))
    ));
}

#[test]
fn export_rejects_malformed_bounds() {
    let app = make_app("export_bad_range");
    assert!(matches!(
        handle(request("GET", "/offers/export?to=15/02/2024", ""), &app),
        Err(ServerError::BadRequest(_))
    ));
}

#[test]
fn workbook_with_impossible_date_serial_imports_without_date() {
    let app = make_app("import_huge_serial");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Descripción").unwrap();
    sheet.write_string(0, 1, "Cliente").unwrap();
    sheet.write_string(0, 2, "Fecha Entrega").unwrap();
    sheet.write_string(1, 0, "Portal web").unwrap();
    sheet.write_string(1, 1, "ACME").unwrap();
    sheet.write_number(1, 2, 2.0e11).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let (status, report) = call(&app, request("POST", "/offers/import?filename=lote.xlsx", bytes));
    assert_eq!(status, 201);
    assert_eq!(report["offers"][0]["fechaEntrega"], "");

    // the server keeps answering afterwards
    let (_, offers) = call(&app, request("GET", "/offers", ""));
    assert_eq!(offers.as_array().unwrap().len(), 1);
    assert_eq!(offers[0]["deadline"], "no-deadline");
}
