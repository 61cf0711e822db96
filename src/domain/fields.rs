// src/domain/fields.rs

/// The writable offer fields.
///
/// This is the one place that knows how a field is spelled in each context:
/// the canonical JSON key used by the application (`numeroOferta`), the
/// column name used by the record store (`numero_oferta`) and the header
/// written to exported spreadsheets (`Nº Oferta`). Store gateways translate
/// through this table and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OfferField {
    OfferNumber,
    Description,
    Client,
    FinalClient,
    Seller,
    ReceivedOn,
    DueOn,
    Status,
    Result,
    EstimatedRevenue,
}

impl OfferField {
    /// Every field, in export column order.
    pub const ALL: [OfferField; 10] = [
        OfferField::OfferNumber,
        OfferField::Description,
        OfferField::Client,
        OfferField::FinalClient,
        OfferField::Seller,
        OfferField::ReceivedOn,
        OfferField::DueOn,
        OfferField::Status,
        OfferField::Result,
        OfferField::EstimatedRevenue,
    ];

    pub fn canonical(self) -> &'static str {
        match self {
            OfferField::OfferNumber => "numeroOferta",
            OfferField::Description => "descripcion",
            OfferField::Client => "cliente",
            OfferField::FinalClient => "clienteFinal",
            OfferField::Seller => "enviadoPor",
            OfferField::ReceivedOn => "fechaRecepcion",
            OfferField::DueOn => "fechaEntrega",
            OfferField::Status => "estado",
            OfferField::Result => "resultado",
            OfferField::EstimatedRevenue => "ingresosEstimados",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            OfferField::OfferNumber => "numero_oferta",
            OfferField::Description => "descripcion",
            OfferField::Client => "cliente",
            OfferField::FinalClient => "cliente_final",
            OfferField::Seller => "enviado_por",
            OfferField::ReceivedOn => "fecha_recepcion",
            OfferField::DueOn => "fecha_entrega",
            OfferField::Status => "estado",
            OfferField::Result => "resultado",
            OfferField::EstimatedRevenue => "ingresos_estimados",
        }
    }

    pub fn export_header(self) -> &'static str {
        match self {
            OfferField::OfferNumber => "Nº Oferta",
            OfferField::Description => "Descripción",
            OfferField::Client => "Cliente",
            OfferField::FinalClient => "Cliente Final",
            OfferField::Seller => "Enviado por",
            OfferField::ReceivedOn => "Fecha Recepción",
            OfferField::DueOn => "Fecha Entrega",
            OfferField::Status => "Estado",
            OfferField::Result => "Resultado",
            OfferField::EstimatedRevenue => "Ingresos",
        }
    }

    /// Accepted import headers, tried in order. Compared after normalization,
    /// so accents, case and spacing do not matter here.
    pub fn import_headers(self) -> &'static [&'static str] {
        match self {
            OfferField::OfferNumber => &[
                "nº oferta",
                "n° oferta",
                "no oferta",
                "numero oferta",
                "numerooferta",
                "numero_oferta",
            ],
            OfferField::Description => &["descripcion", "descripción"],
            OfferField::Client => &["cliente"],
            OfferField::FinalClient => &["cliente final", "clientefinal", "cliente_final"],
            OfferField::Seller => &["enviado por", "enviadopor", "enviado_por"],
            OfferField::ReceivedOn => &[
                "fecha recepcion",
                "fecha recepción",
                "fecharecepcion",
                "fecha_recepcion",
            ],
            OfferField::DueOn => &["fecha entrega", "fechaentrega", "fecha_entrega"],
            OfferField::Status => &["estado"],
            OfferField::Result => &["resultado"],
            OfferField::EstimatedRevenue => &[
                "ingresos",
                "ingresosestimados",
                "ingresos estimados",
                "ingresos_estimados",
            ],
        }
    }
}

/// A value headed for one store column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
}

impl FieldValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(n) => serde_json::Value::from(*n),
        }
    }
}
