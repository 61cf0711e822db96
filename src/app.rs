// src/app.rs
//
// Application state and the user actions that change it. Every action runs
// to completion against the stores before the in-memory state is touched,
// so a failed write leaves the state as it was.

use crate::domain::deadline::OfferView;
use crate::domain::fields::OfferField;
use crate::domain::numbering::generate_offer_number;
use crate::domain::offer::{
    Offer, OfferFields, OfferId, OfferPatch, DEFAULT_RESULTS, DEFAULT_STATUSES, RESULT_WON,
    STATUS_IN_PROGRESS,
};
use crate::errors::ServerError;
use crate::import;
use crate::spreadsheets::{export_offers_xlsx, DateRange};
use crate::store::{BlobStore, Document, DocumentId, RecordStore, ReferenceKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

const SAMPLE_SELLERS: [&str; 2] = ["Juan Pérez", "María García"];

/// Choices offered by the offer form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReferenceLists {
    pub clients: Vec<String>,
    pub sellers: Vec<String>,
    pub statuses: Vec<String>,
    pub results: Vec<String>,
}

impl ReferenceLists {
    fn list_mut(&mut self, kind: ReferenceKind) -> &mut Vec<String> {
        match kind {
            ReferenceKind::Clients => &mut self.clients,
            ReferenceKind::Sellers => &mut self.sellers,
            ReferenceKind::Statuses => &mut self.statuses,
            ReferenceKind::Results => &mut self.results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_offers: usize,
    pub won_offers: usize,
}

/// What the offer list is narrowed to.
#[derive(Debug, Clone, Default)]
pub struct OfferFilter {
    /// Case-insensitive substring over number, description, clients and seller.
    pub search: Option<String>,
    pub only_in_progress: bool,
}

impl OfferFilter {
    pub fn matches(&self, offer: &Offer) -> bool {
        if self.only_in_progress && offer.fields.status.to_uppercase() != STATUS_IN_PROGRESS {
            return false;
        }
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        let f = &offer.fields;
        [&f.offer_number, &f.description, &f.client, &f.final_client, &f.seller]
            .iter()
            .any(|s| s.to_lowercase().contains(&term))
    }
}

/// The state the presentation layer works on.
#[derive(Debug, Default)]
pub struct AppState {
    /// Newest first.
    pub offers: Vec<Offer>,
    pub selection: BTreeSet<OfferId>,
    pub references: ReferenceLists,
}

pub struct App {
    records: Box<dyn RecordStore>,
    blobs: Box<dyn BlobStore>,
    pub state: AppState,
}

impl App {
    pub fn new(records: Box<dyn RecordStore>, blobs: Box<dyn BlobStore>) -> Self {
        Self {
            records,
            blobs,
            state: AppState::default(),
        }
    }

    /// Reloads offers and reference lists. Read failures degrade to sample
    /// data and fallback lists instead of failing.
    pub fn refresh(&mut self) {
        self.load_offers();
        self.load_references();
    }

    pub fn load_offers(&mut self) {
        let mut offers = match self.records.list_offers() {
            Ok(offers) => offers,
            Err(err) => {
                tracing::warn!(error = %err, "offer list unavailable, showing sample data");
                vec![Offer::sample()]
            }
        };
        let counts = self.blobs.count_by_offer().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "document counts unavailable");
            HashMap::new()
        });
        for offer in &mut offers {
            offer.docs_count = counts.get(&offer.id).copied().unwrap_or(0);
        }
        self.state.selection.retain(|id| offers.iter().any(|o| o.id == *id));
        self.state.offers = offers;
    }

    pub fn load_references(&mut self) {
        let read = |kind: ReferenceKind| {
            self.records.list_references(kind).unwrap_or_else(|err| {
                tracing::warn!(list = kind.slug(), error = %err, "reference list unavailable");
                Vec::new()
            })
        };
        let clients = read(ReferenceKind::Clients);
        let mut sellers = read(ReferenceKind::Sellers);
        let mut statuses = read(ReferenceKind::Statuses);
        let mut results = read(ReferenceKind::Results);

        if sellers.is_empty() {
            let known: BTreeSet<&str> = self
                .state
                .offers
                .iter()
                .map(|o| o.fields.seller.as_str())
                .filter(|s| !s.trim().is_empty())
                .collect();
            sellers = known.into_iter().map(str::to_string).collect();
        }
        if sellers.is_empty() {
            sellers = SAMPLE_SELLERS.iter().map(|s| s.to_string()).collect();
        }
        if statuses.is_empty() {
            statuses = DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect();
        }
        if results.is_empty() {
            results = DEFAULT_RESULTS.iter().map(|s| s.to_string()).collect();
        }

        self.state.references = ReferenceLists {
            clients,
            sellers,
            statuses,
            results,
        };
    }

    pub fn offer(&self, id: OfferId) -> Option<&Offer> {
        self.state.offers.iter().find(|o| o.id == id)
    }

    pub fn visible<'a>(&'a self, filter: &'a OfferFilter) -> impl Iterator<Item = &'a Offer> + 'a {
        self.state.offers.iter().filter(move |o| filter.matches(o))
    }

    /// Visible offers with their derived fields, computed for `now`.
    pub fn views(&self, filter: &OfferFilter, now: DateTime<Utc>) -> Vec<OfferView> {
        self.visible(filter).map(|o| OfferView::new(o, now)).collect()
    }

    pub fn kpis(&self) -> Kpis {
        Kpis {
            total_offers: self.state.offers.len(),
            won_offers: self
                .state
                .offers
                .iter()
                .filter(|o| o.fields.result == RESULT_WON)
                .count(),
        }
    }

    /// Creates a new offer (`editing` is `None`) or applies the form to an
    /// existing one. Validation runs before any store call. On edit the
    /// stored offer number is kept whatever the form says.
    pub fn save_offer(
        &mut self,
        editing: Option<OfferId>,
        form: OfferFields,
        today: NaiveDate,
    ) -> Result<Offer, ServerError> {
        const ACTION: &str = "Error al guardar la oferta";
        form.validate().map_err(|e| e.during(ACTION))?;
        let mut form = form.with_defaults();

        let saved = match editing {
            Some(id) => {
                let patch = OfferPatch::from_fields(&form).without(OfferField::OfferNumber);
                self.records.update_offer(id, &patch)
            }
            None => {
                if form.offer_number.trim().is_empty() {
                    form.offer_number =
                        generate_offer_number(&form.received_on, self.state.offers.len(), today);
                }
                self.records.create_offer(&form)
            }
        }
        .map_err(|e| {
            tracing::error!(error = %e, "save offer failed");
            e.during(ACTION)
        })?;

        Ok(self.put(saved))
    }

    /// Quick update of the status column.
    pub fn update_status(&mut self, id: OfferId, status: &str) -> Result<Offer, ServerError> {
        self.update_one(id, OfferField::Status, status, "No se pudo actualizar el estado")
    }

    /// Quick update of the result column.
    pub fn update_result(&mut self, id: OfferId, result: &str) -> Result<Offer, ServerError> {
        self.update_one(id, OfferField::Result, result, "No se pudo actualizar el resultado")
    }

    fn update_one(
        &mut self,
        id: OfferId,
        field: OfferField,
        value: &str,
        action: &str,
    ) -> Result<Offer, ServerError> {
        let patch = OfferPatch::new().text(field, value);
        let updated = self.records.update_offer(id, &patch).map_err(|e| {
            tracing::error!(offer = %id, field = field.column(), error = %e, "quick update failed");
            e.during(action)
        })?;
        Ok(self.put(updated))
    }

    /// Replaces the offer in the list (keeping its document count) or puts a
    /// new one first.
    fn put(&mut self, mut offer: Offer) -> Offer {
        match self.state.offers.iter_mut().find(|o| o.id == offer.id) {
            Some(slot) => {
                offer.docs_count = slot.docs_count;
                *slot = offer.clone();
            }
            None => self.state.offers.insert(0, offer.clone()),
        }
        offer
    }

    pub fn select(&mut self, id: OfferId, selected: bool) {
        if selected {
            self.state.selection.insert(id);
        } else {
            self.state.selection.remove(&id);
        }
    }

    /// Selects or deselects every id given, typically the visible subset.
    pub fn select_all(&mut self, ids: &[OfferId], selected: bool) {
        for id in ids {
            self.select(*id, selected);
        }
    }

    /// Deletes the selected offers and clears the selection.
    pub fn delete_selected(&mut self) -> Result<usize, ServerError> {
        let ids: Vec<OfferId> = self.state.selection.iter().copied().collect();
        let removed = self.delete_offers(&ids)?;
        self.state.selection.clear();
        Ok(removed)
    }

    pub fn delete_offers(&mut self, ids: &[OfferId]) -> Result<usize, ServerError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.records.delete_offers(ids).map_err(|e| {
            tracing::error!(count = ids.len(), error = %e, "delete failed");
            e.during("Error al eliminar las ofertas")
        })?;

        for id in ids {
            self.drop_documents(*id);
        }

        let before = self.state.offers.len();
        self.state.offers.retain(|o| !ids.contains(&o.id));
        for id in ids {
            self.state.selection.remove(id);
        }
        Ok(before - self.state.offers.len())
    }

    /// Best effort: a document that cannot be removed stays as an orphan.
    fn drop_documents(&self, offer_id: OfferId) {
        let docs = match self.blobs.list(offer_id) {
            Ok(docs) => docs,
            Err(err) => {
                tracing::warn!(offer = %offer_id, error = %err, "documents of deleted offer not listed");
                return;
            }
        };
        for doc in docs {
            if let Err(err) = self.blobs.remove(doc.id) {
                tracing::warn!(offer = %offer_id, file = %doc.file_name, error = %err, "document of deleted offer kept");
            }
        }
    }

    /// Imports a CSV or workbook. Offers created before a failing row are
    /// kept in the list even though the call returns the error.
    pub fn import(&mut self, file_name: &str, bytes: &[u8], today: NaiveDate) -> Result<Vec<Offer>, ServerError> {
        let existing = self.state.offers.len();
        let report = import::import_file(self.records.as_ref(), file_name, bytes, existing, today)?;

        let mut offers = report.created.clone();
        offers.append(&mut self.state.offers);
        self.state.offers = offers;

        report.into_result()
    }

    pub fn export(&self, range: DateRange) -> Result<Vec<u8>, ServerError> {
        export_offers_xlsx(&self.state.offers, range)
    }

    pub fn add_reference(&mut self, kind: ReferenceKind, value: &str) -> Result<(), ServerError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ServerError::Validation("El valor no puede estar vacío".into()));
        }
        self.records.add_reference(kind, value)?;

        let list = self.state.references.list_mut(kind);
        if !list.iter().any(|v| v == value) {
            list.push(value.to_string());
            list.sort();
        }
        Ok(())
    }

    pub fn attach_document(&mut self, offer_id: OfferId, bytes: &[u8], file_name: &str) -> Result<Document, ServerError> {
        if self.offer(offer_id).is_none() {
            return Err(ServerError::NotFound);
        }
        let doc = self
            .blobs
            .upload(offer_id, bytes, file_name)
            .map_err(|e| e.during("Error al subir el documento"))?;
        if let Some(offer) = self.state.offers.iter_mut().find(|o| o.id == offer_id) {
            offer.docs_count += 1;
        }
        Ok(doc)
    }

    pub fn documents(&self, offer_id: OfferId) -> Result<Vec<Document>, ServerError> {
        self.blobs.list(offer_id)
    }

    pub fn remove_document(&mut self, id: DocumentId) -> Result<(), ServerError> {
        self.blobs
            .remove(id)
            .map_err(|e| e.during("Error al eliminar el documento"))?;
        let counts = self.blobs.count_by_offer().unwrap_or_default();
        for offer in &mut self.state.offers {
            offer.docs_count = counts.get(&offer.id).copied().unwrap_or(0);
        }
        Ok(())
    }

    pub fn discard_orphan_documents(&self) -> Result<usize, ServerError> {
        self.blobs.discard_orphans()
    }
}
