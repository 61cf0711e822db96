pub mod blobs;
#[cfg(test)]
pub mod memory;
pub mod rest;
pub mod sqlite;

use crate::domain::offer::{NewOffer, Offer, OfferId, OfferPatch};
use crate::errors::ServerError;

pub use blobs::{BlobStore, Document, DocumentId, LocalBlobStore};
pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// The reference lists offered as choices in the offer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Clients,
    Sellers,
    Statuses,
    Results,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::Clients,
        ReferenceKind::Sellers,
        ReferenceKind::Statuses,
        ReferenceKind::Results,
    ];

    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::Clients => "clients",
            ReferenceKind::Sellers => "sellers",
            ReferenceKind::Statuses => "offer_statuses",
            ReferenceKind::Results => "proposal_results",
        }
    }

    /// Clients and sellers are keyed by name, statuses and results by code.
    pub fn column(self) -> &'static str {
        match self {
            ReferenceKind::Clients | ReferenceKind::Sellers => "name",
            ReferenceKind::Statuses | ReferenceKind::Results => "code",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            ReferenceKind::Clients => "clients",
            ReferenceKind::Sellers => "sellers",
            ReferenceKind::Statuses => "statuses",
            ReferenceKind::Results => "results",
        }
    }

    pub fn from_slug(slug: &str) -> Option<ReferenceKind> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// Persistence for offers and reference lists.
///
/// Implementations translate field names through `domain::fields` and report
/// failures as `Transport` (unreachable, server fault) or `Validation`
/// (the store refused the data).
pub trait RecordStore: Send + Sync {
    /// Newest first.
    fn list_offers(&self) -> Result<Vec<Offer>, ServerError>;

    fn create_offer(&self, offer: &NewOffer) -> Result<Offer, ServerError>;

    /// Changes only the fields present in `patch`.
    fn update_offer(&self, id: OfferId, patch: &OfferPatch) -> Result<Offer, ServerError>;

    fn delete_offers(&self, ids: &[OfferId]) -> Result<(), ServerError>;

    /// Sorted by name.
    fn list_references(&self, kind: ReferenceKind) -> Result<Vec<String>, ServerError>;

    fn add_reference(&self, kind: ReferenceKind, value: &str) -> Result<(), ServerError>;
}
