// In-memory record store for tests, with failure injection.

use super::{RecordStore, ReferenceKind};
use crate::domain::offer::{NewOffer, Offer, OfferId, OfferPatch};
use crate::errors::ServerError;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    offers: Mutex<Vec<Offer>>,
    references: Mutex<Vec<(ReferenceKind, String)>>,
    create_calls: Mutex<usize>,
    fail_on_create: Option<usize>,
    offline: bool,
}

impl MemoryStore {
    /// The n-th create call (1-based) fails with a transport error.
    pub fn fail_on_create(mut self, n: usize) -> Self {
        self.fail_on_create = Some(n);
        self
    }

    /// Every call fails, as if the backend were unreachable.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.offers.lock().unwrap().len()
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    fn check_online(&self) -> Result<(), ServerError> {
        if self.offline {
            return Err(ServerError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn list_offers(&self) -> Result<Vec<Offer>, ServerError> {
        self.check_online()?;
        let mut offers = self.offers.lock().unwrap().clone();
        offers.reverse();
        Ok(offers)
    }

    fn create_offer(&self, offer: &NewOffer) -> Result<Offer, ServerError> {
        self.check_online()?;
        let mut calls = self.create_calls.lock().unwrap();
        *calls += 1;
        if self.fail_on_create == Some(*calls) {
            return Err(ServerError::Transport("insert rejected".into()));
        }
        let mut offers = self.offers.lock().unwrap();
        let id = offers.iter().map(|o| o.id.0).max().unwrap_or(0) + 1;
        let created = Offer {
            id: OfferId(id),
            fields: offer.clone(),
            docs_count: 0,
            created_at: None,
            updated_at: None,
        };
        offers.push(created.clone());
        Ok(created)
    }

    fn update_offer(&self, id: OfferId, patch: &OfferPatch) -> Result<Offer, ServerError> {
        self.check_online()?;
        let mut offers = self.offers.lock().unwrap();
        let offer = offers
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(ServerError::NotFound)?;
        patch.apply_to(&mut offer.fields);
        Ok(offer.clone())
    }

    fn delete_offers(&self, ids: &[OfferId]) -> Result<(), ServerError> {
        self.check_online()?;
        self.offers.lock().unwrap().retain(|o| !ids.contains(&o.id));
        Ok(())
    }

    fn list_references(&self, kind: ReferenceKind) -> Result<Vec<String>, ServerError> {
        self.check_online()?;
        let mut values: Vec<String> = self
            .references
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v.clone())
            .collect();
        values.sort();
        Ok(values)
    }

    fn add_reference(&self, kind: ReferenceKind, value: &str) -> Result<(), ServerError> {
        self.check_online()?;
        self.references
            .lock()
            .unwrap()
            .push((kind, value.to_string()));
        Ok(())
    }
}
