use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{GurlzError, Result};
use crate::http_request::{normalize_method, validate_name, Request};

/// Ordered collection of saved requests. Names are unique (case-sensitive);
/// insertion order is the listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStore {
    #[serde(default)]
    requests: Vec<Request>,
}

impl RequestStore {
    pub fn new() -> RequestStore {
        RequestStore::default()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter()
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    // first match wins if a hand-edited file ever carries duplicates
    fn position(&self, name: &str) -> Option<usize> {
        self.requests.iter().position(|it| it.name == name)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Request> {
        self.position(name).map(|idx| &self.requests[idx])
    }

    /// Appends `request`, refusing a name that is already taken.
    pub fn add_request(&mut self, request: Request) -> Result<()> {
        if self.find_by_name(&request.name).is_some() {
            return Err(GurlzError::DuplicateName(request.name));
        }
        self.requests.push(request);
        Ok(())
    }

    /// Applies `mutate` to a copy of the named request and commits it only if
    /// the result is still valid. `id` and `created_at` are preserved,
    /// `updated_at` is refreshed and the position in the store is kept.
    pub fn update_by_name<F>(&mut self, name: &str, mutate: F) -> Result<&Request>
    where
        F: FnOnce(&mut Request),
    {
        let idx = self
            .position(name)
            .ok_or_else(|| GurlzError::NotFound(name.to_string()))?;

        let original = &self.requests[idx];
        let mut updated = original.clone();
        mutate(&mut updated);

        updated.id = original.id.clone();
        updated.created_at = original.created_at;
        validate_name(&updated.name)?;
        updated.method = normalize_method(&updated.method)?;

        if updated.name != original.name && self.position(&updated.name).is_some() {
            return Err(GurlzError::DuplicateName(updated.name));
        }

        updated.updated_at = Utc::now().max(original.updated_at);
        self.requests[idx] = updated;
        Ok(&self.requests[idx])
    }

    /// Removes the named request; remaining entries keep their order.
    pub fn remove_by_name(&mut self, name: &str) -> Result<Request> {
        let idx = self
            .position(name)
            .ok_or_else(|| GurlzError::NotFound(name.to_string()))?;
        Ok(self.requests.remove(idx))
    }
}
