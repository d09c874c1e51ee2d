//! # Lookup Store
//!
//! Per-domain name → owner map. Anyone may read; only the designated writer
//! (the local registrar on a source domain, the local receiver on a
//! destination domain) may write.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::{invariant_designated_writer, invariant_role_holder, Address, CcnsError};
use crate::ports::LookupApi;

/// Authoritative name → owner map for one domain.
pub struct LookupStore {
    owner: Address,
    writer: RwLock<Option<Address>>,
    entries: RwLock<HashMap<String, Address>>,
}

impl LookupStore {
    /// Create a store with no writer assigned yet.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            writer: RwLock::new(None),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store with `writer` bound at construction.
    pub fn with_writer(owner: Address, writer: Address) -> Self {
        let store = Self::new(owner);
        *store.writer.write() = Some(writer);
        store
    }

    /// Owner allowed to assign the writer.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Current designated writer.
    pub fn writer(&self) -> Option<Address> {
        *self.writer.read()
    }

    /// Designate `writer` as the only address allowed to `set`. Owner only.
    pub fn assign_writer(&self, caller: Address, writer: Address) -> Result<(), CcnsError> {
        invariant_role_holder(caller, self.owner)?;
        *self.writer.write() = Some(writer);
        info!("[ccns] Lookup writer set to {}", writer);
        Ok(())
    }

    /// Bind `name` to `owner`. Designated writer only.
    ///
    /// Returns the previous owner, if any.
    pub fn set(
        &self,
        caller: Address,
        name: &str,
        owner: Address,
    ) -> Result<Option<Address>, CcnsError> {
        invariant_designated_writer(caller, self.writer())?;
        let previous = self.entries.write().insert(name.to_string(), owner);
        debug!("[ccns] Lookup `{}` -> {}", name, owner);
        Ok(previous)
    }

    /// Put back the value `set` returned, undoing that write.
    /// Designated writer only.
    pub fn restore(
        &self,
        caller: Address,
        name: &str,
        previous: Option<Address>,
    ) -> Result<(), CcnsError> {
        invariant_designated_writer(caller, self.writer())?;
        let mut entries = self.entries.write();
        match previous {
            Some(owner) => {
                entries.insert(name.to_string(), owner);
            }
            None => {
                entries.remove(name);
            }
        }
        Ok(())
    }

    /// Owner of `name`, `None` when unknown.
    pub fn resolve(&self, name: &str) -> Option<Address> {
        self.entries.read().get(name).copied()
    }

    /// Number of names held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no name is held.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl LookupApi for LookupStore {
    fn lookup(&self, name: &str) -> Address {
        self.resolve(name).unwrap_or(Address::ZERO)
    }
}
