//! Credential capture.
//!
//! The credential is loaded from the store once, at startup. While it is absent
//! the gate stays open and the conversation view is unreachable.

use std::fmt;

use tracing::{debug, info};

use crate::constants::CREDENTIAL_KEY;
use crate::store::{KeyValueStore, StoreError};

/// Secret used as the bearer token. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for the empty string, which counts as "absent".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(***)")
    }
}

pub struct CredentialGate {
    store: Box<dyn KeyValueStore>,
    credential: Option<Credential>,
}

impl CredentialGate {
    /// Reads the stored credential. A non-empty value closes the gate right away.
    pub fn load(store: Box<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let credential = store.get(CREDENTIAL_KEY)?.and_then(Credential::new);
        if credential.is_some() {
            info!("Stored credential found, skipping credential prompt");
        } else {
            debug!("No stored credential, gate is open");
        }
        Ok(Self { store, credential })
    }

    pub fn is_open(&self) -> bool {
        self.credential.is_none()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Persists `value` and closes the gate. The empty string is refused and
    /// leaves both the gate and the store untouched.
    pub fn accept(&mut self, value: &str) -> Result<bool, StoreError> {
        let Some(credential) = Credential::new(value) else {
            debug!("Empty credential refused");
            return Ok(false);
        };
        self.store.set(CREDENTIAL_KEY, credential.expose())?;
        self.credential = Some(credential);
        info!("Credential stored, gate closed");
        Ok(true)
    }

    /// Drops the stored credential and reopens the gate.
    pub fn forget(&mut self) -> Result<(), StoreError> {
        self.store.remove(CREDENTIAL_KEY)?;
        self.credential = None;
        info!("Credential removed, gate reopened");
        Ok(())
    }
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("open", &self.is_open())
            .finish()
    }
}
