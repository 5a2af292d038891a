//! Provides a reference [`LocalKeystore`] which implements the [`KeyProvider`] trait
use std::collections::BTreeMap;

use crate::{
    error::JoseError,
    header::Kid,
    jws::VerificationKey,
    validation::KeyProvider,
};

/// In-memory [`KeyProvider`] implementation that determines key
/// association via the `kid` JWT header parameter.
///
/// A header without `kid` resolves to no key.
pub struct LocalKeystore<VK: VerificationKey> {
    keystore: BTreeMap<String, VK>,
}
impl<VK: VerificationKey> LocalKeystore<VK> {
    /// Instantiates a new, empty [`LocalKeystore`]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            keystore: BTreeMap::new(),
        }
    }

    /// Adds a [`VerificationKey`] to the [`LocalKeystore`] instance
    pub fn add_key(&mut self, key_id: impl Into<String>, key: VK) {
        self.keystore.insert(key_id.into(), key);
    }

    /// Removes a [`VerificationKey`] from the [`LocalKeystore`] instance
    pub fn remove_key(&mut self, key_id: impl AsRef<str>) {
        self.keystore.remove(key_id.as_ref());
    }
}

impl<H, C, VK> KeyProvider<H, C> for LocalKeystore<VK>
where
    H: Kid + ?Sized,
    C: ?Sized,
    VK: VerificationKey,
{
    type Key = VK;

    fn resolve_key(&self, header: &H, _: &C) -> Result<&VK, JoseError> {
        header
            .kid()
            .and_then(|kid| self.keystore.get(kid))
            .ok_or(JoseError::KeyNotFound)
    }
}
