// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::errors::{Error, ErrorKind};
use crate::keys::jwk::JsonWebKey;
use crate::keys::material::{KeyFlag, KeyMaterial, SECRET_KEY_LENGTH};
use crate::keys::method::{
    JsonWebKeyMethod, MultikeyMethod, VerificationMethod, JWK_CONTEXT_V1, MULTIKEY_CONTEXT_V1,
};
use crate::utils::util::{generate_random_bytes, parse_w3c_datetime};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use zkryptium::bbsplus::ciphersuites::Bls12381Sha256;
use zkryptium::keys::pair::KeyPair;
use zkryptium::schemes::algorithms::BBSplus;

/// The BBS ciphersuite backing this Data Integrity suite.
pub type SuiteScheme = BBSplus<Bls12381Sha256>;

/// Verification-method encoding to export to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MethodType {
    /// Multibase-encoded key material.
    #[default]
    Multikey,
    /// JWK-encoded key material.
    JsonWebKey,
}

/// Options for [`Bls12381G2KeyPair::export`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExportOptions {
    /// Which key material to export; `Public` omits the secret key.
    pub flag: KeyFlag,
    /// Target document encoding.
    pub method_type: MethodType,
}

/// Options for [`Bls12381G2KeyPair::import`]. All checks default to on;
/// switching one off skips the corresponding validation entirely.
#[derive(Clone, Copy, Debug)]
#[allow(missing_docs)]
pub struct ImportOptions {
    pub check_context: bool,
    pub check_expired: bool,
    pub check_revoked: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            check_context: true,
            check_expired: true,
            check_revoked: true,
        }
    }
}

/// A BLS12-381 G2 keypair with its Data Integrity identity.
///
/// Lifecycle: constructed bare, then [`initialize`](Self::initialize) fills
/// both keys and derives `id` from the controller and the public-key
/// fingerprint; or imported from a verification-method document with the same
/// resulting shape.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Bls12381G2KeyPair {
    /// Key identifier, `{controller}#{fingerprint}` once finalized.
    pub id: Option<String>,
    /// Controller URI.
    pub controller: Option<String>,
    /// Expiration timestamp.
    pub expires: Option<DateTime<Utc>>,
    /// Revocation timestamp.
    pub revoked: Option<DateTime<Utc>>,
    secret_key: Option<KeyMaterial>,
    public_key: Option<KeyMaterial>,
}

impl Bls12381G2KeyPair {
    /// A bare keypair without key material.
    pub fn new(controller: Option<String>) -> Self {
        Self {
            id: None,
            controller,
            expires: None,
            revoked: None,
            secret_key: None,
            public_key: None,
        }
    }

    /// # Description
    /// Fills both keys from `seed` (32 cryptographically-random bytes are
    /// drawn when absent) through the BBS key-generation collaborator. When a
    /// controller is set and no `id` was assigned yet, the identifier becomes
    /// `controller + "#" + fingerprint`.
    ///
    /// # Inputs:
    /// * `seed` (OPTIONAL), key-generation entropy, at least 32 bytes.
    pub fn initialize(&mut self, seed: Option<&[u8]>) -> Result<(), Error> {
        const OP: &str = "Bls12381G2KeyPair::initialize";
        if let Some(seed) = seed {
            if seed.len() < SECRET_KEY_LENGTH {
                return Err(Error::new(
                    ErrorKind::InvalidKeypairLength,
                    OP,
                    format!(
                        "seed must be at least {SECRET_KEY_LENGTH} bytes, got {}",
                        seed.len()
                    ),
                ));
            }
        }
        let key_material = match seed {
            Some(seed) => seed.to_vec(),
            None => generate_random_bytes(SECRET_KEY_LENGTH),
        };
        let keypair = KeyPair::<SuiteScheme>::generate(&key_material, None, None)
            .map_err(|e| Error::new(ErrorKind::InvalidKeypairLength, OP, format!("{e}")))?;
        self.secret_key = Some(KeyMaterial::Secret(keypair.private_key().to_bytes()));
        self.public_key = Some(KeyMaterial::Public(keypair.public_key().to_bytes()));
        if self.id.is_none() {
            if let Some(controller) = &self.controller {
                self.id = Some(format!("{controller}#{}", self.generate_fingerprint()?));
            }
        }
        Ok(())
    }

    /// A fresh random keypair for `controller`.
    pub fn random(controller: Option<String>) -> Result<Self, Error> {
        let mut pair = Self::new(controller);
        pair.initialize(None)?;
        Ok(pair)
    }

    /// Returns a reference to the secret key material.
    pub fn secret_key(&self) -> Option<&KeyMaterial> {
        self.secret_key.as_ref()
    }

    /// Returns a reference to the public key material.
    pub fn public_key(&self) -> Option<&KeyMaterial> {
        self.public_key.as_ref()
    }

    /// Multibase form of the public key.
    pub fn generate_fingerprint(&self) -> Result<String, Error> {
        let public = self.public_key.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidKeypairContent,
                "Bls12381G2KeyPair::generate_fingerprint",
                "public key material required",
            )
        })?;
        Ok(public.to_multibase())
    }

    /// Whether `fingerprint` matches the public key.
    pub fn verify_fingerprint(&self, fingerprint: &str) -> bool {
        self.generate_fingerprint()
            .map(|expected| expected == fingerprint)
            .unwrap_or(false)
    }

    fn export_identity(&self, operation: &'static str) -> Result<(String, String), Error> {
        let id = self.id.clone().ok_or_else(|| {
            Error::new(ErrorKind::KeypairExportError, operation, "missing `id`")
        })?;
        let controller = self.controller.clone().ok_or_else(|| {
            Error::new(ErrorKind::KeypairExportError, operation, "missing `controller`")
        })?;
        if !id.starts_with(controller.as_str()) {
            return Err(Error::new(
                ErrorKind::KeypairExportError,
                operation,
                format!("id {id:?} does not start with controller {controller:?}"),
            ));
        }
        Ok((id, controller))
    }

    /// # Description
    /// Exports the keypair as a verification-method document. The secret key
    /// is only emitted when explicitly requested via `flag: Secret`; public
    /// material is emitted whenever present. A JWK export that includes a
    /// public JWK re-derives `id` from its thumbprint.
    pub fn export(&self, options: ExportOptions) -> Result<VerificationMethod, Error> {
        const OP: &str = "Bls12381G2KeyPair::export";
        let requested = match options.flag {
            KeyFlag::Secret => self.secret_key.as_ref(),
            KeyFlag::Public => self.public_key.as_ref(),
        };
        if requested.is_none() {
            return Err(Error::new(
                ErrorKind::KeypairExportError,
                OP,
                "requested key material is absent",
            ));
        }
        let (id, controller) = self.export_identity(OP)?;
        let expires = self
            .expires
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        let revoked = self
            .revoked
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));

        match options.method_type {
            MethodType::Multikey => Ok(VerificationMethod::Multikey(MultikeyMethod {
                context: Some(Value::String(MULTIKEY_CONTEXT_V1.to_owned())),
                id,
                controller,
                expires,
                revoked,
                public_key_multibase: self.public_key.as_ref().map(KeyMaterial::to_multibase),
                secret_key_multibase: match options.flag {
                    KeyFlag::Secret => self.secret_key.as_ref().map(KeyMaterial::to_multibase),
                    KeyFlag::Public => None,
                },
            })),
            MethodType::JsonWebKey => {
                let public_key_jwk = self.public_key.as_ref().map(JsonWebKey::from_material);
                let secret_key_jwk = match options.flag {
                    KeyFlag::Secret => self.secret_key.as_ref().map(JsonWebKey::from_material),
                    KeyFlag::Public => None,
                };
                // The identifier tracks the public JWK thumbprint; with only
                // a secret JWK the provided id stands.
                let id = match &public_key_jwk {
                    Some(jwk) => format!("{controller}#{}", jwk.thumbprint()?),
                    None => id,
                };
                Ok(VerificationMethod::JsonWebKey(JsonWebKeyMethod {
                    context: Some(Value::String(JWK_CONTEXT_V1.to_owned())),
                    id,
                    controller,
                    expires,
                    revoked,
                    public_key_jwk,
                    secret_key_jwk,
                }))
            }
        }
    }

    /// # Description
    /// Imports a keypair from a verification-method JSON document,
    /// dispatching on the `type` discriminator. Context, expiration and
    /// revocation validations run unless switched off in `options`.
    pub fn import(document: &Value, options: ImportOptions) -> Result<Self, Error> {
        const OP: &str = "Bls12381G2KeyPair::import";
        let method = VerificationMethod::from_json(document)?;
        if options.check_context {
            method.check_context()?;
        }

        let now = Utc::now();
        let expires = method
            .expires()
            .map(|t| parse_w3c_datetime(t, ErrorKind::KeypairImportError, OP))
            .transpose()?;
        let revoked = method
            .revoked()
            .map(|t| parse_w3c_datetime(t, ErrorKind::KeypairImportError, OP))
            .transpose()?;
        if options.check_expired {
            if let Some(expires) = expires {
                if expires < now {
                    return Err(Error::new(
                        ErrorKind::KeypairExpired,
                        OP,
                        format!("verification method expired at {expires}"),
                    ));
                }
            }
        }
        if options.check_revoked {
            if let Some(revoked) = revoked {
                if revoked < now {
                    return Err(Error::new(
                        ErrorKind::KeypairExpired,
                        OP,
                        format!("verification method revoked at {revoked}"),
                    ));
                }
            }
        }

        let (secret_key, public_key) = match &method {
            VerificationMethod::Multikey(m) => (
                m.secret_key_multibase
                    .as_deref()
                    .map(|s| KeyMaterial::from_multibase(s, KeyFlag::Secret))
                    .transpose()?,
                m.public_key_multibase
                    .as_deref()
                    .map(|s| KeyMaterial::from_multibase(s, KeyFlag::Public))
                    .transpose()?,
            ),
            VerificationMethod::JsonWebKey(m) => (
                m.secret_key_jwk
                    .as_ref()
                    .map(|jwk| jwk.to_material(KeyFlag::Secret))
                    .transpose()?,
                m.public_key_jwk
                    .as_ref()
                    .map(|jwk| jwk.to_material(KeyFlag::Public))
                    .transpose()?,
            ),
        };
        if secret_key.is_none() && public_key.is_none() {
            return Err(Error::new(
                ErrorKind::InvalidKeypairContent,
                OP,
                "verification method carries no key material",
            ));
        }

        Ok(Self {
            id: Some(method.id().to_owned()),
            controller: Some(method.controller().to_owned()),
            expires,
            revoked,
            secret_key,
            public_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::material::PUBLIC_KEY_LENGTH;

    const CONTROLLER: &str = "did:example:issuer";

    fn initialized_pair() -> Bls12381G2KeyPair {
        let mut pair = Bls12381G2KeyPair::new(Some(CONTROLLER.to_owned()));
        pair.initialize(Some(&[0u8; SECRET_KEY_LENGTH])).unwrap();
        pair
    }

    #[test]
    fn initialize_from_zero_seed() {
        let pair = initialized_pair();
        assert_eq!(pair.secret_key().unwrap().as_bytes().len(), SECRET_KEY_LENGTH);
        assert_eq!(pair.public_key().unwrap().as_bytes().len(), PUBLIC_KEY_LENGTH);
        let id = pair.id.as_deref().unwrap();
        assert!(id.starts_with("did:example:issuer#z"));
    }

    #[test]
    fn initialize_is_deterministic_per_seed() {
        let a = initialized_pair();
        let b = initialized_pair();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.secret_key(), b.secret_key());
    }

    #[test]
    fn short_seed_rejected() {
        let mut pair = Bls12381G2KeyPair::new(Some(CONTROLLER.to_owned()));
        let err = pair.initialize(Some(&[0u8; 16])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeypairLength);
    }

    #[test]
    fn fingerprint_round_trip() {
        let pair = initialized_pair();
        let fp = pair.generate_fingerprint().unwrap();
        assert!(fp.starts_with('z'));
        assert!(pair.verify_fingerprint(&fp));
        assert!(!pair.verify_fingerprint("zBogus"));
    }

    #[test]
    fn multikey_export_import_round_trip() {
        let pair = initialized_pair();
        let exported = pair
            .export(ExportOptions {
                flag: KeyFlag::Secret,
                method_type: MethodType::Multikey,
            })
            .unwrap();
        let doc = serde_json::to_value(&exported).unwrap();
        let imported = Bls12381G2KeyPair::import(&doc, ImportOptions::default()).unwrap();
        assert_eq!(imported.secret_key(), pair.secret_key());
        assert_eq!(imported.public_key(), pair.public_key());
        assert_eq!(imported.controller.as_deref(), Some(CONTROLLER));
    }

    #[test]
    fn public_export_omits_secret() {
        let pair = initialized_pair();
        let exported = pair.export(ExportOptions::default()).unwrap();
        match exported {
            VerificationMethod::Multikey(m) => {
                assert!(m.secret_key_multibase.is_none());
                assert!(m.public_key_multibase.is_some());
            }
            _ => panic!("expected Multikey"),
        }
    }

    #[test]
    fn jwk_export_overrides_id_with_thumbprint() {
        let pair = initialized_pair();
        let exported = pair
            .export(ExportOptions {
                flag: KeyFlag::Public,
                method_type: MethodType::JsonWebKey,
            })
            .unwrap();
        match exported {
            VerificationMethod::JsonWebKey(m) => {
                let thumb = m.public_key_jwk.as_ref().unwrap().thumbprint().unwrap();
                assert_eq!(m.id, format!("{CONTROLLER}#{thumb}"));
            }
            _ => panic!("expected JsonWebKey"),
        }
    }

    #[test]
    fn export_without_identity_fails() {
        let mut pair = Bls12381G2KeyPair::new(None);
        pair.initialize(None).unwrap();
        let err = pair.export(ExportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeypairExportError);
    }

    #[test]
    fn expired_method_rejected_unless_check_disabled() {
        let pair = initialized_pair();
        let exported = pair.export(ExportOptions::default()).unwrap();
        let mut doc = serde_json::to_value(&exported).unwrap();
        doc["expires"] = Value::String("2001-01-01T00:00:00Z".to_owned());
        let err = Bls12381G2KeyPair::import(&doc, ImportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeypairExpired);

        let relaxed = ImportOptions {
            check_expired: false,
            ..ImportOptions::default()
        };
        assert!(Bls12381G2KeyPair::import(&doc, relaxed).is_ok());
    }

    #[test]
    fn import_without_keys_rejected() {
        let doc = serde_json::json!({
            "@context": MULTIKEY_CONTEXT_V1,
            "id": "did:example:issuer#zkey",
            "type": "Multikey",
            "controller": CONTROLLER
        });
        let err = Bls12381G2KeyPair::import(&doc, ImportOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeypairContent);
    }
}
