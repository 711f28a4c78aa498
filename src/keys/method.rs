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
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Context of Multikey verification methods.
pub const MULTIKEY_CONTEXT_V1: &str = "https://w3id.org/security/multikey/v1";
/// Context of JsonWebKey verification methods.
pub const JWK_CONTEXT_V1: &str = "https://w3id.org/security/jwk/v1";
/// DID core context.
pub const DID_CONTEXT_V1: &str = "https://www.w3.org/ns/did/v1";
/// Controlled identifier document context.
pub const CID_CONTEXT_V1: &str = "https://www.w3.org/ns/cid/v1";

/// JSON-LD contexts under which verification-method documents are accepted.
pub const CONTEXT_ALLOWLIST: [&str; 4] = [
    MULTIKEY_CONTEXT_V1,
    JWK_CONTEXT_V1,
    DID_CONTEXT_V1,
    CID_CONTEXT_V1,
];

/// A Multikey verification-method document.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct MultikeyMethod {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub id: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_multibase: Option<String>,
}

/// A JsonWebKey verification-method document.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct JsonWebKeyMethod {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    pub id: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JsonWebKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_jwk: Option<JsonWebKey>,
}

/// Verification method, polymorphic over the two supported encodings. The
/// `type` member is the discriminator; import dispatches on it rather than on
/// the present key fields.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationMethod {
    /// Key material as multibase strings.
    Multikey(MultikeyMethod),
    /// Key material as JSON Web Keys.
    JsonWebKey(JsonWebKeyMethod),
}

impl VerificationMethod {
    /// # Description
    /// Parses a verification-method JSON document, dispatching on the `type`
    /// discriminator. Unknown or missing types fail with
    /// `KEYPAIR_IMPORT_ERROR`.
    pub fn from_json(document: &Value) -> Result<Self, Error> {
        const OP: &str = "VerificationMethod::from_json";
        let method_type = document
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::new(ErrorKind::KeypairImportError, OP, "missing `type` member")
            })?;
        match method_type {
            "Multikey" | "JsonWebKey" => serde_json::from_value(document.clone())
                .map_err(|e| Error::new(ErrorKind::KeypairImportError, OP, format!("{e}"))),
            other => Err(Error::new(
                ErrorKind::KeypairImportError,
                OP,
                format!("unknown verification method type {other:?}"),
            )),
        }
    }

    /// The method identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Multikey(m) => &m.id,
            Self::JsonWebKey(m) => &m.id,
        }
    }

    /// The controller URI.
    pub fn controller(&self) -> &str {
        match self {
            Self::Multikey(m) => &m.controller,
            Self::JsonWebKey(m) => &m.controller,
        }
    }

    /// The expiration timestamp, if any.
    pub fn expires(&self) -> Option<&str> {
        match self {
            Self::Multikey(m) => m.expires.as_deref(),
            Self::JsonWebKey(m) => m.expires.as_deref(),
        }
    }

    /// The revocation timestamp, if any.
    pub fn revoked(&self) -> Option<&str> {
        match self {
            Self::Multikey(m) => m.revoked.as_deref(),
            Self::JsonWebKey(m) => m.revoked.as_deref(),
        }
    }

    /// The document `@context`, if any.
    pub fn context(&self) -> Option<&Value> {
        match self {
            Self::Multikey(m) => m.context.as_ref(),
            Self::JsonWebKey(m) => m.context.as_ref(),
        }
    }

    /// Checks the document `@context` against [`CONTEXT_ALLOWLIST`]. A
    /// missing context is rejected; a string or array context passes when at
    /// least one entry is allowlisted.
    pub fn check_context(&self) -> Result<(), Error> {
        const OP: &str = "VerificationMethod::check_context";
        let context = self.context().ok_or_else(|| {
            Error::new(ErrorKind::KeypairImportError, OP, "missing `@context`")
        })?;
        let allowed = match context {
            Value::String(s) => CONTEXT_ALLOWLIST.contains(&s.as_str()),
            Value::Array(entries) => entries
                .iter()
                .filter_map(Value::as_str)
                .any(|s| CONTEXT_ALLOWLIST.contains(&s)),
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::KeypairImportError,
                OP,
                format!("context {context} is not allowlisted"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multikey_dispatch() {
        let doc = json!({
            "@context": MULTIKEY_CONTEXT_V1,
            "id": "did:example:issuer#zkey",
            "type": "Multikey",
            "controller": "did:example:issuer",
            "publicKeyMultibase": "zUC7placeholder"
        });
        let method = VerificationMethod::from_json(&doc).unwrap();
        assert!(matches!(method, VerificationMethod::Multikey(_)));
        assert_eq!(method.controller(), "did:example:issuer");
        method.check_context().unwrap();
    }

    #[test]
    fn unknown_type_is_an_import_error() {
        let doc = json!({
            "id": "did:example:issuer#key-1",
            "type": "Ed25519VerificationKey2020",
            "controller": "did:example:issuer"
        });
        let err = VerificationMethod::from_json(&doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeypairImportError);
    }

    #[test]
    fn context_allowlist_rejects_unknown_context() {
        let doc = json!({
            "@context": "https://example.org/custom/v1",
            "id": "did:example:issuer#zkey",
            "type": "Multikey",
            "controller": "did:example:issuer"
        });
        let method = VerificationMethod::from_json(&doc).unwrap();
        assert_eq!(
            method.check_context().unwrap_err().kind(),
            ErrorKind::KeypairImportError
        );
    }

    #[test]
    fn wire_names_are_camel_case() {
        let doc = json!({
            "@context": JWK_CONTEXT_V1,
            "id": "did:example:issuer#0",
            "type": "JsonWebKey",
            "controller": "did:example:issuer",
            "publicKeyJwk": {
                "kty": "EC", "use": "sig", "key_ops": ["verify"],
                "alg": "BLS12_381G2", "ext": true, "crv": "BLS12_381G2",
                "x": "AA", "y": ""
            }
        });
        let method = VerificationMethod::from_json(&doc).unwrap();
        let serialized = serde_json::to_value(&method).unwrap();
        assert!(serialized.get("publicKeyJwk").is_some());
        assert_eq!(serialized["type"], "JsonWebKey");
    }
}
