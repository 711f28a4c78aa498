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

//! The `bbs-2023` Data Integrity suite: base-proof issuance, disclosure
//! derivation and verification pipelines plus the proof-value envelope.

/// Issuer pipeline: transform, hash, sign, serialize
pub mod base;
/// zkryptium bindings per feature
pub mod bbs;
/// Holder pipeline: disclosure proof derivation
pub mod derive;
/// Optional suite features and their envelope tags
pub mod feature;
/// CBOR + multibase proof-value envelope
pub mod proof_value;
/// Verifier pipeline
pub mod verify;

use crate::errors::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Proof type identifier required by the suite.
pub const PROOF_TYPE: &str = "DataIntegrityProof";
/// Cryptosuite identifier required by the suite.
pub const CRYPTOSUITE: &str = "bbs-2023";

/// Proof options as supplied by the caller and embedded in proofs.
///
/// Unknown members (`domain`, `challenge`, `previousProof`, ...) are carried
/// through `extra` so they survive the deep copy into the proof
/// configuration.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ProofOptions {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(rename = "type")]
    pub proof_type: String,
    pub cryptosuite: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    pub verification_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProofOptions {
    /// Minimal options for an assertion proof signed by `verification_method`.
    pub fn new(verification_method: impl Into<String>) -> Self {
        Self {
            context: None,
            proof_type: PROOF_TYPE.to_owned(),
            cryptosuite: CRYPTOSUITE.to_owned(),
            created: None,
            verification_method: verification_method.into(),
            proof_purpose: Some("assertionMethod".to_owned()),
            extra: Map::new(),
        }
    }

    /// Rejects options whose `type` or `cryptosuite` identify a different
    /// suite.
    pub(crate) fn ensure_suite(&self, operation: &'static str) -> Result<(), Error> {
        if self.proof_type != PROOF_TYPE || self.cryptosuite != CRYPTOSUITE {
            return Err(Error::new(
                ErrorKind::ProofTransformationError,
                operation,
                format!(
                    "expected type {PROOF_TYPE:?} with cryptosuite {CRYPTOSUITE:?}, \
                     got {:?}/{:?}",
                    self.proof_type, self.cryptosuite
                ),
            ));
        }
        Ok(())
    }
}

/// A complete Data Integrity proof: the options it was created under plus
/// the multibase proof value.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIntegrityProof {
    /// The options the proof was created under.
    #[serde(flatten)]
    pub options: ProofOptions,
    /// Multibase-encoded proof envelope, leading `u`.
    pub proof_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_the_suite_identifiers() {
        let options = ProofOptions::new("did:example:issuer#key-1");
        assert!(options.ensure_suite("test").is_ok());
        assert_eq!(options.proof_purpose.as_deref(), Some("assertionMethod"));
    }

    #[test]
    fn foreign_cryptosuite_rejected() {
        let mut options = ProofOptions::new("did:example:issuer#key-1");
        options.cryptosuite = "ecdsa-sd-2023".to_owned();
        let err = options.ensure_suite("test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProofTransformationError);
    }

    #[test]
    fn unknown_members_survive_serialization() {
        let mut options = ProofOptions::new("did:example:issuer#key-1");
        options
            .extra
            .insert("challenge".to_owned(), Value::String("abc".to_owned()));
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["challenge"], "abc");
        assert_eq!(json["verificationMethod"], "did:example:issuer#key-1");
        let back: ProofOptions = serde_json::from_value(json).unwrap();
        assert_eq!(back, options);
    }
}
