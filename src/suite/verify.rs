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

//! Verifier pipeline: recanonicalize the revealed document under the
//! transmitted label map, reconstruct the BBS header and disclosed
//! messages, and check the disclosure proof.

use crate::canonicalize::label_map::{decompress_label_map, VerifierLabelMapFactory};
use crate::canonicalize::{canonicalize_with_factory, JsonLdProcessor};
use crate::errors::{Error, ErrorKind};
use crate::keys::pair::{Bls12381G2KeyPair, ImportOptions};
use crate::suite::base::canonical_proof_config;
use crate::suite::bbs;
use crate::suite::proof_value::DerivedProofValue;
use crate::suite::DataIntegrityProof;
use crate::utils::util::sha256;
use serde_json::Value;

/// # Description
/// Verifies a disclosure proof over `reveal_document`. The document is
/// recanonicalized with the holder-assigned blank-node labels carried by the
/// proof, partitioned by the transmitted mandatory indexes, and the BBS
/// proof verifier runs over the reconstructed header and disclosed
/// messages.
///
/// # Output:
/// * `Ok(true)` when the proof cryptographically verifies, `Ok(false)` when
///   it does not; malformed inputs are errors.
pub fn verify_proof(
    processor: &dyn JsonLdProcessor,
    reveal_document: &Value,
    proof: &DataIntegrityProof,
) -> Result<bool, Error> {
    const OP: &str = "verifyProof";
    let config = canonical_proof_config(processor, reveal_document, &proof.options)?;
    let proof_hash = sha256(config.as_bytes());

    let derived = DerivedProofValue::parse(&proof.proof_value)?;
    let label_map = decompress_label_map(&derived.label_map);
    let factory = VerifierLabelMapFactory::new(label_map);

    let dataset = processor.to_rdf(reveal_document)?;
    let (nquads, _) = canonicalize_with_factory(&dataset, &factory)?;

    if let Some(&max) = derived.mandatory_indexes.last() {
        if max >= nquads.len() {
            return Err(Error::new(
                ErrorKind::ProofVerificationError,
                OP,
                format!(
                    "mandatory index {max} out of range for {} revealed statements",
                    nquads.len()
                ),
            ));
        }
    }
    let mut mandatory = Vec::new();
    let mut non_mandatory = Vec::new();
    for (index, nquad) in nquads.iter().enumerate() {
        if derived.mandatory_indexes.binary_search(&index).is_ok() {
            mandatory.push(nquad.as_str());
        } else {
            non_mandatory.push(nquad.as_bytes().to_vec());
        }
    }

    let mandatory_hash = sha256(mandatory.concat().as_bytes());
    let mut bbs_header = [0u8; 64];
    bbs_header[..32].copy_from_slice(&proof_hash);
    bbs_header[32..].copy_from_slice(&mandatory_hash);

    let method_document = processor.load_document(&proof.options.verification_method)?;
    let keypair = Bls12381G2KeyPair::import(&method_document, ImportOptions::default())?;
    let public_key = keypair.public_key().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidVerificationMethod,
            OP,
            "verification method carries no public key",
        )
    })?;
    log::debug!(
        "verifying {} disclosed statements ({} mandatory)",
        non_mandatory.len(),
        mandatory.len()
    );

    bbs::proof_verify(
        derived.feature,
        public_key.as_bytes(),
        &derived.bbs_proof,
        &bbs_header,
        &derived.presentation_header,
        &non_mandatory,
        &derived.selective_indexes,
        derived.length_bbs_messages,
        derived.pseudonym.as_deref(),
        derived.nym_domain.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::ProofOptions;

    struct NoProcessor;

    impl JsonLdProcessor for NoProcessor {
        fn to_rdf(&self, _: &Value) -> Result<oxrdf::Dataset, Error> {
            Ok(oxrdf::Dataset::new())
        }
        fn skolemize_compact(&self, document: &Value, _: &str) -> Result<Value, Error> {
            Ok(document.clone())
        }
        fn load_document(&self, url: &str) -> Result<Value, Error> {
            Err(Error::new(
                ErrorKind::InvalidVerificationMethod,
                "NoProcessor::load_document",
                format!("unknown document {url:?}"),
            ))
        }
    }

    #[test]
    fn malformed_proof_value_is_a_verification_error() {
        let proof = DataIntegrityProof {
            options: ProofOptions::new("did:example:issuer#key"),
            proof_value: "zNotBase64Url".to_owned(),
        };
        let err = verify_proof(&NoProcessor, &serde_json::json!({}), &proof).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProofVerificationError);
    }
}
