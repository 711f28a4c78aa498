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

//! Issuer pipeline: transform the unsecured document, hash it together with
//! the proof configuration, sign with BBS and emit the base proof.

use crate::canonicalize::group::canonicalize_and_group;
use crate::canonicalize::label_map::ShuffledIdLabelMapFactory;
use crate::canonicalize::JsonLdProcessor;
use crate::errors::{Error, ErrorKind};
use crate::keys::pair::{Bls12381G2KeyPair, ImportOptions};
use crate::suite::bbs;
use crate::suite::feature::FeatureOption;
use crate::suite::proof_value::BaseProofValue;
use crate::suite::{DataIntegrityProof, ProofOptions};
use crate::utils::util::{generate_random_bytes, parse_w3c_datetime, sha256, HMAC_KEY_LENGTH};
use serde_json::Value;
use std::collections::BTreeMap;

/// Feature inputs to base-proof creation.
#[derive(Clone, Default)]
pub struct BaseProofParams {
    /// The optional feature the proof is created under.
    pub feature: FeatureOption,
    /// Holder commitment, required by every non-baseline feature.
    pub commitment_with_proof: Option<Vec<u8>>,
    /// Signer-side pseudonym entropy, required by the pseudonym features.
    pub signer_nym_entropy: Option<[u8; 32]>,
}

/// The unsecured document transformed for signing: the canonical statement
/// list partitioned into mandatory and non-mandatory groups, plus the HMAC
/// key that shuffled the blank-node labels.
///
/// `mandatory` and `non_mandatory` partition the canonical N-Quad set;
/// original statement indices are the keys, so the maps compose with other
/// groupings over the same document.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct TransformedDocument {
    pub mandatory_pointers: Vec<String>,
    pub mandatory: BTreeMap<usize, String>,
    pub non_mandatory: BTreeMap<usize, String>,
    pub hmac_key: [u8; HMAC_KEY_LENGTH],
}

/// [`TransformedDocument`] plus the two digests bound into the BBS header.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub struct HashData {
    pub transformed: TransformedDocument,
    pub proof_hash: [u8; 32],
    pub mandatory_hash: [u8; 32],
}

impl HashData {
    /// `proofHash || mandatoryHash`, the 64-byte BBS header.
    pub fn bbs_header(&self) -> [u8; 64] {
        let mut header = [0u8; 64];
        header[..32].copy_from_slice(&self.proof_hash);
        header[32..].copy_from_slice(&self.mandatory_hash);
        header
    }
}

/// # Description
/// Base proof transformation: validates the proof options against the suite,
/// draws a fresh HMAC key and group-canonicalizes the document under a
/// single `mandatory` group.
pub fn transform(
    processor: &dyn JsonLdProcessor,
    unsecured_document: &Value,
    options: &ProofOptions,
    mandatory_pointers: &[String],
) -> Result<TransformedDocument, Error> {
    const OP: &str = "transform";
    options.ensure_suite(OP)?;

    let mut hmac_key = [0u8; HMAC_KEY_LENGTH];
    hmac_key.copy_from_slice(&generate_random_bytes(HMAC_KEY_LENGTH));

    let factory = ShuffledIdLabelMapFactory::new(hmac_key);
    let definitions: BTreeMap<String, Vec<String>> =
        [("mandatory".to_owned(), mandatory_pointers.to_vec())]
            .into_iter()
            .collect();
    let mut result =
        canonicalize_and_group(processor, unsecured_document, &factory, &definitions)?;
    let group = result
        .groups
        .remove("mandatory")
        .expect("requested group is present");
    Ok(TransformedDocument {
        mandatory_pointers: mandatory_pointers.to_vec(),
        mandatory: group.matching,
        non_mandatory: group.non_matching,
        hmac_key,
    })
}

/// # Description
/// Base proof configuration: deep-copies the proof options, validates them,
/// validates `created` when set, borrows `@context` from the unsecured
/// document and canonicalizes the configuration under URDNA2015.
///
/// # Output:
/// * the canonical proof-configuration N-Quads as one string.
pub fn canonical_proof_config(
    processor: &dyn JsonLdProcessor,
    unsecured_document: &Value,
    options: &ProofOptions,
) -> Result<String, Error> {
    const OP: &str = "proofConfig";
    let mut config = options.clone();
    config.ensure_suite(OP)?;
    if let Some(created) = &config.created {
        parse_w3c_datetime(created, ErrorKind::ProofGenerationError, OP)?;
    }
    config.context = unsecured_document.get("@context").cloned();

    let config_json = serde_json::to_value(&config)
        .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
    let dataset = processor.to_rdf(&config_json)?;
    let issued = rdf_canon::issue(&dataset)
        .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
    let relabeled = rdf_canon::relabel(&dataset, &issued)
        .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
    Ok(rdf_canon::serialize(&relabeled))
}

/// # Description
/// Base proof hashing: `proofHash` over the canonical proof configuration
/// and `mandatoryHash` over the joined mandatory N-Quads. The two digests
/// are independent of each other; only their concatenation is ordered.
pub fn hash(canonical_config: &str, transformed: TransformedDocument) -> HashData {
    let proof_hash = sha256(canonical_config.as_bytes());
    let joined: String = transformed.mandatory.values().cloned().collect();
    let mandatory_hash = sha256(joined.as_bytes());
    HashData {
        transformed,
        proof_hash,
        mandatory_hash,
    }
}

/// # Description
/// Base proof serialization: resolves the verification method through the
/// document loader, signs the non-mandatory statements with the
/// feature-appropriate BBS operation and wraps everything in the base
/// envelope.
pub fn serialize(
    processor: &dyn JsonLdProcessor,
    hash_data: &HashData,
    options: &ProofOptions,
    params: &BaseProofParams,
) -> Result<DataIntegrityProof, Error> {
    const OP: &str = "serializeBaseProof";
    let method_document = processor.load_document(&options.verification_method)?;
    let keypair = Bls12381G2KeyPair::import(&method_document, ImportOptions::default())?;
    let (secret, public) = match (keypair.secret_key(), keypair.public_key()) {
        (Some(secret), Some(public)) => (secret, public),
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidVerificationMethod,
                OP,
                "signing requires both secret and public key material",
            ))
        }
    };

    let bbs_header = hash_data.bbs_header();
    let bbs_messages: Vec<Vec<u8>> = hash_data
        .transformed
        .non_mandatory
        .values()
        .map(|nquad| nquad.as_bytes().to_vec())
        .collect();
    log::debug!(
        "signing {} non-mandatory statements ({} mandatory)",
        bbs_messages.len(),
        hash_data.transformed.mandatory.len()
    );

    let bbs_signature = bbs::sign(
        params.feature,
        secret.as_bytes(),
        public.as_bytes(),
        &bbs_header,
        &bbs_messages,
        params.commitment_with_proof.as_deref(),
        params.signer_nym_entropy.as_ref(),
    )?;

    let mut public_key = [0u8; 96];
    public_key.copy_from_slice(public.as_bytes());
    let proof_value = BaseProofValue {
        bbs_signature,
        bbs_header,
        public_key,
        hmac_key: hash_data.transformed.hmac_key,
        mandatory_pointers: hash_data.transformed.mandatory_pointers.clone(),
        feature: params.feature,
        signer_nym_entropy: params.signer_nym_entropy.map(|e| e.to_vec()),
    }
    .serialize()?;

    Ok(DataIntegrityProof {
        options: options.clone(),
        proof_value,
    })
}

/// # Description
/// The complete issuer pipeline: transform, configure, hash, sign and
/// serialize a base proof over `unsecured_document`.
pub fn create_base_proof(
    processor: &dyn JsonLdProcessor,
    unsecured_document: &Value,
    options: &ProofOptions,
    mandatory_pointers: &[String],
    params: &BaseProofParams,
) -> Result<DataIntegrityProof, Error> {
    let transformed = transform(processor, unsecured_document, options, mandatory_pointers)?;
    let config = canonical_proof_config(processor, unsecured_document, options)?;
    let hash_data = hash(&config, transformed);
    serialize(processor, &hash_data, options, params)
}
