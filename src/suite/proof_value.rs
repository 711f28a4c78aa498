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

//! Proof-value envelope: a 3-byte feature-tagged header followed by a CBOR
//! positional array, the whole string multibase-base64url-no-pad encoded.

use crate::errors::{Error, ErrorKind};
use crate::suite::feature::FeatureOption;
use ciborium::value::Value as Cbor;
use multibase::Base;
use std::collections::BTreeMap;

const OP_BASE_SERIALIZE: &str = "serializeBaseProofValue";
const OP_BASE_PARSE: &str = "parseBaseProofValue";
const OP_DERIVED_SERIALIZE: &str = "serializeDerivedProofValue";
const OP_DERIVED_PARSE: &str = "parseDerivedProofValue";

/// Octet length of a BBS signature.
pub const BBS_SIGNATURE_LENGTH: usize = 80;
/// Octet length of the BBS header (two SHA-256 digests).
pub const BBS_HEADER_LENGTH: usize = 64;
/// Octet length of a compressed G2 public key.
pub const BBS_PUBLIC_KEY_LENGTH: usize = 96;
/// Octet length of the label-shuffling HMAC key.
pub const HMAC_KEY_LENGTH: usize = 32;

/// Payload of a base proof as issued.
#[derive(Clone, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub struct BaseProofValue {
    pub bbs_signature: Vec<u8>,
    pub bbs_header: [u8; BBS_HEADER_LENGTH],
    pub public_key: [u8; BBS_PUBLIC_KEY_LENGTH],
    pub hmac_key: [u8; HMAC_KEY_LENGTH],
    pub mandatory_pointers: Vec<String>,
    pub feature: FeatureOption,
    /// Present exactly for the pseudonym features.
    pub signer_nym_entropy: Option<Vec<u8>>,
}

/// Payload of a derived (disclosure) proof.
#[derive(Clone, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub struct DerivedProofValue {
    pub bbs_proof: Vec<u8>,
    /// Compressed label map, canonical index to holder index.
    pub label_map: BTreeMap<u64, u64>,
    pub mandatory_indexes: Vec<usize>,
    pub selective_indexes: Vec<usize>,
    pub presentation_header: Vec<u8>,
    pub feature: FeatureOption,
    /// Present exactly for the pseudonym features.
    pub nym_domain: Option<Vec<u8>>,
    /// Present exactly for the pseudonym features.
    pub pseudonym: Option<Vec<u8>>,
    /// Present exactly for the non-baseline features.
    pub length_bbs_messages: Option<usize>,
}

fn encode_envelope(header: [u8; 3], components: Vec<Cbor>, operation: &'static str) -> Result<String, Error> {
    let mut bytes = header.to_vec();
    ciborium::into_writer(&Cbor::Array(components), &mut bytes)
        .map_err(|e| Error::new(ErrorKind::ProofGenerationError, operation, format!("{e}")))?;
    Ok(multibase::encode(Base::Base64Url, bytes))
}

fn decode_envelope(value: &str, operation: &'static str) -> Result<(Vec<u8>, Vec<Cbor>), Error> {
    if !value.starts_with('u') {
        return Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            "proof value must be multibase-base64url-no-pad (leading 'u')",
        ));
    }
    let (base, bytes) = multibase::decode(value)
        .map_err(|e| Error::new(ErrorKind::ProofVerificationError, operation, format!("{e}")))?;
    if base != Base::Base64Url {
        return Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            "proof value must be multibase-base64url-no-pad (leading 'u')",
        ));
    }
    if bytes.len() < 3 {
        return Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            "proof value too short for a header",
        ));
    }
    let payload: Cbor = ciborium::from_reader(&bytes[3..])
        .map_err(|e| Error::new(ErrorKind::ProofVerificationError, operation, format!("{e}")))?;
    match payload {
        Cbor::Array(components) => Ok((bytes[..3].to_vec(), components)),
        _ => Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            "proof value payload is not a CBOR array",
        )),
    }
}

fn component_bytes(
    component: &Cbor,
    name: &str,
    expected_length: Option<usize>,
    operation: &'static str,
) -> Result<Vec<u8>, Error> {
    let bytes = component.as_bytes().ok_or_else(|| {
        Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            format!("{name} must be a CBOR byte string"),
        )
    })?;
    if let Some(expected) = expected_length {
        if bytes.len() != expected {
            return Err(Error::new(
                ErrorKind::ProofVerificationError,
                operation,
                format!("{name} must be {expected} bytes, got {}", bytes.len()),
            ));
        }
    }
    Ok(bytes.clone())
}

fn component_index(component: &Cbor, name: &str, operation: &'static str) -> Result<usize, Error> {
    let malformed = || {
        Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            format!("{name} must be a non-negative integer"),
        )
    };
    match component {
        Cbor::Integer(value) => {
            let value = i128::from(*value);
            usize::try_from(value).map_err(|_| malformed())
        }
        _ => Err(malformed()),
    }
}

fn component_index_array(
    component: &Cbor,
    name: &str,
    operation: &'static str,
) -> Result<Vec<usize>, Error> {
    let items = component.as_array().ok_or_else(|| {
        Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            format!("{name} must be a CBOR array"),
        )
    })?;
    let indexes = items
        .iter()
        .map(|item| component_index(item, name, operation))
        .collect::<Result<Vec<usize>, Error>>()?;
    if !indexes.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            format!("{name} must be strictly ascending"),
        ));
    }
    Ok(indexes)
}

fn expect_components(
    components: &[Cbor],
    expected: usize,
    operation: &'static str,
) -> Result<(), Error> {
    if components.len() != expected {
        return Err(Error::new(
            ErrorKind::ProofVerificationError,
            operation,
            format!(
                "expected {expected} proof components, got {}",
                components.len()
            ),
        ));
    }
    Ok(())
}

impl BaseProofValue {
    /// # Description
    /// Serializes the base proof to its multibase envelope. The pseudonym
    /// invariant is enforced: `signerNymEntropy` is carried exactly for the
    /// pseudonym features.
    pub fn serialize(&self) -> Result<String, Error> {
        if self.feature.uses_pseudonym() != self.signer_nym_entropy.is_some() {
            return Err(Error::new(
                ErrorKind::ProofGenerationError,
                OP_BASE_SERIALIZE,
                "signerNymEntropy is carried exactly for the pseudonym features",
            ));
        }
        let mut components = vec![
            Cbor::Bytes(self.bbs_signature.clone()),
            Cbor::Bytes(self.bbs_header.to_vec()),
            Cbor::Bytes(self.public_key.to_vec()),
            Cbor::Bytes(self.hmac_key.to_vec()),
            Cbor::Array(
                self.mandatory_pointers
                    .iter()
                    .map(|p| Cbor::Text(p.clone()))
                    .collect(),
            ),
        ];
        if let Some(entropy) = &self.signer_nym_entropy {
            components.push(Cbor::Bytes(entropy.clone()));
        }
        encode_envelope(self.feature.base_header(), components, OP_BASE_SERIALIZE)
    }

    /// # Description
    /// Parses and validates a base proof envelope: multibase prefix, CBOR
    /// tag, feature byte, component count, and each component's type and
    /// fixed length. Any mismatch is a proof-verification failure.
    pub fn parse(value: &str) -> Result<Self, Error> {
        const OP: &str = OP_BASE_PARSE;
        let (header, components) = decode_envelope(value, OP)?;
        let feature = FeatureOption::from_base_header(&header)?;
        let expected = if feature.uses_pseudonym() { 6 } else { 5 };
        expect_components(&components, expected, OP)?;

        let bbs_signature =
            component_bytes(&components[0], "bbsSignature", Some(BBS_SIGNATURE_LENGTH), OP)?;
        let bbs_header: [u8; BBS_HEADER_LENGTH] =
            component_bytes(&components[1], "bbsHeader", Some(BBS_HEADER_LENGTH), OP)?
                .try_into()
                .expect("length checked");
        let public_key: [u8; BBS_PUBLIC_KEY_LENGTH] =
            component_bytes(&components[2], "publicKey", Some(BBS_PUBLIC_KEY_LENGTH), OP)?
                .try_into()
                .expect("length checked");
        let hmac_key: [u8; HMAC_KEY_LENGTH] =
            component_bytes(&components[3], "hmacKey", Some(HMAC_KEY_LENGTH), OP)?
                .try_into()
                .expect("length checked");
        let mandatory_pointers = components[4]
            .as_array()
            .ok_or_else(|| {
                Error::new(ErrorKind::ProofVerificationError, OP, "mandatoryPointers must be a CBOR array")
            })?
            .iter()
            .map(|item| {
                item.as_text().map(str::to_owned).ok_or_else(|| {
                    Error::new(
                        ErrorKind::ProofVerificationError,
                        OP,
                        "mandatoryPointers entries must be CBOR text",
                    )
                })
            })
            .collect::<Result<Vec<String>, Error>>()?;
        let signer_nym_entropy = if feature.uses_pseudonym() {
            Some(component_bytes(&components[5], "signerNymEntropy", None, OP)?)
        } else {
            None
        };

        Ok(Self {
            bbs_signature,
            bbs_header,
            public_key,
            hmac_key,
            mandatory_pointers,
            feature,
            signer_nym_entropy,
        })
    }
}

impl DerivedProofValue {
    /// # Description
    /// Serializes the disclosure proof to its multibase envelope, enforcing
    /// the feature invariants on `lengthBBSMessages`, `nymDomain` and
    /// `pseudonym`.
    pub fn serialize(&self) -> Result<String, Error> {
        const OP: &str = OP_DERIVED_SERIALIZE;
        let non_baseline = self.feature != FeatureOption::Baseline;
        if non_baseline != self.length_bbs_messages.is_some() {
            return Err(Error::new(
                ErrorKind::ProofGenerationError,
                OP,
                "lengthBBSMessages is carried exactly for non-baseline features",
            ));
        }
        if self.feature.uses_pseudonym()
            != (self.nym_domain.is_some() && self.pseudonym.is_some())
        {
            return Err(Error::new(
                ErrorKind::ProofGenerationError,
                OP,
                "nymDomain and pseudonym are carried exactly for the pseudonym features",
            ));
        }

        let label_map = Cbor::Map(
            self.label_map
                .iter()
                .map(|(k, v)| (Cbor::Integer((*k).into()), Cbor::Integer((*v).into())))
                .collect(),
        );
        let index_array = |indexes: &[usize]| {
            Cbor::Array(
                indexes
                    .iter()
                    .map(|&i| Cbor::Integer((i as u64).into()))
                    .collect(),
            )
        };
        let mut components = vec![
            Cbor::Bytes(self.bbs_proof.clone()),
            label_map,
            index_array(&self.mandatory_indexes),
            index_array(&self.selective_indexes),
            Cbor::Bytes(self.presentation_header.clone()),
        ];
        match self.feature {
            FeatureOption::Baseline => {}
            FeatureOption::AnonymousHolderBinding => {
                let length = self.length_bbs_messages.expect("checked above");
                components.push(Cbor::Integer((length as u64).into()));
            }
            FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => {
                components.push(Cbor::Bytes(self.nym_domain.clone().expect("checked above")));
                components.push(Cbor::Bytes(self.pseudonym.clone().expect("checked above")));
                let length = self.length_bbs_messages.expect("checked above");
                components.push(Cbor::Integer((length as u64).into()));
            }
        }
        encode_envelope(self.feature.derived_header(), components, OP)
    }

    /// # Description
    /// Parses and validates a disclosure proof envelope. Index arrays must
    /// hold strictly ascending non-negative integers; the label map must be
    /// integer-keyed and integer-valued.
    pub fn parse(value: &str) -> Result<Self, Error> {
        const OP: &str = OP_DERIVED_PARSE;
        let (header, components) = decode_envelope(value, OP)?;
        let feature = FeatureOption::from_derived_header(&header)?;
        let expected = match feature {
            FeatureOption::Baseline => 5,
            FeatureOption::AnonymousHolderBinding => 6,
            FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => 8,
        };
        expect_components(&components, expected, OP)?;

        let bbs_proof = component_bytes(&components[0], "bbsProof", None, OP)?;
        let label_map = components[1]
            .as_map()
            .ok_or_else(|| {
                Error::new(ErrorKind::ProofVerificationError, OP, "labelMap must be a CBOR map")
            })?
            .iter()
            .map(|(k, v)| {
                Ok((
                    component_index(k, "labelMap key", OP)? as u64,
                    component_index(v, "labelMap value", OP)? as u64,
                ))
            })
            .collect::<Result<BTreeMap<u64, u64>, Error>>()?;
        let mandatory_indexes = component_index_array(&components[2], "mandatoryIndexes", OP)?;
        let selective_indexes = component_index_array(&components[3], "selectiveIndexes", OP)?;
        let presentation_header = component_bytes(&components[4], "presentationHeader", None, OP)?;

        let (nym_domain, pseudonym, length_bbs_messages) = match feature {
            FeatureOption::Baseline => (None, None, None),
            FeatureOption::AnonymousHolderBinding => (
                None,
                None,
                Some(component_index(&components[5], "lengthBBSMessages", OP)?),
            ),
            FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => (
                Some(component_bytes(&components[5], "nymDomain", None, OP)?),
                Some(component_bytes(&components[6], "pseudonym", None, OP)?),
                Some(component_index(&components[7], "lengthBBSMessages", OP)?),
            ),
        };

        Ok(Self {
            bbs_proof,
            label_map,
            mandatory_indexes,
            selective_indexes,
            presentation_header,
            feature,
            nym_domain,
            pseudonym,
            length_bbs_messages,
        })
    }
}
