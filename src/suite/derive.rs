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

//! Holder pipeline: parse a base proof, deterministically replay the
//! issuer's canonical grouping, map statement indices between the three
//! overlapping groups, generate the BBS disclosure proof and build the
//! revealed document.

use crate::canonicalize::group::{canonicalize_and_group, GroupResult};
use crate::canonicalize::label_map::{compress_label_map, ShuffledIdLabelMapFactory};
use crate::canonicalize::pointer::select_json_ld;
use crate::canonicalize::{canonical_id_map, JsonLdProcessor};
use crate::errors::{Error, ErrorKind};
use crate::suite::bbs::{self, HolderSecrets};
use crate::suite::feature::FeatureOption;
use crate::suite::proof_value::{BaseProofValue, DerivedProofValue};
use crate::suite::DataIntegrityProof;
use oxrdf::Dataset;
use serde_json::Value;
use std::collections::BTreeMap;

/// Holder-side inputs to disclosure-proof derivation.
#[derive(Clone, Default)]
pub struct DeriveOptions {
    /// Statements the holder chooses to reveal, beyond the mandatory ones.
    pub selective_pointers: Vec<String>,
    /// Verifier-supplied presentation header, bound into the BBS proof.
    pub presentation_header: Vec<u8>,
    /// Secrets for the non-baseline features.
    pub holder_secrets: HolderSecrets,
}

/// A revealed document together with the disclosure proof over it.
#[derive(Clone, Debug)]
pub struct DisclosureProof {
    /// The selectively revealed document.
    pub reveal_document: Value,
    /// The disclosure proof over it.
    pub proof: DataIntegrityProof,
}

fn strip_blank_prefix(label: &str) -> &str {
    label.strip_prefix("_:").unwrap_or(label)
}

/// Relative positions of `member` keys within the ordered keys of
/// `enclosing`: walk the enclosing map in order, emitting the position of
/// every key that also belongs to the member map.
fn relative_indexes(
    enclosing: &BTreeMap<usize, String>,
    member: &BTreeMap<usize, String>,
) -> Vec<usize> {
    enclosing
        .keys()
        .copied()
        .enumerate()
        .filter(|(_, absolute)| member.contains_key(absolute))
        .map(|(relative, _)| relative)
        .collect()
}

/// # Description
/// Derives a disclosure proof: the issuer's canonical grouping is replayed
/// deterministically from the base proof's HMAC key, statement indices are
/// remapped relative to their enclosing lists, the feature-appropriate BBS
/// `ProofGen` runs over the non-mandatory statements, and the revealed
/// document is the JSON-LD selective projection of the combined pointers.
pub fn derive_proof(
    processor: &dyn JsonLdProcessor,
    document: &Value,
    proof: &DataIntegrityProof,
    options: &DeriveOptions,
) -> Result<DisclosureProof, Error> {
    const OP: &str = "deriveProof";
    let base = BaseProofValue::parse(&proof.proof_value)?;
    let factory = ShuffledIdLabelMapFactory::new(base.hmac_key);

    let combined_pointers: Vec<String> = base
        .mandatory_pointers
        .iter()
        .chain(options.selective_pointers.iter())
        .cloned()
        .collect();
    let definitions: BTreeMap<String, Vec<String>> = [
        ("mandatory".to_owned(), base.mandatory_pointers.clone()),
        ("selective".to_owned(), options.selective_pointers.clone()),
        ("combined".to_owned(), combined_pointers.clone()),
    ]
    .into_iter()
    .collect();
    let groups = canonicalize_and_group(processor, document, &factory, &definitions)?;
    let mandatory = &groups.groups["mandatory"];
    let selective = &groups.groups["selective"];
    let combined = &groups.groups["combined"];

    // Indices are relative to the enclosing list, not the full canonical
    // list: mandatory within combined, selective within non-mandatory.
    let mandatory_indexes = relative_indexes(&combined.matching, &mandatory.matching);
    let selective_indexes = relative_indexes(&mandatory.non_matching, &selective.matching);

    let bbs_messages: Vec<Vec<u8>> = mandatory
        .non_matching
        .values()
        .map(|nquad| nquad.as_bytes().to_vec())
        .collect();
    log::debug!(
        "deriving over {} statements: {} mandatory, {} selectively disclosed",
        groups.nquads.len(),
        mandatory_indexes.len(),
        selective_indexes.len()
    );

    let output = bbs::proof_gen(
        base.feature,
        &base.public_key,
        &base.bbs_signature,
        &base.bbs_header,
        &options.presentation_header,
        &bbs_messages,
        &selective_indexes,
        &options.holder_secrets,
    )?;
    let length_bbs_messages = match base.feature {
        FeatureOption::Baseline => None,
        _ => Some(bbs_messages.len()),
    };

    let reveal_document = select_json_ld(&combined_pointers, document)?.ok_or_else(|| {
        Error::new(
            ErrorKind::ProofGenerationError,
            OP,
            "nothing to reveal: no mandatory or selective pointers",
        )
    })?;

    let verifier_label_map = verifier_label_map(combined, &groups.label_map)?;
    let label_map = compress_label_map(&verifier_label_map)?;

    let nym_domain = match base.feature {
        FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => {
            options.holder_secrets.nym_domain.clone()
        }
        _ => None,
    };
    let proof_value = DerivedProofValue {
        bbs_proof: output.proof,
        label_map,
        mandatory_indexes,
        selective_indexes,
        presentation_header: options.presentation_header.clone(),
        feature: base.feature,
        nym_domain,
        pseudonym: output.pseudonym,
        length_bbs_messages,
    }
    .serialize()?;

    Ok(DisclosureProof {
        reveal_document,
        proof: DataIntegrityProof {
            options: proof.options.clone(),
            proof_value,
        },
    })
}

/// The issuer-side shuffled label map is private to the holder (it encodes
/// the HMAC key); the verifier canonicalizes the revealed statements without
/// it. Recanonicalizing the combined statements under plain RDFC-1.0 yields
/// the verifier's label space, which this map bridges back to the holder's
/// `bN` labels.
fn verifier_label_map(
    combined: &GroupResult,
    holder_label_map: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, Error> {
    const OP: &str = "verifier_label_map";
    let dataset: Dataset = combined.deskolemized_quads.iter().cloned().collect();
    let canonical = canonical_id_map(&dataset)?;
    canonical
        .iter()
        .map(|(input_label, verifier_label)| {
            let holder_label = holder_label_map
                .get(strip_blank_prefix(input_label))
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::ProofGenerationError,
                        OP,
                        format!("input label {input_label:?} missing from the holder label map"),
                    )
                })?;
            Ok((
                strip_blank_prefix(verifier_label).to_owned(),
                holder_label.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(usize, &str)]) -> BTreeMap<usize, String> {
        entries
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect()
    }

    #[test]
    fn relative_indexes_are_positions_in_the_enclosing_list() {
        let enclosing = map(&[(0, "a"), (2, "b"), (5, "c"), (7, "d")]);
        let member = map(&[(2, "b"), (7, "d")]);
        assert_eq!(relative_indexes(&enclosing, &member), [1, 3]);
    }

    #[test]
    fn relative_indexes_skip_members_outside_the_enclosing_list() {
        // A selective statement that is also mandatory does not appear in
        // the non-mandatory list and must be skipped, not miscounted.
        let enclosing = map(&[(1, "a"), (4, "b")]);
        let member = map(&[(0, "m"), (4, "b")]);
        assert_eq!(relative_indexes(&enclosing, &member), [1]);
    }

    #[test]
    fn relative_indexes_are_strictly_ascending() {
        let enclosing = map(&[(0, "a"), (1, "b"), (2, "c"), (3, "d")]);
        let member = map(&[(0, "a"), (2, "c"), (3, "d")]);
        let indexes = relative_indexes(&enclosing, &member);
        assert!(indexes.windows(2).all(|w| w[0] < w[1]));
        assert!(indexes.iter().all(|&i| i < enclosing.len()));
    }

    #[test]
    fn strip_blank_prefix_only_strips_the_sigil() {
        assert_eq!(strip_blank_prefix("_:c14n0"), "c14n0");
        assert_eq!(strip_blank_prefix("c14n0"), "c14n0");
    }
}
