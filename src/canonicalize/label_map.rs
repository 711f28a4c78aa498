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

use crate::canonicalize::LabelMapFactory;
use crate::errors::{Error, ErrorKind};
use crate::utils::util::{hmac_sha256, HMAC_KEY_LENGTH};
use multibase::Base;
use std::collections::BTreeMap;

/// Label-map factory assigning HMAC-shuffled `bN` labels.
///
/// Every canonical `c14nN` label is HMAC'd under the factory key and the
/// base64url encodings of the digests are sorted; a label's replacement is
/// `b` followed by its digest's rank. Labels are pseudorandom across
/// documents but deterministic per key, so issuer and holder derive the same
/// assignment without sharing state beyond `hmacKey`.
pub struct ShuffledIdLabelMapFactory {
    hmac_key: [u8; HMAC_KEY_LENGTH],
}

impl ShuffledIdLabelMapFactory {
    /// A factory shuffling under `hmac_key`.
    pub fn new(hmac_key: [u8; HMAC_KEY_LENGTH]) -> Self {
        Self { hmac_key }
    }
}

impl LabelMapFactory for ShuffledIdLabelMapFactory {
    fn create(
        &self,
        canonical_id_map: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, Error> {
        let hmac_ids: BTreeMap<&String, String> = canonical_id_map
            .iter()
            .map(|(input, c14n)| {
                let digest = hmac_sha256(&self.hmac_key, c14n.as_bytes());
                (input, Base::Base64Url.encode(digest))
            })
            .collect();
        let mut sorted: Vec<String> = hmac_ids.values().cloned().collect();
        sorted.sort_unstable();
        Ok(hmac_ids
            .iter()
            .map(|(input, hmac_id)| {
                let rank = sorted
                    .binary_search(hmac_id)
                    .expect("digest taken from the sorted set");
                ((*input).clone(), format!("b{rank}"))
            })
            .collect())
    }
}

/// Label-map factory replaying a transmitted label map on the verifier side:
/// the canonical `c14nN` labels recomputed from the revealed document are
/// mapped back to the holder-assigned `bN` labels.
pub struct VerifierLabelMapFactory {
    label_map: BTreeMap<String, String>,
}

impl VerifierLabelMapFactory {
    /// `label_map` maps canonical labels (`c14nN`) to holder labels (`bN`).
    pub fn new(label_map: BTreeMap<String, String>) -> Self {
        Self { label_map }
    }
}

impl LabelMapFactory for VerifierLabelMapFactory {
    fn create(
        &self,
        canonical_id_map: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, Error> {
        canonical_id_map
            .iter()
            .map(|(input, c14n)| {
                let replacement = self.label_map.get(c14n).ok_or_else(|| {
                    Error::new(
                        ErrorKind::ProofVerificationError,
                        "VerifierLabelMapFactory::create",
                        format!("label map has no entry for {c14n:?}"),
                    )
                })?;
                Ok((input.clone(), replacement.clone()))
            })
            .collect()
    }
}

fn parse_suffix(
    value: &str,
    prefix: &str,
    operation: &'static str,
) -> Result<u64, Error> {
    value
        .strip_prefix(prefix)
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::ProofGenerationError,
                operation,
                format!("label {value:?} does not match {prefix}<integer>"),
            )
        })
}

/// # Description
/// Compresses a textual label map (`c14nN` to `bM`) to its integer wire form
/// (`N` to `M`). Any prefix or integer-parse failure is a shape violation.
pub fn compress_label_map(
    label_map: &BTreeMap<String, String>,
) -> Result<BTreeMap<u64, u64>, Error> {
    const OP: &str = "compressLabelMap";
    label_map
        .iter()
        .map(|(k, v)| Ok((parse_suffix(k, "c14n", OP)?, parse_suffix(v, "b", OP)?)))
        .collect()
}

/// Inverse of [`compress_label_map`].
pub fn decompress_label_map(compressed: &BTreeMap<u64, u64>) -> BTreeMap<String, String> {
    compressed
        .iter()
        .map(|(k, v)| (format!("c14n{k}"), format!("b{v}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn shuffled_labels_are_a_permutation() {
        let factory = ShuffledIdLabelMapFactory::new([3u8; HMAC_KEY_LENGTH]);
        let input = canonical_map(&[("e0", "c14n0"), ("e1", "c14n1"), ("e2", "c14n2")]);
        let map = factory.create(&input).unwrap();
        let mut labels: Vec<&str> = map.values().map(String::as_str).collect();
        labels.sort_unstable();
        assert_eq!(labels, ["b0", "b1", "b2"]);
    }

    #[test]
    fn shuffled_labels_are_deterministic_per_key() {
        let input = canonical_map(&[("e0", "c14n0"), ("e1", "c14n1")]);
        let a = ShuffledIdLabelMapFactory::new([7u8; HMAC_KEY_LENGTH])
            .create(&input)
            .unwrap();
        let b = ShuffledIdLabelMapFactory::new([7u8; HMAC_KEY_LENGTH])
            .create(&input)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_shuffle_differently() {
        // Three labels give six permutations; two random keys colliding on
        // the same permutation is possible but the fixed keys below do not.
        let input = canonical_map(&[("e0", "c14n0"), ("e1", "c14n1"), ("e2", "c14n2")]);
        let a = ShuffledIdLabelMapFactory::new([1u8; HMAC_KEY_LENGTH])
            .create(&input)
            .unwrap();
        let b = ShuffledIdLabelMapFactory::new([2u8; HMAC_KEY_LENGTH])
            .create(&input)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verifier_factory_replays_label_map() {
        let stored = canonical_map(&[("c14n0", "b3"), ("c14n1", "b0")]);
        let factory = VerifierLabelMapFactory::new(stored);
        let issued = canonical_map(&[("x", "c14n0"), ("y", "c14n1")]);
        let map = factory.create(&issued).unwrap();
        assert_eq!(map["x"], "b3");
        assert_eq!(map["y"], "b0");
    }

    #[test]
    fn verifier_factory_missing_entry_fails() {
        let factory = VerifierLabelMapFactory::new(BTreeMap::new());
        let issued = canonical_map(&[("x", "c14n0")]);
        assert_eq!(
            factory.create(&issued).unwrap_err().kind(),
            ErrorKind::ProofVerificationError
        );
    }

    #[test]
    fn compress_round_trip() {
        let map = canonical_map(&[("c14n0", "b3"), ("c14n2", "b0")]);
        let compressed = compress_label_map(&map).unwrap();
        assert_eq!(compressed, [(0u64, 3u64), (2, 0)].into_iter().collect());
        assert_eq!(decompress_label_map(&compressed), map);
    }

    #[test]
    fn compress_rejects_foreign_prefixes() {
        for bad in [
            canonical_map(&[("n0", "b3")]),
            canonical_map(&[("c14n0", "x3")]),
            canonical_map(&[("c14nx", "b3")]),
        ] {
            assert_eq!(
                compress_label_map(&bad).unwrap_err().kind(),
                ErrorKind::ProofGenerationError
            );
        }
    }
}
