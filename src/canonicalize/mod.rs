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

//! Canonical grouping of JSON-LD documents.
//!
//! RDF Dataset Canonicalization (RDFC-1.0) comes from `rdf-canon`; JSON-LD
//! expansion, compaction and document loading stay behind the
//! [`JsonLdProcessor`] collaborator trait. This module owns what sits in
//! between: blank-node label replacement, JSON-Pointer driven statement
//! selection and the partitioning of canonical N-Quads into named groups.

/// Canonicalize-and-group over named JSON-Pointer selections
pub mod group;
/// Blank-node label maps: HMAC shuffling and integer compression
pub mod label_map;
/// RFC 6901 JSON Pointers and JSON-LD selective projection
pub mod pointer;
/// Skolemization helpers over RDF datasets
pub mod skolem;

use crate::errors::{Error, ErrorKind};
use oxrdf::Dataset;
use serde_json::Value;
use std::collections::BTreeMap;

/// IRI prefix substituted for blank-node labels while a document round-trips
/// through JSON selection.
pub const SKOLEM_URN_PREFIX: &str = "urn:bnid:";

/// JSON-LD collaborator required by the suite.
///
/// Implementations wrap a JSON-LD engine and a document loader; the suite
/// never interprets `@context` itself.
pub trait JsonLdProcessor {
    /// Deserializes the JSON-LD `document` to an RDF dataset (the JSON-LD
    /// `toRdf` API). Blank-node labels may be arbitrary but must be
    /// consistent within the returned dataset.
    fn to_rdf(&self, document: &Value) -> Result<Dataset, Error>;

    /// Returns a compact form of `document` in which every node lacking an
    /// `@id` has been assigned one under `urn_prefix`, so that JSON-level
    /// selections keep stable node identity.
    fn skolemize_compact(&self, document: &Value, urn_prefix: &str) -> Result<Value, Error>;

    /// Resolves `url` to a JSON document (verification methods, contexts).
    fn load_document(&self, url: &str) -> Result<Value, Error>;
}

/// Label-map factory contract: from the canonical issuance map (input
/// blank-node label to `c14n`-prefixed label) produce the replacement map
/// (input label to replacement label) applied before serialization.
pub trait LabelMapFactory {
    /// Produces the replacement map for one canonicalization run.
    fn create(
        &self,
        canonical_id_map: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, Error>;
}

/// RDFC-1.0 issuance map of `dataset`: input blank-node label to canonical
/// `c14nN` label.
pub fn canonical_id_map(dataset: &Dataset) -> Result<BTreeMap<String, String>, Error> {
    let issued = rdf_canon::issue(dataset).map_err(|e| {
        Error::new(
            ErrorKind::ProofGenerationError,
            "canonical_id_map",
            format!("canonicalization failed: {e}"),
        )
    })?;
    Ok(issued.into_iter().collect())
}

/// # Description
/// Canonicalizes `dataset` under RDFC-1.0 with replaced blank-node labels:
/// the standard `c14nN` assignment is computed first, then substituted with
/// the labels produced by `factory`, and the relabeled statements are
/// serialized and sorted.
///
/// # Output:
/// * the ordered canonical N-Quad lines (each terminated by `'\n'`) and the
///   applied label map (input label to replacement label).
pub fn canonicalize_with_factory(
    dataset: &Dataset,
    factory: &dyn LabelMapFactory,
) -> Result<(Vec<String>, BTreeMap<String, String>), Error> {
    let issued = canonical_id_map(dataset)?;
    let label_map = factory.create(&issued)?;
    let relabeled = skolem::relabel_dataset(dataset, &label_map)?;
    Ok((sorted_nquad_lines(&relabeled), label_map))
}

/// Serializes `dataset` to N-Quad lines in code point order, each line
/// keeping its terminating `'\n'`.
pub fn sorted_nquad_lines(dataset: &Dataset) -> Vec<String> {
    let serialized = rdf_canon::serialize(dataset);
    let mut lines: Vec<String> = serialized
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| format!("{line}\n"))
        .collect();
    lines.sort();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, NamedNode, Quad};

    struct IdentityFactory;

    impl LabelMapFactory for IdentityFactory {
        fn create(
            &self,
            canonical_id_map: &BTreeMap<String, String>,
        ) -> Result<BTreeMap<String, String>, Error> {
            Ok(canonical_id_map.clone())
        }
    }

    fn sample_dataset() -> Dataset {
        let alice = BlankNode::new("e0").unwrap();
        let knows = NamedNode::new("http://example.org/knows").unwrap();
        let bob = BlankNode::new("e1").unwrap();
        [
            Quad::new(alice.clone(), knows.clone(), bob.clone(), oxrdf::GraphName::DefaultGraph),
            Quad::new(bob, knows, alice, oxrdf::GraphName::DefaultGraph),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn identity_factory_keeps_c14n_labels() {
        let dataset = sample_dataset();
        let (lines, label_map) = canonicalize_with_factory(&dataset, &IdentityFactory).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.contains("_:c14n") && l.ends_with(".\n")));
        assert!(label_map.values().all(|v| v.starts_with("c14n")));
    }

    #[test]
    fn lines_are_sorted() {
        let dataset = sample_dataset();
        let (lines, _) = canonicalize_with_factory(&dataset, &IdentityFactory).unwrap();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }
}
