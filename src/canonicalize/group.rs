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

use crate::canonicalize::pointer::select_json_ld;
use crate::canonicalize::skolem::{deskolemize_dataset, relabel_dataset};
use crate::canonicalize::{
    canonicalize_with_factory, sorted_nquad_lines, JsonLdProcessor, LabelMapFactory,
    SKOLEM_URN_PREFIX,
};
use crate::errors::Error;
use oxrdf::Quad;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// One named partition of the canonical statement list.
///
/// Keys of `matching` and `non_matching` are indices into the full canonical
/// N-Quad list, so partitions from different groups over the same document
/// compose by index.
#[derive(Clone, Debug)]
pub struct GroupResult {
    /// Statements reachable from any of the group's pointers.
    pub matching: BTreeMap<usize, String>,
    /// The remaining statements.
    pub non_matching: BTreeMap<usize, String>,
    /// The group's selection quads with their pre-canonicalization labels.
    pub deskolemized_quads: Vec<Quad>,
}

/// Output of [`canonicalize_and_group`].
#[derive(Clone, Debug)]
pub struct CanonicalizedGroups {
    /// One partition per named group definition.
    pub groups: BTreeMap<String, GroupResult>,
    /// Input blank-node label to replacement label, as applied.
    pub label_map: BTreeMap<String, String>,
    /// The full canonical statement list.
    pub nquads: Vec<String>,
}

/// # Description
/// Canonicalizes `document` with replaced blank-node labels and partitions
/// the resulting statement list once per named group of JSON Pointers.
/// Group membership is purely a filter over one shared canonical list: the
/// statement indices are identical across groups.
///
/// # Inputs:
/// * `processor` (REQUIRED), the JSON-LD collaborator.
/// * `document` (REQUIRED), a compact JSON-LD document.
/// * `factory` (REQUIRED), the blank-node label-map factory.
/// * `group_definitions` (REQUIRED), named JSON-Pointer selections.
pub fn canonicalize_and_group(
    processor: &dyn JsonLdProcessor,
    document: &Value,
    factory: &dyn LabelMapFactory,
    group_definitions: &BTreeMap<String, Vec<String>>,
) -> Result<CanonicalizedGroups, Error> {
    let skolemized = processor.skolemize_compact(document, SKOLEM_URN_PREFIX)?;
    let skolemized_dataset = processor.to_rdf(&skolemized)?;
    let deskolemized = deskolemize_dataset(&skolemized_dataset, SKOLEM_URN_PREFIX)?;

    let (nquads, label_map) = canonicalize_with_factory(&deskolemized, factory)?;
    log::debug!(
        "canonicalized {} statements across {} groups",
        nquads.len(),
        group_definitions.len()
    );

    let mut groups = BTreeMap::new();
    for (name, pointers) in group_definitions {
        let selection_lines: HashSet<String>;
        let deskolemized_quads: Vec<Quad>;
        match select_json_ld(pointers, &skolemized)? {
            Some(selection) => {
                let selection_dataset = processor.to_rdf(&selection)?;
                let selection_deskolemized =
                    deskolemize_dataset(&selection_dataset, SKOLEM_URN_PREFIX)?;
                let relabeled = relabel_dataset(&selection_deskolemized, &label_map)?;
                selection_lines = sorted_nquad_lines(&relabeled).into_iter().collect();
                deskolemized_quads = selection_deskolemized
                    .iter()
                    .map(|q| q.into_owned())
                    .collect();
            }
            None => {
                selection_lines = HashSet::new();
                deskolemized_quads = Vec::new();
            }
        }

        let mut matching = BTreeMap::new();
        let mut non_matching = BTreeMap::new();
        for (index, nquad) in nquads.iter().enumerate() {
            if selection_lines.contains(nquad) {
                matching.insert(index, nquad.clone());
            } else {
                non_matching.insert(index, nquad.clone());
            }
        }
        groups.insert(
            name.clone(),
            GroupResult {
                matching,
                non_matching,
                deskolemized_quads,
            },
        );
    }

    Ok(CanonicalizedGroups {
        groups,
        label_map,
        nquads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use oxrdf::{Dataset, GraphName, Literal, NamedNode};

    /// Maps flat `{"id": iri, "<key>": "<string>"}` objects to one quad per
    /// non-keyword member. Enough structure to exercise the partitioning.
    struct FlatProcessor;

    impl JsonLdProcessor for FlatProcessor {
        fn to_rdf(&self, document: &Value) -> Result<Dataset, Error> {
            let object = document.as_object().expect("flat test document");
            let id = object
                .get("id")
                .and_then(Value::as_str)
                .expect("flat test document has an id");
            let subject = NamedNode::new(id).expect("valid test iri");
            Ok(object
                .iter()
                .filter(|(key, _)| !matches!(key.as_str(), "@context" | "id" | "type"))
                .filter_map(|(key, value)| {
                    value.as_str().map(|v| {
                        Quad::new(
                            subject.clone(),
                            NamedNode::new(format!("urn:ex:{key}")).expect("valid test iri"),
                            Literal::new_simple_literal(v),
                            GraphName::DefaultGraph,
                        )
                    })
                })
                .collect())
        }

        fn skolemize_compact(&self, document: &Value, _urn_prefix: &str) -> Result<Value, Error> {
            Ok(document.clone())
        }

        fn load_document(&self, url: &str) -> Result<Value, Error> {
            Err(Error::new(
                ErrorKind::InvalidVerificationMethod,
                "FlatProcessor::load_document",
                format!("unknown document {url:?}"),
            ))
        }
    }

    struct IdentityFactory;

    impl LabelMapFactory for IdentityFactory {
        fn create(
            &self,
            canonical_id_map: &BTreeMap<String, String>,
        ) -> Result<BTreeMap<String, String>, Error> {
            Ok(canonical_id_map.clone())
        }
    }

    fn document() -> Value {
        serde_json::json!({
            "id": "urn:ex:doc",
            "alpha": "a",
            "beta": "b",
            "gamma": "c"
        })
    }

    #[test]
    fn groups_partition_the_statement_list() {
        let definitions: BTreeMap<String, Vec<String>> =
            [("mandatory".to_owned(), vec!["/alpha".to_owned()])]
                .into_iter()
                .collect();
        let result =
            canonicalize_and_group(&FlatProcessor, &document(), &IdentityFactory, &definitions)
                .unwrap();
        assert_eq!(result.nquads.len(), 3);
        let group = &result.groups["mandatory"];
        assert_eq!(group.matching.len(), 1);
        assert_eq!(group.non_matching.len(), 2);
        let mut all: Vec<usize> = group
            .matching
            .keys()
            .chain(group.non_matching.keys())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, [0, 1, 2]);
    }

    #[test]
    fn indices_are_shared_across_groups() {
        let definitions: BTreeMap<String, Vec<String>> = [
            ("mandatory".to_owned(), vec!["/alpha".to_owned()]),
            (
                "combined".to_owned(),
                vec!["/alpha".to_owned(), "/beta".to_owned()],
            ),
        ]
        .into_iter()
        .collect();
        let result =
            canonicalize_and_group(&FlatProcessor, &document(), &IdentityFactory, &definitions)
                .unwrap();
        let mandatory = &result.groups["mandatory"];
        let combined = &result.groups["combined"];
        for index in mandatory.matching.keys() {
            assert!(combined.matching.contains_key(index));
        }
        assert_eq!(combined.matching.len(), 2);
    }

    #[test]
    fn empty_pointer_group_matches_nothing() {
        let definitions: BTreeMap<String, Vec<String>> =
            [("selective".to_owned(), Vec::new())].into_iter().collect();
        let result =
            canonicalize_and_group(&FlatProcessor, &document(), &IdentityFactory, &definitions)
                .unwrap();
        let group = &result.groups["selective"];
        assert!(group.matching.is_empty());
        assert_eq!(group.non_matching.len(), 3);
    }
}
