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
use oxrdf::{BlankNode, Dataset, GraphName, NamedNode, Quad, Subject, Term};
use std::collections::BTreeMap;

const OP_DESKOLEMIZE: &str = "deskolemize_dataset";
const OP_RELABEL: &str = "relabel_dataset";

fn blank_node(label: &str, operation: &'static str) -> Result<BlankNode, Error> {
    BlankNode::new(label).map_err(|e| {
        Error::new(
            ErrorKind::ProofGenerationError,
            operation,
            format!("invalid blank node label {label:?}: {e}"),
        )
    })
}

fn skolem_label<'a>(node: &'a NamedNode, urn_prefix: &str) -> Option<&'a str> {
    node.as_str().strip_prefix(urn_prefix)
}

/// # Description
/// Replaces every `urn_prefix`-skolemized IRI in `dataset` with the blank
/// node it stands for, restoring the labels a skolemized document carried
/// before JSON-level selection.
pub fn deskolemize_dataset(dataset: &Dataset, urn_prefix: &str) -> Result<Dataset, Error> {
    let mut quads = Vec::new();
    for quad in dataset.iter() {
        let quad = quad.into_owned();
        let subject = match quad.subject {
            Subject::NamedNode(n) => match skolem_label(&n, urn_prefix) {
                Some(label) => Subject::BlankNode(blank_node(label, OP_DESKOLEMIZE)?),
                None => Subject::NamedNode(n),
            },
            other => other,
        };
        let object = match quad.object {
            Term::NamedNode(n) => match skolem_label(&n, urn_prefix) {
                Some(label) => Term::BlankNode(blank_node(label, OP_DESKOLEMIZE)?),
                None => Term::NamedNode(n),
            },
            other => other,
        };
        let graph_name = match quad.graph_name {
            GraphName::NamedNode(n) => match skolem_label(&n, urn_prefix) {
                Some(label) => GraphName::BlankNode(blank_node(label, OP_DESKOLEMIZE)?),
                None => GraphName::NamedNode(n),
            },
            other => other,
        };
        quads.push(Quad::new(subject, quad.predicate, object, graph_name));
    }
    Ok(quads.into_iter().collect())
}

/// # Description
/// Rewrites every blank-node label in `dataset` through `map`. A label
/// missing from the map is a shape violation: the map must have been derived
/// from the very same dataset.
pub fn relabel_dataset(
    dataset: &Dataset,
    map: &BTreeMap<String, String>,
) -> Result<Dataset, Error> {
    let lookup = |label: &str| -> Result<BlankNode, Error> {
        let replacement = map.get(label).ok_or_else(|| {
            Error::new(
                ErrorKind::ProofGenerationError,
                OP_RELABEL,
                format!("no replacement for blank node label {label:?}"),
            )
        })?;
        blank_node(replacement, OP_RELABEL)
    };

    let mut quads = Vec::new();
    for quad in dataset.iter() {
        let quad = quad.into_owned();
        let subject = match quad.subject {
            Subject::BlankNode(b) => Subject::BlankNode(lookup(b.as_str())?),
            other => other,
        };
        let object = match quad.object {
            Term::BlankNode(b) => Term::BlankNode(lookup(b.as_str())?),
            other => other,
        };
        let graph_name = match quad.graph_name {
            GraphName::BlankNode(b) => GraphName::BlankNode(lookup(b.as_str())?),
            other => other,
        };
        quads.push(Quad::new(subject, quad.predicate, object, graph_name));
    }
    Ok(quads.into_iter().collect())
}
