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

//! Fixture JSON-LD collaborator for the end-to-end suite tests.
//!
//! Maps a small, fixed vocabulary of compact documents to RDF: member `k`
//! becomes predicate `https://vocab.example/ns#k`, `type` becomes `rdf:type`,
//! IRI-shaped strings become named nodes and everything else a plain
//! literal. Deliberately deterministic so issuer, holder and verifier agree
//! on every statement byte.

use bbs2023::canonicalize::JsonLdProcessor;
use bbs2023::errors::{Error, ErrorKind};
use bbs2023::keys::material::KeyFlag;
use bbs2023::keys::pair::{Bls12381G2KeyPair, ExportOptions, MethodType};
use oxrdf::{BlankNode, Dataset, GraphName, Literal, NamedNode, Quad, Subject, Term};
use serde_json::{json, Map, Value};
use std::cell::Cell;
use std::collections::HashMap;

const VOCAB: &str = "https://vocab.example/ns#";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const CONTROLLER: &str = "did:example:issuer";

/// Fixture processor with a static document store for verification methods.
pub struct FixtureProcessor {
    documents: HashMap<String, Value>,
}

fn iri_like(value: &str) -> bool {
    ["did:", "urn:", "http://", "https://"]
        .iter()
        .any(|scheme| value.starts_with(scheme))
}

fn vocab_iri(term: &str) -> NamedNode {
    NamedNode::new(format!("{VOCAB}{term}")).expect("fixture vocabulary IRI")
}

impl FixtureProcessor {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
        }
    }

    pub fn register(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    fn subject_for(&self, object: &Map<String, Value>, fresh: &Cell<usize>) -> Subject {
        match object.get("id").and_then(Value::as_str) {
            Some(id) if id.starts_with("_:") => {
                Subject::BlankNode(BlankNode::new(&id[2..]).expect("fixture blank label"))
            }
            Some(id) => Subject::NamedNode(NamedNode::new(id).expect("fixture IRI")),
            None => {
                let label = format!("n{}", fresh.get());
                fresh.set(fresh.get() + 1);
                Subject::BlankNode(BlankNode::new(label).expect("fixture blank label"))
            }
        }
    }

    fn node_to_quads(
        &self,
        object: &Map<String, Value>,
        quads: &mut Vec<Quad>,
        fresh: &Cell<usize>,
    ) -> Subject {
        let subject = self.subject_for(object, fresh);
        for (key, value) in object {
            if key == "@context" || key == "id" {
                continue;
            }
            let values = match value {
                Value::Array(items) => items.clone(),
                other => vec![other.clone()],
            };
            for item in values {
                let (predicate, term) = if key == "type" {
                    let ty = item.as_str().expect("fixture types are strings");
                    (
                        NamedNode::new(RDF_TYPE).expect("rdf:type"),
                        Term::NamedNode(vocab_iri(ty)),
                    )
                } else {
                    let term = match &item {
                        Value::Object(child) => {
                            match self.node_to_quads(child, quads, fresh) {
                                Subject::NamedNode(n) => Term::NamedNode(n),
                                Subject::BlankNode(b) => Term::BlankNode(b),
                                _ => unreachable!("fixture subjects are IRIs or blanks"),
                            }
                        }
                        Value::String(s) if iri_like(s) => {
                            Term::NamedNode(NamedNode::new(s).expect("fixture IRI"))
                        }
                        Value::String(s) => Term::Literal(Literal::new_simple_literal(s)),
                        other => {
                            Term::Literal(Literal::new_simple_literal(other.to_string()))
                        }
                    };
                    (vocab_iri(key), term)
                };
                quads.push(Quad::new(
                    subject.clone(),
                    predicate,
                    term,
                    GraphName::DefaultGraph,
                ));
            }
        }
        subject
    }

    fn skolemize_value(value: &Value, urn_prefix: &str, counter: &Cell<usize>) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::new();
                let mut skolemized_id = None;
                match map.get("id").and_then(Value::as_str) {
                    Some(id) if id.starts_with("_:") => {
                        skolemized_id = Some(format!("{urn_prefix}{}", &id[2..]));
                    }
                    Some(_) => {}
                    None => {
                        skolemized_id = Some(format!("{urn_prefix}e{}", counter.get()));
                        counter.set(counter.get() + 1);
                    }
                }
                if let Some(id) = skolemized_id {
                    out.insert("id".to_owned(), Value::String(id));
                }
                for (key, item) in map {
                    if key == "@context" {
                        out.insert(key.clone(), item.clone());
                    } else if key == "id" && out.contains_key("id") {
                        // replaced above
                    } else {
                        out.insert(
                            key.clone(),
                            Self::skolemize_value(item, urn_prefix, counter),
                        );
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Self::skolemize_value(item, urn_prefix, counter))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl JsonLdProcessor for FixtureProcessor {
    fn to_rdf(&self, document: &Value) -> Result<Dataset, Error> {
        let object = document.as_object().ok_or_else(|| {
            Error::new(
                ErrorKind::ProofGenerationError,
                "FixtureProcessor::to_rdf",
                "fixture documents are JSON objects",
            )
        })?;
        let mut quads = Vec::new();
        let fresh = Cell::new(0usize);
        self.node_to_quads(object, &mut quads, &fresh);
        Ok(quads.into_iter().collect())
    }

    fn skolemize_compact(&self, document: &Value, urn_prefix: &str) -> Result<Value, Error> {
        let counter = Cell::new(0usize);
        Ok(Self::skolemize_value(document, urn_prefix, &counter))
    }

    fn load_document(&self, url: &str) -> Result<Value, Error> {
        self.documents.get(url).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidVerificationMethod,
                "FixtureProcessor::load_document",
                format!("unknown document {url:?}"),
            )
        })
    }
}

/// A test issuer: deterministic keypair plus a processor whose store
/// resolves its verification method (with both keys, as the signer sees it).
pub struct TestIssuer {
    pub keypair: Bls12381G2KeyPair,
    pub verification_method: String,
    pub processor: FixtureProcessor,
}

pub fn test_issuer() -> TestIssuer {
    let mut keypair = Bls12381G2KeyPair::new(Some(CONTROLLER.to_owned()));
    keypair.initialize(Some(&[7u8; 32])).unwrap();
    let method = keypair
        .export(ExportOptions {
            flag: KeyFlag::Secret,
            method_type: MethodType::Multikey,
        })
        .unwrap();
    let verification_method = keypair.id.clone().unwrap();
    let mut processor = FixtureProcessor::new();
    processor.register(
        verification_method.clone(),
        serde_json::to_value(&method).unwrap(),
    );
    TestIssuer {
        keypair,
        verification_method,
        processor,
    }
}

/// A citizenship-flavoured credential with a blank-node subject tree.
pub fn test_credential() -> Value {
    json!({
        "@context": ["https://w3id.org/citizenship/v4rc1"],
        "id": "urn:uuid:0e2b4cd8-5e6c-4d07-9b8a-7c0f3f1a6b42",
        "type": ["VerifiableCredential", "PermanentResidentCardCredential"],
        "issuer": "did:example:issuer",
        "validFrom": "2024-12-16T00:00:00Z",
        "credentialSubject": {
            "type": "Person",
            "givenName": "Jane",
            "familyName": "Doe",
            "birthCountry": {
                "type": "Country",
                "countryName": "Bahamas"
            },
            "permanentResidentCard": {
                "type": "PermanentResidentCard",
                "lprNumber": "999-999-999"
            }
        }
    })
}
