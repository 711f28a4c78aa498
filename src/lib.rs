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

//! # bbs2023
//!
//! Implementation of the **BBS-2023 Data Integrity cryptosuite** for
//! Verifiable Credentials: selectively-disclosable proofs over JSON-LD
//! credentials using BBS signatures on the BLS12-381 pairing-friendly curve
//! (G2 public keys, 96-byte compressed).
//!
//! The suite covers:
//! * canonicalization of a credential to N-Quads with HMAC-shuffled
//!   blank-node labels and partitioning of statements into mandatory and
//!   non-mandatory groups under JSON-Pointer selection;
//! * creation of a BBS *base proof* binding the canonical statements
//!   (issuer side);
//! * derivation of a *disclosure proof* revealing only selected statements
//!   while remaining verifiable (holder side), and its verification;
//! * CBOR serialization of the proof envelope under four feature tags,
//!   and key material encoding in Multikey and JWK formats.
//!
//! BBS primitives come from [zkryptium](https://crates.io/crates/zkryptium);
//! RDF canonicalization (RDFC-1.0) from
//! [rdf-canon](https://crates.io/crates/rdf-canon). JSON-LD processing and
//! document loading are injected through the
//! [`JsonLdProcessor`](canonicalize::JsonLdProcessor) trait.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! bbs2023 = "0.1"
//! ```
//!
//! Issue, derive and verify:
//!
//! ```ignore
//! let proof = base::create_base_proof(&processor, &credential, &options, &mandatory, &params)?;
//! let disclosure = derive::derive_proof(&processor, &credential, &proof, &derive_options)?;
//! let valid = verify::verify_proof(&processor, &disclosure.reveal_document, &disclosure.proof)?;
//! ```

#![warn(missing_docs)]

/// Canonical grouping, label maps, JSON-Pointer selection
pub mod canonicalize;
/// Errors module
pub mod errors;
/// Key material, codecs and keypair lifecycle
pub mod keys;
/// The bbs-2023 pipelines and proof envelope
pub mod suite;
/// Utils module
pub mod utils;

pub use errors::{Error, ErrorKind};
pub use keys::material::{KeyFlag, KeyMaterial};
pub use keys::pair::Bls12381G2KeyPair;
pub use suite::base::create_base_proof;
pub use suite::derive::derive_proof;
pub use suite::feature::FeatureOption;
pub use suite::verify::verify_proof;
pub use suite::{DataIntegrityProof, ProofOptions, CRYPTOSUITE, PROOF_TYPE};
