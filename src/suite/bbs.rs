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

//! Bindings to the BBS primitive collaborator (zkryptium), one entry point
//! per suite feature. Everything crosses this boundary as octets; curve
//! types never leak into the pipelines.

use crate::errors::{Error, ErrorKind};
use crate::suite::feature::FeatureOption;
use zkryptium::bbsplus::ciphersuites::Bls12381Sha256;
use zkryptium::bbsplus::keys::{BBSplusPublicKey, BBSplusSecretKey};
use zkryptium::bbsplus::pseudonym::PseudonymSecret;
use zkryptium::bbsplus::commitment::BlindFactor;
use zkryptium::bbsplus::signature::BBSplusSignature;
use zkryptium::schemes::algorithms::BBSplus;
use zkryptium::schemes::generics::{BlindSignature, PoKSignature, Signature};

type Suite = BBSplus<Bls12381Sha256>;

/// Length in octets of a BBS signature.
pub const SIGNATURE_LENGTH: usize = BBSplusSignature::BYTES;

/// Holder-side secrets consumed by the featured derivation paths.
#[derive(Clone, Default)]
pub struct HolderSecrets {
    /// The blind-signed holder secret (`committed_messages` entry).
    pub holder_secret: Option<Vec<u8>>,
    /// The `secret_prover_blind` returned at commitment time.
    pub prover_blind: Option<[u8; 32]>,
    /// The combined pseudonym secret established at issuance.
    pub nym_secret: Option<[u8; 32]>,
    /// The verifier-scoped pseudonym domain.
    pub nym_domain: Option<Vec<u8>>,
}

impl HolderSecrets {
    fn require<'a, T>(
        value: &'a Option<T>,
        name: &str,
        operation: &'static str,
    ) -> Result<&'a T, Error> {
        value.as_ref().ok_or_else(|| {
            Error::new(
                ErrorKind::ProofGenerationError,
                operation,
                format!("feature requires {name}"),
            )
        })
    }
}

fn public_key(bytes: &[u8], operation: &'static str) -> Result<BBSplusPublicKey, Error> {
    BBSplusPublicKey::from_bytes(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidVerificationMethod, operation, format!("{e}")))
}

fn secret_key(bytes: &[u8], operation: &'static str) -> Result<BBSplusSecretKey, Error> {
    BBSplusSecretKey::from_bytes(bytes)
        .map_err(|e| Error::new(ErrorKind::InvalidVerificationMethod, operation, format!("{e}")))
}

fn nym_scalar(bytes: &[u8; 32], operation: &'static str) -> Result<PseudonymSecret, Error> {
    PseudonymSecret::from_bytes(bytes)
        .map_err(|e| Error::new(ErrorKind::ProofGenerationError, operation, format!("{e}")))
}

/// # Description
/// Produces the feature-appropriate BBS signature over `header` and
/// `messages`: plain `Sign` for the baseline, `BlindSign` when a holder
/// commitment participates, the pseudonym variants when signer entropy
/// participates. Missing feature inputs are proof-generation failures.
pub fn sign(
    feature: FeatureOption,
    sk: &[u8],
    pk: &[u8],
    header: &[u8],
    messages: &[Vec<u8>],
    commitment_with_proof: Option<&[u8]>,
    signer_nym_entropy: Option<&[u8; 32]>,
) -> Result<Vec<u8>, Error> {
    const OP: &str = "bbs::sign";
    let sk = secret_key(sk, OP)?;
    let pk = public_key(pk, OP)?;
    match feature {
        FeatureOption::Baseline => {
            let signature =
                Signature::<Suite>::sign(Some(messages), &sk, &pk, Some(header))
                    .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(signature.bbsPlusSignature().to_bytes().to_vec())
        }
        FeatureOption::AnonymousHolderBinding => {
            let commitment = commitment_with_proof.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofGenerationError,
                    OP,
                    "anonymous holder binding requires commitmentWithProof",
                )
            })?;
            let signature = BlindSignature::<Suite>::blind_sign(
                &sk,
                &pk,
                Some(commitment),
                Some(header),
                Some(messages),
            )
            .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(signature.to_bytes().to_vec())
        }
        FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => {
            let commitment = commitment_with_proof.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofGenerationError,
                    OP,
                    "pseudonym features require commitmentWithProof",
                )
            })?;
            let entropy = signer_nym_entropy.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofGenerationError,
                    OP,
                    "pseudonym features require signerNymEntropy",
                )
            })?;
            let signature = BlindSignature::<Suite>::blind_sign_with_nym(
                &sk,
                &pk,
                Some(commitment),
                Some(header),
                &nym_scalar(entropy, OP)?,
                Some(messages),
            )
            .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(signature.to_bytes().to_vec())
        }
    }
}

/// Output of [`proof_gen`]: the disclosure proof and, for pseudonym
/// features, the pseudonym presented alongside it.
#[derive(Debug)]
pub struct ProofGenOutput {
    /// The BBS disclosure proof octets.
    pub proof: Vec<u8>,
    /// The pseudonym, for the pseudonym features.
    pub pseudonym: Option<Vec<u8>>,
}

/// # Description
/// Produces the feature-appropriate BBS disclosure proof over `messages`,
/// revealing `disclosed_indexes`. The committed-message array is empty for
/// `Pseudonym` and `[holderSecret]` for the holder-binding features.
pub fn proof_gen(
    feature: FeatureOption,
    pk: &[u8],
    signature: &[u8],
    header: &[u8],
    presentation_header: &[u8],
    messages: &[Vec<u8>],
    disclosed_indexes: &[usize],
    secrets: &HolderSecrets,
) -> Result<ProofGenOutput, Error> {
    const OP: &str = "bbs::proof_gen";
    let pk = public_key(pk, OP)?;
    match feature {
        FeatureOption::Baseline => {
            let signature_bytes: &[u8; SIGNATURE_LENGTH] =
                signature.try_into().map_err(|_| {
                    Error::new(
                        ErrorKind::ProofGenerationError,
                        OP,
                        format!("bbsSignature must be {SIGNATURE_LENGTH} bytes"),
                    )
                })?;
            let proof = PoKSignature::<Suite>::proof_gen(
                &pk,
                signature_bytes,
                Some(header),
                Some(presentation_header),
                Some(messages),
                Some(disclosed_indexes),
            )
            .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(ProofGenOutput {
                proof: proof.to_bytes(),
                pseudonym: None,
            })
        }
        FeatureOption::AnonymousHolderBinding => {
            let holder_secret =
                HolderSecrets::require(&secrets.holder_secret, "holderSecret", OP)?;
            let prover_blind =
                HolderSecrets::require(&secrets.prover_blind, "proverBlind", OP)?;
            let committed_messages = vec![holder_secret.clone()];
            let blind = BlindFactor::from_bytes(prover_blind)
                .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            let proof = PoKSignature::<Suite>::blind_proof_gen(
                &pk,
                signature,
                Some(header),
                Some(presentation_header),
                Some(messages),
                Some(&committed_messages),
                Some(disclosed_indexes),
                Some(&[]),
                Some(&blind),
            )
            .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(ProofGenOutput {
                proof: proof.to_bytes(),
                pseudonym: None,
            })
        }
        FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => {
            let nym_secret = HolderSecrets::require(&secrets.nym_secret, "nymSecret", OP)?;
            let nym_domain = HolderSecrets::require(&secrets.nym_domain, "nymDomain", OP)?;
            let prover_blind =
                HolderSecrets::require(&secrets.prover_blind, "proverBlind", OP)?;
            let committed_messages = match feature {
                FeatureOption::HolderBindingPseudonym => {
                    let holder_secret =
                        HolderSecrets::require(&secrets.holder_secret, "holderSecret", OP)?;
                    vec![holder_secret.clone()]
                }
                _ => Vec::new(),
            };
            let blind = BlindFactor::from_bytes(prover_blind)
                .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            let (proof, pseudonym) = PoKSignature::<Suite>::proof_gen_with_nym(
                &pk,
                signature,
                Some(header),
                Some(presentation_header),
                &nym_scalar(nym_secret, OP)?,
                nym_domain,
                Some(messages),
                Some(&committed_messages),
                Some(disclosed_indexes),
                Some(&[]),
                Some(&blind),
            )
            .map_err(|e| Error::new(ErrorKind::ProofGenerationError, OP, format!("{e}")))?;
            Ok(ProofGenOutput {
                proof: proof.to_bytes(),
                pseudonym: Some(pseudonym.to_bytes().to_vec()),
            })
        }
    }
}

/// # Description
/// Verifies a feature-appropriate BBS disclosure proof against the revealed
/// messages. A cryptographic mismatch yields `Ok(false)`; only malformed
/// inputs error.
#[allow(clippy::too_many_arguments)]
pub fn proof_verify(
    feature: FeatureOption,
    pk: &[u8],
    proof: &[u8],
    header: &[u8],
    presentation_header: &[u8],
    disclosed_messages: &[Vec<u8>],
    disclosed_indexes: &[usize],
    length_bbs_messages: Option<usize>,
    pseudonym: Option<&[u8]>,
    nym_domain: Option<&[u8]>,
) -> Result<bool, Error> {
    const OP: &str = "bbs::proof_verify";
    let pk = public_key(pk, OP)?;
    let pok = PoKSignature::<Suite>::from_bytes(proof)
        .map_err(|e| Error::new(ErrorKind::ProofVerificationError, OP, format!("{e}")))?;
    match feature {
        FeatureOption::Baseline => Ok(pok
            .proof_verify(
                &pk,
                Some(disclosed_messages),
                Some(disclosed_indexes),
                Some(header),
                Some(presentation_header),
            )
            .is_ok()),
        FeatureOption::AnonymousHolderBinding => {
            let length = length_bbs_messages.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofVerificationError,
                    OP,
                    "anonymous holder binding requires lengthBBSMessages",
                )
            })?;
            Ok(pok
                .blind_proof_verify(
                    &pk,
                    Some(header),
                    Some(presentation_header),
                    Some(length),
                    Some(disclosed_messages),
                    Some(&[]),
                    Some(disclosed_indexes),
                    Some(&[]),
                )
                .is_ok())
        }
        FeatureOption::Pseudonym | FeatureOption::HolderBindingPseudonym => {
            let length = length_bbs_messages.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofVerificationError,
                    OP,
                    "pseudonym features require lengthBBSMessages",
                )
            })?;
            let pseudonym_bytes = pseudonym.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofVerificationError,
                    OP,
                    "pseudonym features require a pseudonym",
                )
            })?;
            let nym_domain = nym_domain.ok_or_else(|| {
                Error::new(
                    ErrorKind::ProofVerificationError,
                    OP,
                    "pseudonym features require nymDomain",
                )
            })?;
            let pseudonym = zkryptium::bbsplus::pseudonym::BBSplusPseudonym::from_bytes(pseudonym_bytes)
                .map_err(|e| {
                    Error::new(ErrorKind::ProofVerificationError, OP, format!("{e}"))
                })?;
            Ok(pok
                .proof_verify_with_nym(
                    &pk,
                    Some(header),
                    Some(presentation_header),
                    &pseudonym,
                    nym_domain,
                    Some(length),
                    Some(disclosed_messages),
                    Some(&[]),
                    Some(disclosed_indexes),
                    Some(&[]),
                )
                .is_ok())
        }
    }
}
