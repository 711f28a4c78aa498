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

use std::fmt;

/// Stable error codes surfaced by the suite.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// Key material whose length does not match its tag.
    InvalidKeypairLength,
    /// Missing or inconsistent Multikey/JWK fields.
    InvalidKeypairContent,
    /// Malformed multibase, base64url, base58btc or CBOR input.
    DecodingError,
    /// Expiration or revocation timestamp in the past.
    KeypairExpired,
    /// Export requested for a keypair missing keys, id or controller.
    KeypairExportError,
    /// Unknown verification-method type or unusable document.
    KeypairImportError,
    /// Wrong `type`/`cryptosuite` during transformation.
    ProofTransformationError,
    /// Missing feature input, invalid `created` or label-map shape violation.
    ProofGenerationError,
    /// Malformed proof value or failed BBS verification.
    ProofVerificationError,
    /// Referenced verification method cannot be loaded or lacks keys.
    InvalidVerificationMethod,
}

impl ErrorKind {
    /// The wire-stable code string for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidKeypairLength => "INVALID_KEYPAIR_LENGTH",
            Self::InvalidKeypairContent => "INVALID_KEYPAIR_CONTENT",
            Self::DecodingError => "DECODING_ERROR",
            Self::KeypairExpired => "KEYPAIR_EXPIRED_ERROR",
            Self::KeypairExportError => "KEYPAIR_EXPORT_ERROR",
            Self::KeypairImportError => "KEYPAIR_IMPORT_ERROR",
            Self::ProofTransformationError => "PROOF_TRANSFORMATION_ERROR",
            Self::ProofGenerationError => "PROOF_GENERATION_ERROR",
            Self::ProofVerificationError => "PROOF_VERIFICATION_ERROR",
            Self::InvalidVerificationMethod => "INVALID_VERIFICATION_METHOD",
        }
    }
}

/// Error returned by every fallible operation of the suite.
///
/// Carries a fixed code ([`ErrorKind`]), the operation that raised it and a
/// human-readable message. No error is swallowed: collaborator failures are
/// wrapped with the code of the pipeline step they occurred in.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Error {
    kind: ErrorKind,
    operation: &'static str,
    message: String,
}

impl Error {
    /// A new error raised by `operation`.
    pub fn new(kind: ErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
        }
    }

    /// The error's fixed code.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The operation that raised the error.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} in {}: {}",
            self.kind.code(),
            self.operation,
            self.message
        )
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code_and_operation() {
        let e = Error::new(
            ErrorKind::DecodingError,
            "multibaseToMaterial",
            "multicodec prefix mismatch",
        );
        assert_eq!(e.kind(), ErrorKind::DecodingError);
        assert_eq!(
            e.to_string(),
            "DECODING_ERROR in multibaseToMaterial: multicodec prefix mismatch"
        );
    }
}
