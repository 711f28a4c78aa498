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

/// CBOR self-describing tag prefix shared by every proof-value header.
const TAG_PREFIX: [u8; 2] = [0xd9, 0x5d];

/// Optional feature a proof was created under.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FeatureOption {
    /// No optional feature.
    #[default]
    Baseline,
    /// Holder binding through a blind-signed holder secret.
    AnonymousHolderBinding,
    /// Per-verifier linkable pseudonyms from signer-provided entropy.
    Pseudonym,
    /// Both: pseudonyms bound to a hidden holder secret.
    HolderBindingPseudonym,
}

impl FeatureOption {
    /// The 3-byte header opening a base proof value.
    pub fn base_header(&self) -> [u8; 3] {
        let feature = match self {
            Self::Baseline => 0x02,
            Self::AnonymousHolderBinding => 0x04,
            Self::Pseudonym => 0x06,
            Self::HolderBindingPseudonym => 0x08,
        };
        [TAG_PREFIX[0], TAG_PREFIX[1], feature]
    }

    /// The 3-byte header opening a derived proof value.
    pub fn derived_header(&self) -> [u8; 3] {
        let [a, b, feature] = self.base_header();
        [a, b, feature + 1]
    }

    /// The feature identified by a base proof header.
    pub fn from_base_header(header: &[u8]) -> Result<Self, Error> {
        Self::from_header(header, false, "parseBaseProofValue")
    }

    /// The feature identified by a derived proof header.
    pub fn from_derived_header(header: &[u8]) -> Result<Self, Error> {
        Self::from_header(header, true, "parseDerivedProofValue")
    }

    fn from_header(
        header: &[u8],
        derived: bool,
        operation: &'static str,
    ) -> Result<Self, Error> {
        if header.len() < 3 || header[..2] != TAG_PREFIX {
            return Err(Error::new(
                ErrorKind::ProofVerificationError,
                operation,
                "proof value does not carry the bbs-2023 CBOR tag",
            ));
        }
        let feature = if derived {
            // Derived headers are base headers shifted by one.
            header[2].wrapping_sub(1)
        } else {
            header[2]
        };
        match feature {
            0x02 => Ok(Self::Baseline),
            0x04 => Ok(Self::AnonymousHolderBinding),
            0x06 => Ok(Self::Pseudonym),
            0x08 => Ok(Self::HolderBindingPseudonym),
            _ => Err(Error::new(
                ErrorKind::ProofVerificationError,
                operation,
                format!("unknown feature byte 0x{:02x}", header[2]),
            )),
        }
    }

    /// True for the two pseudonym-carrying features.
    pub fn uses_pseudonym(&self) -> bool {
        matches!(self, Self::Pseudonym | Self::HolderBindingPseudonym)
    }

    /// True when the holder contributes a hidden secret.
    pub fn binds_holder(&self) -> bool {
        matches!(
            self,
            Self::AnonymousHolderBinding | Self::HolderBindingPseudonym
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_table() {
        let cases = [
            (FeatureOption::Baseline, 0x02u8, 0x03u8),
            (FeatureOption::AnonymousHolderBinding, 0x04, 0x05),
            (FeatureOption::Pseudonym, 0x06, 0x07),
            (FeatureOption::HolderBindingPseudonym, 0x08, 0x09),
        ];
        for (feature, base, derived) in cases {
            assert_eq!(feature.base_header(), [0xd9, 0x5d, base]);
            assert_eq!(feature.derived_header(), [0xd9, 0x5d, derived]);
            assert_eq!(
                FeatureOption::from_base_header(&feature.base_header()).unwrap(),
                feature
            );
            assert_eq!(
                FeatureOption::from_derived_header(&feature.derived_header()).unwrap(),
                feature
            );
        }
    }

    #[test]
    fn unknown_feature_byte_rejected() {
        let err = FeatureOption::from_base_header(&[0xd9, 0x5d, 0x0a]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProofVerificationError);
        // A derived header is not a valid base header and vice versa.
        assert!(FeatureOption::from_base_header(&[0xd9, 0x5d, 0x03]).is_err());
        assert!(FeatureOption::from_derived_header(&[0xd9, 0x5d, 0x02]).is_err());
    }

    #[test]
    fn wrong_tag_prefix_rejected() {
        let err = FeatureOption::from_base_header(&[0xd8, 0x5d, 0x02]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProofVerificationError);
    }
}
