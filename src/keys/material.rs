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
use multibase::Base;

/// Length of a BLS12-381 secret scalar in big-endian octets.
pub const SECRET_KEY_LENGTH: usize = 32;
/// Length of a compressed BLS12-381 G2 public key.
pub const PUBLIC_KEY_LENGTH: usize = 96;

/// Multicodec varint prefix for a BLS12-381 G2 public key.
pub const MULTICODEC_G2_PUB_PREFIX: [u8; 2] = [0xeb, 0x01];
/// Multicodec varint prefix for a BLS12-381 secret key.
pub const MULTICODEC_G2_SECRET_PREFIX: [u8; 2] = [0x80, 0x30];

/// Which half of a keypair a codec operation refers to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum KeyFlag {
    /// The 32-octet secret scalar.
    Secret,
    /// The 96-octet compressed G2 point.
    #[default]
    Public,
}

impl KeyFlag {
    pub(crate) fn expected_length(&self) -> usize {
        match self {
            Self::Secret => SECRET_KEY_LENGTH,
            Self::Public => PUBLIC_KEY_LENGTH,
        }
    }

    pub(crate) fn multicodec_prefix(&self) -> [u8; 2] {
        match self {
            Self::Secret => MULTICODEC_G2_SECRET_PREFIX,
            Self::Public => MULTICODEC_G2_PUB_PREFIX,
        }
    }
}

/// A tagged key byte sequence: a 32-octet secret scalar or a 96-octet
/// compressed G2 point. The tag carries the flag, so material can never be
/// paired with the wrong multicodec prefix.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum KeyMaterial {
    /// Secret key octets.
    Secret([u8; SECRET_KEY_LENGTH]),
    /// Public key octets, G2 compressed.
    Public([u8; PUBLIC_KEY_LENGTH]),
}

impl KeyMaterial {
    /// Tags `bytes` as secret key material, checking the length.
    pub fn secret_from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let arr: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::new(
                ErrorKind::InvalidKeypairLength,
                "KeyMaterial::secret_from_slice",
                format!(
                    "secret key must be {SECRET_KEY_LENGTH} bytes, got {}",
                    bytes.len()
                ),
            )
        })?;
        Ok(Self::Secret(arr))
    }

    /// Tags `bytes` as public key material, checking the length.
    pub fn public_from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let arr: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::new(
                ErrorKind::InvalidKeypairLength,
                "KeyMaterial::public_from_slice",
                format!(
                    "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
                    bytes.len()
                ),
            )
        })?;
        Ok(Self::Public(arr))
    }

    /// Tags `bytes` under `flag`.
    pub fn from_slice(flag: KeyFlag, bytes: &[u8]) -> Result<Self, Error> {
        match flag {
            KeyFlag::Secret => Self::secret_from_slice(bytes),
            KeyFlag::Public => Self::public_from_slice(bytes),
        }
    }

    /// The flag carried by the tag.
    pub fn flag(&self) -> KeyFlag {
        match self {
            Self::Secret(_) => KeyFlag::Secret,
            Self::Public(_) => KeyFlag::Public,
        }
    }

    /// The raw key octets.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Secret(b) => b,
            Self::Public(b) => b,
        }
    }

    /// # Description
    /// Encodes the material as a Multikey string: the flag-specific 2-byte
    /// multicodec varint prefix followed by the key octets, base58btc-encoded
    /// with the leading `z` multibase sigil.
    ///
    /// # Output:
    /// * a multibase string, e.g. `zUC7...`
    pub fn to_multibase(&self) -> String {
        let prefix = self.flag().multicodec_prefix();
        let mut prefixed = Vec::with_capacity(2 + self.as_bytes().len());
        prefixed.extend_from_slice(&prefix);
        prefixed.extend_from_slice(self.as_bytes());
        multibase::encode(Base::Base58Btc, prefixed)
    }

    /// # Description
    /// Decodes a Multikey string produced by [`Self::to_multibase`]: base58btc
    /// decode, byte-for-byte multicodec prefix check, then a length check on
    /// the remainder.
    ///
    /// # Inputs:
    /// * `value` (REQUIRED), the multibase string.
    /// * `flag` (REQUIRED), which prefix and length to expect.
    pub fn from_multibase(value: &str, flag: KeyFlag) -> Result<Self, Error> {
        const OP: &str = "multibaseToMaterial";
        let (base, decoded) = multibase::decode(value)
            .map_err(|e| Error::new(ErrorKind::DecodingError, OP, format!("{e}")))?;
        if base != Base::Base58Btc {
            return Err(Error::new(
                ErrorKind::DecodingError,
                OP,
                "expected base58btc multibase (leading 'z')",
            ));
        }
        let prefix = flag.multicodec_prefix();
        if decoded.len() < 2 || decoded[..2] != prefix {
            return Err(Error::new(
                ErrorKind::DecodingError,
                OP,
                format!(
                    "multicodec prefix mismatch: expected {}",
                    hex::encode(prefix)
                ),
            ));
        }
        let material = &decoded[2..];
        if material.len() != flag.expected_length() {
            return Err(Error::new(
                ErrorKind::InvalidKeypairLength,
                OP,
                format!(
                    "expected {} key octets, got {}",
                    flag.expected_length(),
                    material.len()
                ),
            ));
        }
        Self::from_slice(flag, material)
    }
}
