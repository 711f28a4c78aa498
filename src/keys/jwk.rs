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
use crate::keys::material::{KeyFlag, KeyMaterial};
use crate::utils::util::sha256;
use multibase::Base;
use serde::{Deserialize, Serialize};

/// Fixed `kty` member.
pub const JWK_KTY: &str = "EC";
/// Fixed `use` member.
pub const JWK_USE: &str = "sig";
/// Fixed `alg` member.
pub const JWK_ALG: &str = "BLS12_381G2";
/// Fixed `crv` member.
pub const JWK_CRV: &str = "BLS12_381G2";

/// JSON Web Key with the fixed field set of the suite.
///
/// `x` carries base64url-no-pad public key material, `d` secret key material;
/// exactly one of the two is populated and `y` is always the empty string.
/// Field order is the template order, which keeps [`JsonWebKey::thumbprint`]
/// stable across serializations.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct JsonWebKey {
    pub kty: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub key_ops: Vec<String>,
    pub alg: String,
    pub ext: bool,
    pub crv: String,
    pub x: String,
    pub y: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl JsonWebKey {
    /// # Description
    /// Populates the fixed JWK template from tagged key material. Public
    /// material lands base64url-no-pad encoded in `x` with
    /// `key_ops = ["verify"]`; secret material lands in `d` with
    /// `key_ops = ["sign"]`.
    pub fn from_material(material: &KeyMaterial) -> Self {
        let encoded = Base::Base64Url.encode(material.as_bytes());
        let (key_ops, x, d) = match material.flag() {
            KeyFlag::Public => (vec!["verify".to_owned()], encoded, None),
            KeyFlag::Secret => (vec!["sign".to_owned()], String::new(), Some(encoded)),
        };
        Self {
            kty: JWK_KTY.to_owned(),
            use_: JWK_USE.to_owned(),
            key_ops,
            alg: JWK_ALG.to_owned(),
            ext: true,
            crv: JWK_CRV.to_owned(),
            x,
            y: String::new(),
            d,
        }
    }

    /// # Description
    /// Extracts tagged key material, asserting every fixed field against the
    /// suite constants, that `key_ops` is exactly the single operation the
    /// flag implies, and that the decoded octets have the flagged length.
    pub fn to_material(&self, flag: KeyFlag) -> Result<KeyMaterial, Error> {
        const OP: &str = "jwkToMaterial";
        if self.kty != JWK_KTY
            || self.use_ != JWK_USE
            || self.alg != JWK_ALG
            || self.crv != JWK_CRV
        {
            return Err(Error::new(
                ErrorKind::InvalidKeypairContent,
                OP,
                "kty/use/alg/crv do not match the BLS12_381G2 template",
            ));
        }
        let required_op = match flag {
            KeyFlag::Public => "verify",
            KeyFlag::Secret => "sign",
        };
        if self.key_ops.len() != 1 || self.key_ops[0] != required_op {
            return Err(Error::new(
                ErrorKind::InvalidKeypairContent,
                OP,
                format!("key_ops must be exactly [{required_op:?}]"),
            ));
        }
        let field = match flag {
            KeyFlag::Public => Some(&self.x).filter(|x| !x.is_empty()),
            KeyFlag::Secret => self.d.as_ref().filter(|d| !d.is_empty()),
        };
        let field = field.ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidKeypairContent,
                OP,
                match flag {
                    KeyFlag::Public => "missing required field `x`",
                    KeyFlag::Secret => "missing required field `d`",
                },
            )
        })?;
        let bytes = Base::Base64Url
            .decode(field)
            .map_err(|e| Error::new(ErrorKind::DecodingError, OP, format!("{e}")))?;
        if bytes.len() != flag.expected_length() {
            return Err(Error::new(
                ErrorKind::InvalidKeypairLength,
                OP,
                format!(
                    "expected {} key octets, got {}",
                    flag.expected_length(),
                    bytes.len()
                ),
            ));
        }
        KeyMaterial::from_slice(flag, &bytes)
    }

    /// SHA-256 over the serialized JWK, base64url-no-pad encoded. Stable
    /// because the template fixes both the member set and their order; the
    /// canonical-member form of RFC 7638 is the caller's concern.
    pub fn thumbprint(&self) -> Result<String, Error> {
        let serialized = serde_json::to_vec(self).map_err(|e| {
            Error::new(ErrorKind::DecodingError, "jwkThumbprint", format!("{e}"))
        })?;
        Ok(Base::Base64Url.encode(sha256(&serialized)))
    }
}
