use std::fmt;
use std::str::FromStr;

use openssl::symm::Cipher;
use serde::Deserialize;

/// Symmetric ciphers accepted for payload encryption.
///
/// Names are validated when configuration is loaded; a typo never falls
/// through to a library default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CipherSuite {
    #[serde(rename = "aes-128-cbc")]
    Aes128Cbc,
    #[serde(rename = "aes-192-cbc")]
    Aes192Cbc,
    #[serde(rename = "aes-256-cbc")]
    Aes256Cbc,
    #[serde(rename = "des-ede3-cbc")]
    DesEde3Cbc,
}

impl CipherSuite {
    pub const ALL: [CipherSuite; 4] = [
        CipherSuite::Aes128Cbc,
        CipherSuite::Aes192Cbc,
        CipherSuite::Aes256Cbc,
        CipherSuite::DesEde3Cbc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes128Cbc => "aes-128-cbc",
            CipherSuite::Aes192Cbc => "aes-192-cbc",
            CipherSuite::Aes256Cbc => "aes-256-cbc",
            CipherSuite::DesEde3Cbc => "des-ede3-cbc",
        }
    }

    pub(crate) fn openssl(self) -> Cipher {
        match self {
            CipherSuite::Aes128Cbc => Cipher::aes_128_cbc(),
            CipherSuite::Aes192Cbc => Cipher::aes_192_cbc(),
            CipherSuite::Aes256Cbc => Cipher::aes_256_cbc(),
            CipherSuite::DesEde3Cbc => Cipher::des_ede3_cbc(),
        }
    }
}

impl Default for CipherSuite {
    fn default() -> Self {
        CipherSuite::Aes256Cbc
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherSuite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CipherSuite::ALL
            .into_iter()
            .find(|cipher| cipher.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = CipherSuite::ALL.iter().map(|c| c.name()).collect();
                format!("unknown cipher '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_aes_256_cbc() {
        assert_eq!(CipherSuite::default(), CipherSuite::Aes256Cbc);
        assert_eq!(CipherSuite::default().name(), "aes-256-cbc");
    }

    #[test]
    fn parse_known_names() {
        for cipher in CipherSuite::ALL {
            assert_eq!(cipher.name().parse::<CipherSuite>(), Ok(cipher));
        }
    }

    #[test]
    fn parse_rejects_unknown_name() {
        let err = "rot13".parse::<CipherSuite>().unwrap_err();
        assert!(err.contains("unknown cipher"));
        assert!(err.contains("aes-256-cbc"));
    }
}
