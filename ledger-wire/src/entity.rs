use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

use derive_more::{Display, From, Into};
use serde::Deserialize;
use thiserror::Error;

/// Identity of the target ledger checksums are validated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, From, Into, Deserialize)]
#[serde(try_from = "String")]
pub struct LedgerId(Vec<u8>);

impl LedgerId {
    pub fn mainnet() -> Self {
        LedgerId(vec![0])
    }

    pub fn testnet() -> Self {
        LedgerId(vec![1])
    }

    pub fn previewnet() -> Self {
        LedgerId(vec![2])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for LedgerId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(&base16::encode_lower(&self.0))
    }
}

impl TryFrom<String> for LedgerId {
    type Error = base16::DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(LedgerId(base16::decode(&value)?))
    }
}

/// Five-letter checksum binding an entity number to a particular ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 5]);

const P3: u64 = 26 * 26 * 26;
const P5: u64 = P3 * 26 * 26;
const M: u64 = 1_000_003;
const W: u64 = 31;

impl Checksum {
    /// Derive the checksum for entity number `num` on the given ledger.
    ///
    /// Weighted digit sums over the decimal rendering of `num`, folded
    /// together with the ledger id bytes mod 26^5 and spelled out as five
    /// lowercase letters.
    pub fn derive(ledger_id: &LedgerId, num: u64) -> Checksum {
        let digits: Vec<u64> = num.to_string().bytes().map(|b| u64::from(b - b'0')).collect();

        let mut s0 = 0u64;
        let mut s1 = 0u64;
        let mut s = 0u64;
        for (i, d) in digits.iter().enumerate() {
            s = (W * s + d) % P3;
            if i % 2 == 0 {
                s0 = (s0 + d) % 11;
            } else {
                s1 = (s1 + d) % 11;
            }
        }

        let mut sh = 0u64;
        for b in ledger_id.as_bytes().iter().chain([0u8; 6].iter()) {
            sh = (W * sh + u64::from(*b)) % P5;
        }

        let mut c = ((((digits.len() as u64 % 5) * 11 + s0) * 11 + s1) * P3 + s + sh) % P5;
        c = (c * M) % P5;

        let mut letters = [0u8; 5];
        for slot in letters.iter_mut().rev() {
            *slot = b'a' + (c % 26) as u8;
            c /= 26;
        }
        Checksum(letters)
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(std::str::from_utf8(&self.0).unwrap())
    }
}

#[derive(Debug, Display)]
pub enum InvalidEntityId {
    Num(ParseIntError),
    BadChecksum,
}

impl FromStr for Checksum {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || !bytes.iter().all(|b| b.is_ascii_lowercase()) {
            return Err(InvalidEntityId::BadChecksum);
        }
        let mut letters = [0u8; 5];
        letters.copy_from_slice(bytes);
        Ok(Checksum(letters))
    }
}

/// Raised when an entity's attached checksum does not match the one
/// derived for the target ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("checksum mismatch for entity `{id}`: expected `{expected}`, found `{found}`")]
pub struct ChecksumError {
    pub id: u64,
    pub expected: Checksum,
    pub found: Checksum,
}

/// Reference to an account on the ledger, optionally carrying a checksum
/// parsed from its string form. Read-only for the query pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId {
    pub num: u64,
    pub checksum: Option<Checksum>,
}

impl AccountId {
    pub fn new(num: u64) -> Self {
        AccountId { num, checksum: None }
    }

    pub fn with_checksum(num: u64, checksum: Checksum) -> Self {
        AccountId {
            num,
            checksum: Some(checksum),
        }
    }

    /// Check the attached checksum, if any, against the given ledger.
    /// Absent checksums validate trivially.
    pub fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<(), ChecksumError> {
        if let Some(found) = self.checksum {
            let expected = Checksum::derive(ledger_id, self.num);
            if found != expected {
                return Err(ChecksumError {
                    id: self.num,
                    expected,
                    found,
                });
            }
        }
        Ok(())
    }

    pub fn to_string_with_checksum(&self, ledger_id: &LedgerId) -> String {
        format!("{}-{}", self.num, Checksum::derive(ledger_id, self.num))
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        self.num.fmt(f)
    }
}

impl FromStr for AccountId {
    type Err = InvalidEntityId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('-') {
            Some((num, checksum)) => Ok(AccountId {
                num: num.parse().map_err(InvalidEntityId::Num)?,
                checksum: Some(checksum.parse()?),
            }),
            None => Ok(AccountId {
                num: s.parse().map_err(InvalidEntityId::Num)?,
                checksum: None,
            }),
        }
    }
}
