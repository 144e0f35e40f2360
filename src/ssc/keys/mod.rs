pub mod key_writer;
pub mod key_reader;
pub mod key_pair;

pub use key_pair::*;
pub use key_reader::*;
pub use key_writer::*;

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use num_bigint::BigInt;

/// Encryption side of a key pair: the public modulus `N = p^2 * q` and the
/// block width the codec chunks against.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub n: BigInt,
    pub block_bits: u64,
}

/// Decryption side: private exponent `d` and decryption modulus `n = p * q`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivateKey {
    pub d: BigInt,
    pub n: BigInt,
    pub block_bits: u64,
}

#[derive(Debug)]
pub struct KeySet {
    pub public: PublicKey,
    pub private: PrivateKey,
}

/// Exponent / modulus pair driving one direction of the block codec.
#[derive(Debug, Clone)]
pub struct Key {
    pub base: BigInt,
    pub m: BigInt,
}

impl PublicKey {
    /// Encryption raises to the public modulus itself; there is no separate
    /// small exponent in this scheme.
    pub fn cipher_key(&self) -> Key {
        Key { base: self.n.clone(), m: self.n.clone() }
    }
}

impl PrivateKey {
    pub fn cipher_key(&self) -> Key {
        Key { base: self.d.clone(), m: self.n.clone() }
    }
}

pub enum KeyError {
    ParseError(String),
    FormatError,
    BadSignature(String),
    Io(io::Error),
}

impl KeyError {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyError::ParseError(line) => write!(f, "Malformed key file line: {}", line),
            KeyError::FormatError => write!(f, "Key file has the wrong shape"),
            KeyError::BadSignature(user) => write!(f, "Signature check failed for user {}", user),
            KeyError::Io(e) => write!(f, "Key file I/O failed: {}", e),
        }
    }
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Debug for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for KeyError {}

impl From<io::Error> for KeyError {
    fn from(e: io::Error) -> Self {
        KeyError::Io(e)
    }
}
