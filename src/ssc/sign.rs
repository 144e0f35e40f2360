use num_bigint::BigInt;
use num_traits::Zero;
use crate::ssc::prime_gen::pow_mod;

/// Identity strings map onto the integers as base-62 numerals,
/// digits `0-9`, `A-Z`, `a-z`.
const IDENTITY_RADIX: u32 = 62;

/// `None` on an empty string or any character outside the base-62 alphabet.
pub fn parse_identity(s: &str) -> Option<BigInt> {
    if s.is_empty() {
        return None;
    }
    let mut value: BigInt = Zero::zero();
    for c in s.chars() {
        let digit = match c {
            '0'..='9' => c as u32 - '0' as u32,
            'A'..='Z' => c as u32 - 'A' as u32 + 10,
            'a'..='z' => c as u32 - 'a' as u32 + 36,
            _ => return None,
        };
        value = value * IDENTITY_RADIX + digit;
    }
    Some(value)
}

/// Signs with the private exponent over the *public* modulus, so that
/// verification is the same operation as encryption.
pub fn sign(identity: &BigInt, d: &BigInt, modulus: &BigInt) -> BigInt {
    pow_mod(identity, d, modulus)
}

pub fn verify(identity: &BigInt, signature: &BigInt, modulus: &BigInt) -> bool {
    pow_mod(signature, modulus, modulus) == *identity
}
