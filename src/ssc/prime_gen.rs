use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use chrono::Local;
use num::Integer;
use num_bigint::{BigInt, RandBigInt, ToBigInt, ToBigUint};
use num_traits::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::ssc::prime_gen::PrimeError::BitsTooSmall;

pub enum PrimeError {
    BitsTooSmall(u64)
}

impl PrimeError {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BitsTooSmall(bits) => write!(f, "Cannot synthesize a prime of {} bits", bits)
        }
    }
}

impl Display for PrimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Debug for PrimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for PrimeError {}

/// Owned random state behind prime synthesis and witness selection.
///
/// Every randomized call in the kernel draws from one of these, so a fixed
/// seed reproduces a fixed key pair.
pub struct RandState {
    rng: StdRng,
}

impl RandState {
    pub fn new(seed: u64) -> Self {
        RandState { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_clock() -> Self {
        RandState::new(Local::now().timestamp_millis() as u64)
    }

    /// Uniform value in `[0, 2^bits)`.
    pub fn gen_bits(&mut self, bits: u64) -> BigInt {
        self.rng.gen_biguint(bits).to_bigint().unwrap()
    }

    /// Uniform value in `[0, bound)`; `bound` must be positive.
    pub fn gen_below(&mut self, bound: &BigInt) -> BigInt {
        self.rng.gen_biguint_below(&bound.to_biguint().unwrap()).to_bigint().unwrap()
    }

    /// Uniform value in `[0, bound)`; `bound` must be nonzero.
    pub fn gen_range(&mut self, bound: u64) -> u64 {
        self.rng.gen_range(0..bound)
    }
}

pub fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut a, mut b) = (a.clone(), b.clone());
    while !b.is_zero() {
        let t = &a % &b;
        a = b;
        b = t;
    }
    a
}

pub fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    (a * b) / gcd(a, b)
}

fn extended_euclid(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a.clone(), One::one(), Zero::zero());
    }
    let (d, x, y) = extended_euclid(b, &(a % b));
    (d, y.clone(), x - a / b * y)
}

/// Bezout coefficient of `a` such that `a * i == 1 (mod n)`, normalized into
/// `[0, n)`. `None` when `gcd(a, n) != 1` and no inverse exists.
pub fn mod_inverse(a: &BigInt, n: &BigInt) -> Option<BigInt> {
    let (d, x, _) = extended_euclid(a, n);
    if d.is_one() {
        Some(((x % n) + n) % n)
    } else {
        None
    }
}

/// Square-and-multiply `a^d mod n`. The exponent must be non-negative.
pub fn pow_mod(a: &BigInt, d: &BigInt, n: &BigInt) -> BigInt {
    assert!(!d.is_negative(), "pow_mod: negative exponent");
    let mut v: BigInt = One::one();
    let mut p = a % n;
    let mut d = d.clone();
    while d > Zero::zero() {
        if d.bit(0) {
            v = v * &p % n;
        }
        p = &p * &p % n;
        d >>= 1;
    }
    v
}

/// Miller-Rabin with `rounds` independent random witnesses. The composite
/// false-positive probability is bounded by `4^-rounds`.
pub fn miller_rabin(n: &BigInt, rounds: u64, rand: &mut RandState) -> bool {
    if *n <= One::one() || *n == 4.to_bigint().unwrap() {
        return false;
    }
    if *n <= 3.to_bigint().unwrap() {
        return true;
    }
    let n_min_1 = n - 1.to_bigint().unwrap();
    let mut r = n_min_1.clone();
    let mut s = 0u64;
    while r.is_even() {
        s += 1;
        r >>= 1;
    }
    for _ in 0..rounds {
        let a = rand.gen_below(&(n - 3.to_bigint().unwrap())) + 2.to_bigint().unwrap();
        let mut y = pow_mod(&a, &r, n);
        if !y.is_one() && y != n_min_1 {
            let mut witness = true;
            for _ in 1..s {
                y = &y * &y % n;
                if y.is_one() {
                    // a nontrivial square root of 1 already proves n composite
                    return false;
                }
                if y == n_min_1 {
                    witness = false;
                    break;
                }
            }
            if witness {
                return false;
            }
        }
    }
    true
}

/// Samples odd candidates with exactly `bits` significant bits until one
/// passes Miller-Rabin. Retries are unbounded but terminate with
/// overwhelming probability.
pub fn generate_prime(bits: u64, rounds: u64, rand: &mut RandState) -> Result<BigInt, PrimeError> {
    if bits < 2 {
        return Err(BitsTooSmall(bits));
    }
    let floor: BigInt = BigInt::from(1) << (bits - 1);
    loop {
        let mut p = rand.gen_bits(bits - 1) + &floor;
        while p.is_even() {
            p = rand.gen_bits(bits - 1) + &floor;
        }
        if miller_rabin(&p, rounds, rand) {
            return Ok(p);
        }
    }
}
