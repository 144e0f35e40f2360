mod ssc;

pub use crate::ssc::*;

use std::error::Error;
use clap::Parser;

fn main() -> Result<(), Box<dyn Error>> {
    let mut ssc = SSC::parse();
    if ssc.output == "stdout" && (ssc.mode == "encrypt" || ssc.mode == "decrypt") {
        ssc.silent = true;
    }
    if !ssc.silent { println!("Run args: {:?}", ssc); }
    ssc.run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io::Cursor;
    use num_bigint::{BigInt, ToBigInt};
    use crate::{RunMode, SSC};
    use crate::ssc::config::CONFIG_DEF;
    use crate::ssc::keys::{Key, KeySet};
    use crate::ssc::prime_gen::*;
    use crate::ssc::sign::{parse_identity, sign, verify};

    fn test_options(bits: u64) -> SSC {
        let mut ssc = CONFIG_DEF.get().copy();
        ssc.bits = bits;
        ssc.rounds = 30;
        ssc.threads = 2;
        ssc.silent = true;
        ssc
    }

    #[test]
    fn gen_prime() -> Result<(), Box<dyn Error>> {
        let mut rand = RandState::new(7);
        let p = generate_prime(48, 20, &mut rand)?;
        assert_eq!(p.bits(), 48);
        assert!(miller_rabin(&p, 20, &mut rand));
        assert!(generate_prime(1, 10, &mut rand).is_err());
        Ok(())
    }

    #[test]
    fn test_miller_rabin() {
        let primes = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59];
        let mut rand = RandState::new(11);
        for x in 0i32..60 {
            let expect = primes.contains(&x);
            assert_eq!(miller_rabin(&x.to_bigint().unwrap(), 25, &mut rand), expect, "n = {}", x);
        }
    }

    #[test]
    fn test_gcd_lcm() {
        assert_eq!(gcd(&BigInt::from(54), &BigInt::from(24)), BigInt::from(6));
        assert_eq!(gcd(&BigInt::from(17), &BigInt::from(31)), BigInt::from(1));
        assert_eq!(lcm(&BigInt::from(4), &BigInt::from(6)), BigInt::from(12));
        assert_eq!(SSC::carmichael(&BigInt::from(7), &BigInt::from(11)), BigInt::from(30));
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(&BigInt::from(3), &BigInt::from(7)), Some(BigInt::from(5)));
        assert_eq!(mod_inverse(&BigInt::from(4), &BigInt::from(8)), None);
        let n = BigInt::from(101);
        for a in 1..101 {
            let a = BigInt::from(a);
            let i = mod_inverse(&a, &n).unwrap();
            assert!(i >= BigInt::from(0) && i < n);
            assert_eq!(&a * &i % &n, BigInt::from(1));
        }
    }

    #[test]
    fn test_pow_mod() {
        let n = BigInt::from(0x10001);
        assert_eq!(pow_mod(&BigInt::from(5), &BigInt::from(0), &n), BigInt::from(1));
        let a = BigInt::from(0x1234567);
        let d = BigInt::from(0x89abcd);
        assert_eq!(pow_mod(&a, &d, &n), a.modpow(&d, &n));
    }

    #[test]
    fn test_key_gen() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut rand = RandState::new(42);
        let keys = ssc.generate_key(&mut rand)?;
        assert_eq!(keys.public.block_bits, 63);
        assert_eq!(keys.private.block_bits, 63);
        let m = BigInt::from(0xff68656c6c6fu64);
        let c = pow_mod(&m, &keys.public.n, &keys.public.n);
        let back = pow_mod(&c, &keys.private.d, &keys.private.n);
        assert_eq!(back, m);
        Ok(())
    }

    #[test]
    fn key_gen_rejects_narrow_modulus() {
        let ssc = test_options(4);
        let mut rand = RandState::new(3);
        assert!(ssc.generate_key(&mut rand).is_err());
    }

    #[test]
    fn function_test() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut rand = RandState::new(42);
        let keys = ssc.generate_key(&mut rand)?;
        let mut cipher: Vec<u8> = Vec::new();
        SSC::process(&mut Cursor::new(b"hello".to_vec()), &mut cipher, RunMode::Encrypt,
                     keys.public.cipher_key(), keys.public.block_bits, ssc.threads, true)?;
        assert!(cipher.ends_with(b"\n"));
        let mut plain: Vec<u8> = Vec::new();
        SSC::process(&mut Cursor::new(cipher), &mut plain, RunMode::Decrypt,
                     keys.private.cipher_key(), keys.private.block_bits, ssc.threads, true)?;
        assert_eq!(plain, b"hello".to_vec());
        Ok(())
    }

    #[test]
    fn codec_block_boundaries() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut rand = RandState::new(9);
        let keys = ssc.generate_key(&mut rand)?;
        // payload per block is block_bits / 8 - 1 = 6 bytes here
        for len in [0usize, 1, 5, 6, 7, 12, 13] {
            let data = (0..len).map(|i| (i * 37 + 1) as u8).collect::<Vec<_>>();
            let mut cipher: Vec<u8> = Vec::new();
            SSC::process(&mut Cursor::new(data.clone()), &mut cipher, RunMode::Encrypt,
                         keys.public.cipher_key(), keys.public.block_bits, ssc.threads, true)?;
            let mut plain: Vec<u8> = Vec::new();
            SSC::process(&mut Cursor::new(cipher), &mut plain, RunMode::Decrypt,
                         keys.private.cipher_key(), keys.private.block_bits, ssc.threads, true)?;
            assert_eq!(plain, data, "len = {}", len);
        }
        Ok(())
    }

    #[test]
    fn codec_rejects_narrow_blocks() {
        let key = Key { base: BigInt::from(3), m: BigInt::from(35) };
        let mut out: Vec<u8> = Vec::new();
        let res = SSC::process(&mut Cursor::new(vec![1u8, 2, 3]), &mut out,
                               RunMode::Encrypt, key, 15, 1, true);
        assert!(res.is_err());
    }

    #[test]
    fn decrypt_rejects_bad_hex() {
        let key = Key { base: BigInt::from(7), m: BigInt::from(77) };
        let mut out: Vec<u8> = Vec::new();
        let res = SSC::process(&mut Cursor::new(b"zzzz\n".to_vec()), &mut out,
                               RunMode::Decrypt, key, 63, 1, true);
        assert!(res.is_err());
    }

    #[test]
    fn test_sign_verify() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut rand = RandState::new(1);
        let keys = ssc.generate_key(&mut rand)?;
        let identity = parse_identity("alice").unwrap();
        let signature = sign(&identity, &keys.private.d, &keys.public.n);
        assert!(verify(&identity, &signature, &keys.public.n));
        let mut rand = RandState::new(2);
        let other = ssc.generate_key(&mut rand)?;
        assert!(!verify(&identity, &signature, &other.public.n));
        Ok(())
    }

    #[test]
    fn test_key_files() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut rand = RandState::new(5);
        let keys = ssc.generate_key(&mut rand)?;
        let identity = parse_identity("carol").unwrap();
        let signature = sign(&identity, &keys.private.d, &keys.public.n);
        let path = std::env::temp_dir().join("ssc-test-key");
        let path = path.to_str().unwrap().to_string();
        keys.save(path.clone(), &signature, "carol")?;
        let (read, sig, user) = KeySet::load(path)?;
        assert_eq!(read.public, keys.public);
        assert_eq!(read.private, keys.private);
        assert_eq!(sig, signature);
        assert_eq!(user, "carol");
        Ok(())
    }

    #[test]
    fn seeded_generation_repeats() -> Result<(), Box<dyn Error>> {
        let ssc = test_options(64);
        let mut a = RandState::new(42);
        let mut b = RandState::new(42);
        let first = ssc.generate_key(&mut a)?;
        let second = ssc.generate_key(&mut b)?;
        assert_eq!(first.public, second.public);
        assert_eq!(first.private, second.private);
        Ok(())
    }
}
