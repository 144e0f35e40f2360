use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::fs::File;
use std::{io, thread};
use std::io::{BufRead, Read, Write};
use chrono::Local;
use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use num_bigint::{BigInt, Sign, ToBigInt};
use num_traits::{One, Zero};
use indicatif::{ProgressBar, ProgressStyle};

pub mod config;
pub mod prime_gen;
pub mod keys;
pub mod sign;

use config::*;
use keys::*;
use prime_gen::*;
use sign::*;

#[derive(Debug, Clone)]
pub enum RunMode {
    Generate,
    Encrypt,
    Decrypt,
    Verify,
}

/// Constant first byte of every plaintext block; pins the block's bit-length
/// so a short final chunk survives the integer round trip.
pub const BLOCK_MARKER: u8 = 0xff;

const GENERATE_RETRY_MAX: u32 = 1024;

#[derive(Debug, Parser)]
pub struct SSC {
    #[clap(short, long, value_parser, default_value = CONFIG_DEF.mode.as_str(), help = "Run mode: generate, encrypt, decrypt, verify")]
    pub mode: String,
    #[clap(short, long, value_parser, default_value = CONFIG_DEF.key.as_str(), help = "Key path, reads/writes `path' and `path.pub'")]
    pub key: String,
    #[clap(short, long, value_parser, default_value = CONFIG_DEF.input.as_str(), help = "Input filename")]
    pub input: String,
    #[clap(short, long, value_parser, default_value = CONFIG_DEF.output.as_str(), help = "Output filename")]
    pub output: String,
    #[clap(short, long, value_parser, default_value_t = CONFIG_DEF.bits, help = "Modulus bits")]
    pub bits: u64,
    #[clap(short, long, value_parser, default_value_t = CONFIG_DEF.rounds, help = "Miller Rabin calculate rounds")]
    pub rounds: u64,
    #[clap(short, long, value_parser, help = "Random seed, defaults to the current time")]
    pub seed: Option<u64>,
    #[clap(short, long, value_parser, default_value = CONFIG_DEF.user.as_str(), help = "Identity signed into the public key")]
    pub user: String,
    #[clap(short, long, value_parser, default_value_t = CONFIG_DEF.threads, help = "Calculate in <THREADS> threads")]
    pub threads: usize,
    #[clap(long, value_parser, default_value_t = CONFIG_DEF.silent, help = "Disable log output")]
    pub silent: bool,
}

pub enum KeyGenError {
    ModulusTooSmall(u64),
    NoInverse,
    RetryLimit(u32),
    Prime(PrimeError),
}

impl KeyGenError {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyGenError::ModulusTooSmall(bits) => write!(f, "Cannot split {} modulus bits between two primes", bits),
            KeyGenError::NoInverse => write!(f, "Public modulus has no inverse mod lambda, key unusable"),
            KeyGenError::RetryLimit(tries) => write!(f, "Gave up regenerating q after {} tries", tries),
            KeyGenError::Prime(e) => write!(f, "{}", e),
        }
    }
}

impl Display for KeyGenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Debug for KeyGenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for KeyGenError {}

impl From<PrimeError> for KeyGenError {
    fn from(e: PrimeError) -> Self {
        KeyGenError::Prime(e)
    }
}

pub enum CipherError {
    BlockTooSmall(u64),
    BadBlock(String),
}

impl CipherError {
    fn display(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CipherError::BlockTooSmall(bits) => write!(f, "Block width of {} bits leaves no room for payload", bits),
            CipherError::BadBlock(line) => write!(f, "Malformed ciphertext block: {}", line),
        }
    }
}

impl Display for CipherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Debug for CipherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.display(f)
    }
}

impl Error for CipherError {}

impl SSC {
    pub fn get(&self) -> &SSC {
        self
    }

    pub fn copy(&self) -> SSC {
        SSC {
            mode: self.mode.clone(),
            key: self.key.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            bits: self.bits,
            rounds: self.rounds,
            seed: self.seed,
            user: self.user.clone(),
            threads: self.threads,
            silent: self.silent,
        }
    }

    pub fn reader(&self) -> Box<dyn Read> {
        match self.input.as_str() {
            "stdin" => Box::new(io::stdin()),
            f => Box::new(File::open(f).unwrap())
        }
    }

    pub fn writer(&mut self) -> Box<dyn Write> {
        match self.output.as_str() {
            "stdout" => {
                self.silent = true;
                Box::new(io::stdout())
            }
            f => Box::new(File::create(f).unwrap())
        }
    }

    fn run_mode(&self) -> RunMode {
        match self.mode.as_str() {
            "generate" => Ok(RunMode::Generate),
            "encrypt" => Ok(RunMode::Encrypt),
            "decrypt" => Ok(RunMode::Decrypt),
            "verify" => Ok(RunMode::Verify),
            _ => Err("Unknown run mode! available: generate(default), encrypt, decrypt, verify")
        }.unwrap()
    }

    pub fn rand_state(&self) -> RandState {
        match self.seed {
            Some(seed) => RandState::new(seed),
            None => RandState::from_clock(),
        }
    }

    /// Carmichael's lambda of two distinct primes: `lcm(p - 1, q - 1)`.
    pub fn carmichael(p: &BigInt, q: &BigInt) -> BigInt {
        lcm(&(p - 1.to_bigint().unwrap()), &(q - 1.to_bigint().unwrap()))
    }

    /// Synthesizes the key pair: unevenly split primes, degenerate moduli
    /// rejected, `n = p*q`, `N = p*n`, `d = N^-1 mod lambda`.
    pub fn generate_key(&self, rand: &mut RandState) -> Result<KeySet, KeyGenError> {
        if self.bits < 8 {
            return Err(KeyGenError::ModulusTooSmall(self.bits));
        }
        // p and q get deliberately unbalanced widths, summing to self.bits
        let p_bits = self.bits / 4 + rand.gen_range(self.bits / 2);
        let q_bits = self.bits - p_bits;
        let start = Local::now().timestamp_millis();
        let p = generate_prime(p_bits, self.rounds, rand)?;
        let mut q = generate_prime(q_bits, self.rounds, rand)?;
        let one: BigInt = One::one();
        let mut tries = 0;
        while p == q || ((&p - &one) % &q).is_zero() || ((&q - &one) % &p).is_zero() {
            tries += 1;
            if tries > GENERATE_RETRY_MAX {
                return Err(KeyGenError::RetryLimit(tries));
            }
            q = generate_prime(q_bits, self.rounds, rand)?;
        }
        if !self.silent {
            let time = Local::now().timestamp_millis() - start;
            println!("Generated p ({} bits), q ({} bits) in {} ms", p.bits(), q.bits(), time);
        }
        let n = &p * &q;
        let modulus = &p * &n;
        let lambda = SSC::carmichael(&p, &q);
        let d = mod_inverse(&(&modulus % &lambda), &lambda).ok_or(KeyGenError::NoInverse)?;
        let block_bits = self.bits - 1;
        Ok(KeySet {
            public: PublicKey { n: modulus, block_bits },
            private: PrivateKey { d, n, block_bits },
        })
    }

    pub fn read_source(reader: &mut dyn Read, bytes: usize) -> Vec<u8> {
        let mut source = [0 as u8; 1];
        let mut res = Vec::new();
        loop {
            match reader.read(source.as_mut()) {
                Ok(n) => match n {
                    0 => break,
                    _ => {
                        res.push(source[0]);
                        if res.len() >= bytes { break; }
                    }
                },
                _ => break
            }
        }
        res
    }

    /// One block through the codec. Encrypt: marker byte + chunk, big-endian,
    /// raised to the public modulus, emitted as a lowercase hex line.
    /// Decrypt: hex line back to the residue, marker byte dropped.
    pub fn transform_block(block: &[u8], key: &Key, encrypt: bool) -> Result<Vec<u8>, CipherError> {
        if encrypt {
            let mut buf = Vec::with_capacity(block.len() + 1);
            buf.push(BLOCK_MARKER);
            buf.extend_from_slice(block);
            let m = BigInt::from_bytes_be(Sign::Plus, &buf);
            let c = pow_mod(&m, &key.base, &key.m);
            Ok(format!("{:x}\n", c).into_bytes())
        } else {
            let text = std::str::from_utf8(block)
                .map_err(|_| CipherError::BadBlock(String::from_utf8_lossy(block).into_owned()))?;
            let c = BigInt::parse_bytes(text.trim().as_bytes(), 16)
                .ok_or_else(|| CipherError::BadBlock(text.to_string()))?;
            let m = pow_mod(&c, &key.base, &key.m);
            let bytes = m.to_bytes_be().1;
            Ok(bytes[1..].to_vec())
        }
    }

    pub fn process(reader: &mut dyn Read, writer: &mut dyn Write, mode: RunMode, key: Key,
                   block_bits: u64, threads: usize, silent: bool) -> Result<(), Box<dyn Error>> {
        let encrypt = matches!(mode, RunMode::Encrypt);
        let block_size = (block_bits / 8) as usize;
        if block_size < 2 {
            return Err(Box::new(CipherError::BlockTooSmall(block_bits)));
        }
        let threads = threads.max(1);
        let mut source_data: Vec<Vec<u8>> = Vec::new();
        if encrypt {
            loop {
                let source = SSC::read_source(reader, block_size - 1);
                if source.is_empty() { break; }
                source_data.push(source);
            }
        } else {
            for line in io::BufReader::new(reader).lines() {
                let line = line?;
                if line.trim().is_empty() { continue; }
                source_data.push(line.into_bytes());
            }
        }
        let chunks = source_data.len();
        if !silent { println!("block size {}, source chunk: {}", block_size, chunks); }
        let (map_tx, map_rx): (Sender<(usize, Vec<u8>)>, Receiver<(usize, Vec<u8>)>) = bounded(threads);
        let (reduce_tx, reduce_rx) = bounded(threads);
        let pb = match silent {
            true => None,
            false => Some(ProgressBar::new(chunks as u64)),
        };
        if let Some(pb) = &pb {
            pb.set_style(ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})").unwrap()
                .progress_chars("#>-"));
        }
        let handles = (0..threads).map(|_i| {
            let r = map_rx.clone();
            let s = reduce_tx.clone();
            let key = key.clone();
            thread::spawn(move || {
                loop {
                    match r.recv() {
                        Ok((index, block)) => {
                            let res = SSC::transform_block(&block, &key, encrypt);
                            s.send((index, res)).unwrap();
                        }
                        _ => break
                    }
                }
            })
        }).collect::<Vec<_>>();
        let mut res_collect: Vec<(usize, Result<Vec<u8>, CipherError>)> = Vec::new();
        for i in 0..source_data.len() {
            match reduce_rx.try_recv() {
                Ok(r) => {
                    res_collect.push(r);
                    if let Some(pb) = &pb { pb.inc(1); }
                }
                _ => {}
            };
            map_tx.send((i, source_data[i].clone())).unwrap();
        }
        drop(map_tx);
        let left = source_data.len() - res_collect.len();
        for _ in 0..left {
            let r = reduce_rx.recv().unwrap();
            res_collect.push(r);
            if let Some(pb) = &pb { pb.inc(1); }
        }
        if let Some(pb) = &pb {
            pb.finish_with_message("Done");
        }
        for handle in handles { handle.join().unwrap(); }
        res_collect.sort_by_key(|r| r.0);
        for (i, r) in res_collect.iter().enumerate() {
            assert_eq!(i, r.0);
        }
        for (_i, res) in res_collect {
            writer.write_all(&res?)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        match self.run_mode() {
            RunMode::Generate => {
                let mut rand = self.rand_state();
                let key_set = self.generate_key(&mut rand)?;
                let user = self.user.clone();
                let identity = parse_identity(&user)
                    .ok_or_else(|| KeyError::ParseError(user.clone()))?;
                let signature = sign::sign(&identity, &key_set.private.d, &key_set.public.n);
                key_set.save(self.key.clone(), &signature, &user)?;
                if !self.silent {
                    println!("user = {}", user);
                    println!("s ({} bits) = {}", signature.bits(), signature);
                    println!("N ({} bits) = {}", key_set.public.n.bits(), key_set.public.n);
                    println!("n ({} bits) = {}", key_set.private.n.bits(), key_set.private.n);
                    println!("d ({} bits) = {}", key_set.private.d.bits(), key_set.private.d);
                    println!("Generated key files: {}, {}", self.key, self.key.clone() + ".pub");
                }
            }
            RunMode::Encrypt => {
                let mut reader = self.reader();
                let mut writer = self.writer();
                let (public, signature, user) = PublicKey::load(self.key.clone() + ".pub")?;
                if !self.silent {
                    println!("user = {}, N ({} bits), s ({} bits)", user, public.n.bits(), signature.bits());
                }
                let block_bits = public.block_bits;
                SSC::process(&mut reader, &mut writer, RunMode::Encrypt, public.cipher_key(),
                             block_bits, self.threads, self.silent)?;
                if !self.silent { println!("Done"); };
            }
            RunMode::Decrypt => {
                let mut reader = self.reader();
                let mut writer = self.writer();
                let private = PrivateKey::load(self.key.clone())?;
                if !self.silent {
                    println!("n ({} bits), d ({} bits)", private.n.bits(), private.d.bits());
                }
                let block_bits = private.block_bits;
                SSC::process(&mut reader, &mut writer, RunMode::Decrypt, private.cipher_key(),
                             block_bits, self.threads, self.silent)?;
                if !self.silent { println!("Done"); };
            }
            RunMode::Verify => {
                let (public, signature, user) = PublicKey::load(self.key.clone() + ".pub")?;
                let identity = parse_identity(&user)
                    .ok_or_else(|| KeyError::ParseError(user.clone()))?;
                if !verify(&identity, &signature, &public.n) {
                    return Err(Box::new(KeyError::BadSignature(user)));
                }
                if !self.silent { println!("Valid key for user {}", user); }
            }
        }
        Ok(())
    }
}
