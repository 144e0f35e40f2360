use std::fs::File;
use std::io::Read;
use num_bigint::BigInt;
use crate::ssc::keys::{KeyError, PrivateKey, PublicKey};

fn read_lines(r: &mut dyn Read, count: usize) -> Result<Vec<String>, KeyError> {
    let mut text = String::new();
    r.read_to_string(&mut text)?;
    let lines = text.lines().map(|l| l.to_string()).collect::<Vec<_>>();
    if lines.len() != count {
        return Err(KeyError::FormatError);
    }
    Ok(lines)
}

fn parse_bigint(line: &str) -> Result<BigInt, KeyError> {
    BigInt::parse_bytes(line.trim().as_bytes(), 16)
        .ok_or_else(|| KeyError::ParseError(line.to_string()))
}

fn parse_bits(line: &str) -> Result<u64, KeyError> {
    u64::from_str_radix(line.trim(), 16)
        .map_err(|_| KeyError::ParseError(line.to_string()))
}

impl PublicKey {
    /// Inverse of `PublicKey::write`; also yields the embedded signature and
    /// identity string.
    pub fn read(r: &mut dyn Read) -> Result<(PublicKey, BigInt, String), KeyError> {
        let lines = read_lines(r, 4)?;
        let n = parse_bigint(&lines[0])?;
        let block_bits = parse_bits(&lines[1])?;
        let signature = parse_bigint(&lines[2])?;
        let user = lines[3].trim_end().to_string();
        Ok((PublicKey { n, block_bits }, signature, user))
    }

    pub fn load(path: String) -> Result<(PublicKey, BigInt, String), KeyError> {
        let mut f = File::open(path)?;
        PublicKey::read(&mut f)
    }
}

impl PrivateKey {
    pub fn read(r: &mut dyn Read) -> Result<PrivateKey, KeyError> {
        let lines = read_lines(r, 3)?;
        let n = parse_bigint(&lines[0])?;
        let d = parse_bigint(&lines[1])?;
        let block_bits = parse_bits(&lines[2])?;
        Ok(PrivateKey { d, n, block_bits })
    }

    pub fn load(path: String) -> Result<PrivateKey, KeyError> {
        let mut f = File::open(path)?;
        PrivateKey::read(&mut f)
    }
}
