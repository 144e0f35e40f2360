use num_bigint::BigInt;
use crate::ssc::keys::{KeyError, KeySet, PrivateKey, PublicKey};

impl KeySet {
    /// Writes the private key to `path` and the public key (with its
    /// embedded signature and identity) to `path.pub`.
    pub fn save(&self, path: String, signature: &BigInt, user: &str) -> Result<(), KeyError> {
        self.public.save(path.clone() + ".pub", signature, user)?;
        self.private.save(path)?;
        Ok(())
    }

    pub fn load(path: String) -> Result<(KeySet, BigInt, String), KeyError> {
        let (public, signature, user) = PublicKey::load(path.clone() + ".pub")?;
        let private = PrivateKey::load(path)?;
        Ok((KeySet { public, private }, signature, user))
    }
}
