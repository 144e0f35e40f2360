use std::fs::File;
use std::io::Write;
use num_bigint::BigInt;
use crate::ssc::keys::{KeyError, PrivateKey, PublicKey};

impl PublicKey {
    /// Four newline-terminated lines: `hex(N)`, `hex(blockBits)`,
    /// `hex(signature)`, identity string.
    pub fn write(&self, w: &mut dyn Write, signature: &BigInt, user: &str) -> Result<(), KeyError> {
        writeln!(w, "{:x}", self.n)?;
        writeln!(w, "{:x}", self.block_bits)?;
        writeln!(w, "{:x}", signature)?;
        writeln!(w, "{}", user)?;
        w.flush()?;
        Ok(())
    }

    pub fn save(&self, path: String, signature: &BigInt, user: &str) -> Result<(), KeyError> {
        let mut f = File::create(path)?;
        self.write(&mut f, signature, user)
    }
}

impl PrivateKey {
    /// Three newline-terminated lines: `hex(n)`, `hex(d)`, `hex(blockBits)`.
    pub fn write(&self, w: &mut dyn Write) -> Result<(), KeyError> {
        writeln!(w, "{:x}", self.n)?;
        writeln!(w, "{:x}", self.d)?;
        writeln!(w, "{:x}", self.block_bits)?;
        w.flush()?;
        Ok(())
    }

    pub fn save(&self, path: String) -> Result<(), KeyError> {
        let mut f = File::create(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perm = f.metadata()?.permissions();
            perm.set_mode(0o600);
            f.set_permissions(perm)?;
        }
        self.write(&mut f)
    }
}
