use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Newtype for plaintext passwords to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for stored password digests
#[derive(Debug, Clone)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(digest: String) -> Self {
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password to its hex-encoded SHA-256 digest.
///
/// Unsalted: digests must stay byte-compatible with the ones already in the
/// store. Switching to a salted adaptive scheme is a breaking migration.
pub fn hash_password(password: &Password) -> PasswordDigest {
    let mut hasher = Sha256::new();
    hasher.update(password.as_str().as_bytes());
    PasswordDigest(hex::encode(hasher.finalize()))
}

/// Verify a password against a stored digest in constant time.
///
/// Returns Ok(()) if the password matches, Err otherwise.
pub fn verify_password(
    password: &Password,
    digest: &PasswordDigest,
) -> Result<(), anyhow::Error> {
    let candidate = hash_password(password);
    if candidate
        .as_str()
        .as_bytes()
        .ct_eq(digest.as_str().as_bytes())
        .into()
    {
        Ok(())
    } else {
        Err(anyhow::anyhow!("password verification failed"))
    }
}
