//! Password credentials: per-user salt and PBKDF2 verifier

use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha512;
use subtle::ConstantTimeEq;

pub const PBKDF2_ITERATIONS: u32 = 10_000;
/// 1024-bit derived key
pub const HASH_LEN: usize = 128;
pub const SALT_LEN: usize = 16;

/// Salt and derived hash, both hex-encoded
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub salt: String,
    pub hash: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credentials { .. }")
    }
}

impl Credentials {
    /// Derive credentials for a password under a freshly generated salt
    pub fn generate(password: &str) -> Self {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill(&mut salt_bytes);
        let salt = hex::encode(salt_bytes);
        let hash = derive(password, &salt);
        Self { salt, hash }
    }

    /// Recompute the hash for `candidate` under the stored salt and compare
    /// in constant time.
    pub fn verify(&self, candidate: &str) -> bool {
        let computed = derive(candidate, &self.salt);
        computed.as_bytes().ct_eq(self.hash.as_bytes()).into()
    }
}

/// The hex salt string itself is the KDF salt input
fn derive(password: &str, salt: &str) -> String {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut out);
    hex::encode(out)
}
