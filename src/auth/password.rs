use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn argon2_failure(op: &'static str, e: password_hash::Error) -> anyhow::Error {
    error!(error = %e, op, "argon2 failure");
    anyhow::anyhow!("{op}: {e}")
}

/// Hashes a password into an Argon2 PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| argon2_failure("hash password", e))
}

/// `Ok(false)` for a wrong password; `Err` only when `stored` is not a usable hash.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| argon2_failure("parse hash", e))?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(argon2_failure("verify password", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("Secur3P@ssw0rd!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("Secur3P@ssw0rd!"));
        assert!(verify_password("Secur3P@ssw0rd!", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("pan-fried").unwrap();
        let b = hash_password("pan-fried").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("pan-fried", &a).unwrap());
        assert!(verify_password("pan-fried", &b).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("slow-roasted").unwrap();
        assert!(!verify_password("deep-fried", &hash).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        let err = verify_password("anything", "plaintext-in-db").unwrap_err();
        assert!(err.to_string().starts_with("parse hash"));
    }
}
