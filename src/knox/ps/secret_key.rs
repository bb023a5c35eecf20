use blsful::inner_types::Scalar;
use core::fmt;
use elliptic_curve::Field;
use rand_chacha::ChaChaRng;
use rand_core::{CryptoRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use sha3::digest::{ExtendableOutput, Update, XofReader};
use zeroize::Zeroize;

/// The secret key contains a field element for each
/// message that is signed and two extra.
/// See section 4.2 in
/// <https://eprint.iacr.org/2015/525.pdf> and
/// <https://eprint.iacr.org/2017/1197.pdf>
///
/// `w` corresponds to m' in the paper to achieve
/// EUF-CMA security level.
#[derive(Clone, Eq, PartialEq, Deserialize, Serialize, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey {
    pub(crate) w: Scalar,
    pub(crate) x: Scalar,
    pub(crate) y: Vec<Scalar>,
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("messages", &self.y.len())
            .finish_non_exhaustive()
    }
}

impl SecretKey {
    /// The largest number of messages a key can sign
    pub const MAX_MESSAGES: usize = 128;

    /// Compute a secret key from a hash
    pub fn hash<B: AsRef<[u8]>>(count: usize, data: B) -> Option<Self> {
        const SALT: &[u8] = b"PS-SIG-KEYGEN-SALT-";
        let mut reader = sha3::Shake256::default()
            .chain(SALT)
            .chain(data.as_ref())
            .finalize_xof();
        let mut okm = [0u8; 32];
        reader.read(&mut okm);
        let rng = ChaChaRng::from_seed(okm);

        generate_secret_key(count, rng)
    }

    /// Compute a secret key from a CS-PRNG
    pub fn random(count: usize, rng: impl RngCore + CryptoRng) -> Option<Self> {
        generate_secret_key(count, rng)
    }

    /// The number of messages this key signs
    pub fn message_count(&self) -> usize {
        self.y.len()
    }

    /// Check if this secret key is invalid
    pub fn is_invalid(&self) -> bool {
        let mut res = self.w.is_zero();
        res |= self.x.is_zero();
        for y in &self.y {
            res |= y.is_zero();
        }
        res.unwrap_u8() == 1u8
    }
}

fn generate_secret_key(count: usize, mut rng: impl RngCore + CryptoRng) -> Option<SecretKey> {
    if count == 0 || count > SecretKey::MAX_MESSAGES {
        return None;
    }
    let w = Scalar::random(&mut rng);
    let x = Scalar::random(&mut rng);
    let y = (0..count).map(|_| Scalar::random(&mut rng)).collect();

    Some(SecretKey { w, x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_keys_are_deterministic() {
        let a = SecretKey::hash(3, b"seed").unwrap();
        let b = SecretKey::hash(3, b"seed").unwrap();
        let c = SecretKey::hash(3, b"other seed").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.message_count(), 3);
    }

    #[test]
    fn message_bounds() {
        assert!(SecretKey::random(0, rand_core::OsRng).is_none());
        assert!(SecretKey::random(SecretKey::MAX_MESSAGES + 1, rand_core::OsRng).is_none());
        assert!(!SecretKey::random(1, rand_core::OsRng).unwrap().is_invalid());
    }

    #[test]
    fn debug_hides_exponents() {
        let sk = SecretKey::hash(2, b"debug").unwrap();
        let text = format!("{:?}", sk);
        assert!(!text.contains(&format!("{:?}", sk.x)));
    }
}
