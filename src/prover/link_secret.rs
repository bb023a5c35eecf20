use crate::error::Error;
use crate::CredxResult;
use blsful::inner_types::Scalar;
use core::fmt;
use elliptic_curve::Field;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The holder secret blinded into every credential it receives
#[derive(Clone, PartialEq, Eq, Zeroize, Serialize, Deserialize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct LinkSecret(Scalar);

impl fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkSecret {{ .. }}")
    }
}

impl LinkSecret {
    /// Create a new random link secret
    pub fn new(rng: impl RngCore + CryptoRng) -> Self {
        Self(Scalar::random(rng))
    }

    /// Restore a link secret from its big-endian bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> CredxResult<Self> {
        Option::<Scalar>::from(Scalar::from_be_bytes(bytes))
            .map(Self)
            .ok_or_else(|| Error::InvalidInput("link secret is not a field element".to_string()))
    }

    /// The big-endian bytes of the secret
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    pub(crate) fn as_scalar(&self) -> Scalar {
        self.0
    }
}

/// Create a new link secret from the thread local generator
pub fn create_link_secret() -> LinkSecret {
    LinkSecret::new(rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_trip() {
        let secret = create_link_secret();
        let restored = LinkSecret::from_bytes(&secret.to_bytes()).unwrap();
        assert_eq!(secret, restored);
        assert!(LinkSecret::from_bytes(&[0xFF; 32]).is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let secret = create_link_secret();
        assert_eq!(format!("{:?}", secret), "LinkSecret { .. }");
    }
}
