use super::hidden_message::HiddenMessage;
use blsful::inner_types::Scalar;
use elliptic_curve::Field;
use rand_core::{CryptoRng, RngCore};

/// A message classification by the prover
#[derive(Copy, Clone, Debug)]
pub enum ProofMessage {
    /// Message will be revealed to a verifier
    Revealed(Scalar),
    /// Message will be hidden from a verifier
    Hidden(HiddenMessage),
}

impl ProofMessage {
    /// Extract the internal message
    pub fn get_message(&self) -> Scalar {
        match *self {
            ProofMessage::Revealed(r) => r,
            ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(p)) => p,
            ProofMessage::Hidden(HiddenMessage::ExternalBlinding(p, _)) => p,
        }
    }

    /// Get the blinding factor, `None` for revealed messages
    pub fn get_blinder(&self, rng: impl RngCore + CryptoRng) -> Option<Scalar> {
        match *self {
            ProofMessage::Revealed(_) => None,
            ProofMessage::Hidden(HiddenMessage::ProofSpecificBlinding(_)) => {
                Some(Scalar::random(rng))
            }
            ProofMessage::Hidden(HiddenMessage::ExternalBlinding(_, s)) => Some(s),
        }
    }

    /// Is this message revealed
    pub fn is_revealed(&self) -> bool {
        matches!(self, ProofMessage::Revealed(_))
    }
}
