use super::SecretKey;
use blsful::inner_types::{G1Projective, G2Projective};
use elliptic_curve::group::{Curve, Group};
use serde::{Deserialize, Serialize};
use subtle::Choice;

/// The public key contains a generator point for each
/// message that is signed and two extra.
/// See section 4.2 in
/// <https://eprint.iacr.org/2015/525.pdf> and
/// <https://eprint.iacr.org/2017/1197.pdf>
///
/// `w` corresponds to m' in the paper to achieve
/// EUF-CMA security level.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct PublicKey {
    /// The secret for m'
    pub w: G2Projective,
    /// The blinding secret
    pub x: G2Projective,
    /// The secrets for each signed message
    pub y: Vec<G2Projective>,
    /// The secrets for each signed message for blinding purposes
    pub y_blinds: Vec<G1Projective>,
}

impl From<&SecretKey> for PublicKey {
    fn from(sk: &SecretKey) -> Self {
        let w = G2Projective::GENERATOR * sk.w;
        let x = G2Projective::GENERATOR * sk.x;
        let mut y = Vec::with_capacity(sk.y.len());
        let mut y_blinds = Vec::with_capacity(sk.y.len());
        for s_y in &sk.y {
            y.push(G2Projective::GENERATOR * s_y);
            y_blinds.push(G1Projective::GENERATOR * s_y);
        }
        Self { w, x, y, y_blinds }
    }
}

impl PublicKey {
    /// Check if this public key is invalid
    pub fn is_invalid(&self) -> Choice {
        let mut res = self.w.is_identity();
        res |= self.x.is_identity();
        res |= Choice::from((self.y.len() != self.y_blinds.len()) as u8);
        for y in &self.y {
            res |= y.is_identity();
        }
        for y in &self.y_blinds {
            res |= y.is_identity();
        }
        res
    }

    /// Store the public key as a sequence of bytes
    /// Each point is compressed to big-endian format
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(96 * 2 + 8 + self.y.len() * (96 + 48));
        buffer.extend_from_slice(&self.w.to_affine().to_compressed()[..]);
        buffer.extend_from_slice(&self.x.to_affine().to_compressed()[..]);
        buffer.extend_from_slice(&(self.y.len() as u32).to_be_bytes()[..]);
        for y in &self.y {
            buffer.extend_from_slice(&y.to_affine().to_compressed()[..]);
        }
        buffer.extend_from_slice(&(self.y_blinds.len() as u32).to_be_bytes()[..]);
        for y in &self.y_blinds {
            buffer.extend_from_slice(&y.to_affine().to_compressed()[..]);
        }
        buffer
    }
}
