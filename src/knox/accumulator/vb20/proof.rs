use super::{
    accumulator::{Accumulator, Element},
    hash_to_g1,
    key::PublicKey,
    witness::MembershipWitness,
};
use crate::error::Error;
use crate::knox::short_group_sig_core::ProofMessage;
use crate::CredxResult;
use blsful::inner_types::{pairing, G1Projective, G2Projective, Gt, Scalar};
use elliptic_curve::{
    group::{Curve, GroupEncoding},
    Field,
};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// Section 8 in <https://eprint.iacr.org/2020/777>
/// setup calls for four distinct generators in G1
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProofParams {
    /// Parameter X
    pub x: G1Projective,
    /// Parameter Y
    pub y: G1Projective,
    /// Parameter Z
    pub z: G1Projective,
    /// Parameter K
    pub k: G1Projective,
}

impl ProofParams {
    /// Create a new set of proof parameters bound to `pk` and optional `entropy`
    pub fn new(pk: PublicKey, entropy: Option<&[u8]>) -> Self {
        let mut data = vec![0xFFu8; 32];
        data.extend_from_slice(entropy.unwrap_or(&[]));
        data.extend_from_slice(&pk.to_bytes());

        let z = hash_to_g1(data.as_slice());

        data[0] = 0xFE;
        let y = hash_to_g1(data.as_slice());

        data[0] = 0xFD;
        let x = hash_to_g1(data.as_slice());

        data[0] = 0xFC;
        let k = hash_to_g1(data.as_slice());
        Self { k, x, y, z }
    }

    /// Add these proof params to the transcript
    pub fn add_to_transcript(&self, transcript: &mut Transcript) {
        transcript.append_message(b"Proof Param K", self.k.to_bytes().as_ref());
        transcript.append_message(b"Proof Param X", self.x.to_bytes().as_ref());
        transcript.append_message(b"Proof Param Y", self.y.to_bytes().as_ref());
        transcript.append_message(b"Proof Param Z", self.z.to_bytes().as_ref());
    }
}

/// The commit or blinding step for generating a ZKP
/// The next step is to call `get_bytes_for_challenge`
/// to create the fiat shamir heuristic
#[derive(Debug, Copy, Clone)]
pub struct MembershipProofCommitting {
    e_c: G1Projective,
    t_sigma: G1Projective,
    t_rho: G1Projective,
    delta_sigma: Scalar,
    delta_rho: Scalar,
    blinding_factor: Scalar,
    r_sigma: Scalar,
    r_rho: Scalar,
    r_delta_sigma: Scalar,
    r_delta_rho: Scalar,
    sigma: Scalar,
    rho: Scalar,
    cap_r_sigma: G1Projective,
    cap_r_rho: G1Projective,
    cap_r_delta_sigma: G1Projective,
    cap_r_delta_rho: G1Projective,
    cap_r_e: Gt,
    witness_value: Scalar,
}

impl MembershipProofCommitting {
    /// Create a new membership proof committing phase.
    /// `y` must be hidden; an external blinder links it to another proof.
    pub fn new(
        y: ProofMessage,
        witness: MembershipWitness,
        proof_params: ProofParams,
        pubkey: PublicKey,
        mut rng: impl RngCore + CryptoRng,
    ) -> CredxResult<Self> {
        let message = y.get_message();
        let r_y = y.get_blinder(&mut rng).ok_or(Error::InvalidProofData)?;

        let sigma = Scalar::random(&mut rng);
        let rho = Scalar::random(&mut rng);

        // E_C = C + (σ + ρ)Z
        let e_c = proof_params.z * (sigma + rho) + witness.0;
        // T_σ = σX
        let t_sigma = proof_params.x * sigma;
        // T_ρ = ρY
        let t_rho = proof_params.y * rho;
        // δ_σ = yσ
        let delta_sigma = message * sigma;
        // δ_ρ = yρ
        let delta_rho = message * rho;

        let r_sigma = Scalar::random(&mut rng);
        let r_rho = Scalar::random(&mut rng);
        let r_delta_sigma = Scalar::random(&mut rng);
        let r_delta_rho = Scalar::random(&mut rng);

        // R_σ = r_σ X
        let cap_r_sigma = proof_params.x * r_sigma;
        // R_ρ = r_ρ Y
        let cap_r_rho = proof_params.y * r_rho;
        // R_δσ = r_y T_σ - r_δσ X
        let cap_r_delta_sigma = cap_r(&[t_sigma, -proof_params.x], &[r_y, r_delta_sigma]);
        // R_δρ = r_y T_ρ - r_δρ Y
        let cap_r_delta_rho = cap_r(&[t_rho, -proof_params.y], &[r_y, r_delta_rho]);

        // R_E = e(E_C^r_y + Z^{-r_δσ - r_δρ}, P~) * e(Z, Q~)^{-r_σ - r_ρ}
        let lhs = cap_r(
            &[e_c, proof_params.z],
            &[r_y, -(r_delta_sigma + r_delta_rho)],
        );
        let cap_r_e = pair(lhs, G2Projective::GENERATOR)
            + pair(proof_params.z * -(r_sigma + r_rho), pubkey.0);

        Ok(Self {
            e_c,
            t_sigma,
            t_rho,
            delta_sigma,
            delta_rho,
            blinding_factor: r_y,
            r_sigma,
            r_rho,
            r_delta_sigma,
            r_delta_rho,
            sigma,
            rho,
            cap_r_e,
            cap_r_sigma,
            cap_r_rho,
            cap_r_delta_sigma,
            cap_r_delta_rho,
            witness_value: message,
        })
    }

    /// Return bytes that need to be hashed for generating challenge.
    ///
    /// Ec || T_sigma || T_rho || R_E || R_sigma || R_rho || R_delta_sigma || R_delta_rho
    pub fn get_bytes_for_challenge(&self, transcript: &mut Transcript) {
        add_challenge_bytes(
            transcript,
            [&self.e_c, &self.t_sigma, &self.t_rho],
            &self.cap_r_e,
            [
                &self.cap_r_sigma,
                &self.cap_r_rho,
                &self.cap_r_delta_sigma,
                &self.cap_r_delta_rho,
            ],
        );
    }

    /// Given the challenge value, compute the s values for Fiat-Shamir and return the actual
    /// proof to be sent to the verifier
    pub fn gen_proof(&self, challenge: Scalar) -> MembershipProof {
        MembershipProof {
            e_c: self.e_c,
            t_sigma: self.t_sigma,
            t_rho: self.t_rho,
            s_y: schnorr(self.blinding_factor, self.witness_value, challenge),
            s_sigma: schnorr(self.r_sigma, self.sigma, challenge),
            s_rho: schnorr(self.r_rho, self.rho, challenge),
            s_delta_sigma: schnorr(self.r_delta_sigma, self.delta_sigma, challenge),
            s_delta_rho: schnorr(self.r_delta_rho, self.delta_rho, challenge),
        }
    }
}

/// A ZKP membership proof
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MembershipProof {
    e_c: G1Projective,
    t_sigma: G1Projective,
    t_rho: G1Projective,
    s_sigma: Scalar,
    s_rho: Scalar,
    s_delta_sigma: Scalar,
    s_delta_rho: Scalar,
    s_y: Scalar,
}

impl MembershipProof {
    /// The response for the accumulated element, equal to the response
    /// of any other proof that shares its blinding factor
    pub fn s_y(&self) -> Scalar {
        self.s_y
    }

    /// Generate the structure that can be used in the challenge hash
    /// returns a struct to avoid recomputing
    pub fn finalize(
        &self,
        accumulator: Accumulator,
        proof_params: ProofParams,
        pubkey: PublicKey,
        challenge: Scalar,
    ) -> MembershipProofFinal {
        // R_σ = s_σ X - c T_σ
        let cap_r_sigma = cap_r(&[proof_params.x, -self.t_sigma], &[self.s_sigma, challenge]);
        // R_ρ = s_ρ Y - c T_ρ
        let cap_r_rho = cap_r(&[proof_params.y, -self.t_rho], &[self.s_rho, challenge]);
        // R_δσ = s_y T_σ - s_δσ X
        let cap_r_delta_sigma = cap_r(
            &[self.t_sigma, -proof_params.x],
            &[self.s_y, self.s_delta_sigma],
        );
        // R_δρ = s_y T_ρ - s_δρ Y
        let cap_r_delta_rho = cap_r(
            &[self.t_rho, -proof_params.y],
            &[self.s_y, self.s_delta_rho],
        );

        // e(E_C^s_y + Z^-(s_δσ + s_δρ) + V^-c, P~) * e(Z^-(s_σ + s_ρ) + E_C^c, Q~)
        let lhs = cap_r(
            &[self.e_c, proof_params.z, accumulator.0],
            &[
                self.s_y,
                -(self.s_delta_sigma + self.s_delta_rho),
                -challenge,
            ],
        );
        let rhs = cap_r(
            &[proof_params.z, self.e_c],
            &[-(self.s_sigma + self.s_rho), challenge],
        );
        let cap_r_e = pair(lhs, G2Projective::GENERATOR) + pair(rhs, pubkey.0);

        MembershipProofFinal {
            e_c: self.e_c,
            t_sigma: self.t_sigma,
            t_rho: self.t_rho,
            cap_r_e,
            cap_r_sigma,
            cap_r_rho,
            cap_r_delta_sigma,
            cap_r_delta_rho,
        }
    }

    /// Get the compact binary representation of the proof
    pub fn to_bytes(&self) -> CredxResult<Vec<u8>> {
        serde_bare::to_vec(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Convert a compact binary representation to a proof
    pub fn from_bytes(input: &[u8]) -> CredxResult<Self> {
        serde_bare::from_slice(input).map_err(|e| Error::SerializationError(e.to_string()))
    }
}

/// The computed values after running MembershipProof.finalize
#[derive(Debug, Copy, Clone)]
pub struct MembershipProofFinal {
    e_c: G1Projective,
    t_sigma: G1Projective,
    t_rho: G1Projective,
    cap_r_e: Gt,
    cap_r_sigma: G1Projective,
    cap_r_rho: G1Projective,
    cap_r_delta_sigma: G1Projective,
    cap_r_delta_rho: G1Projective,
}

impl MembershipProofFinal {
    /// Ec || T_sigma || T_rho || R_E || R_sigma || R_rho || R_delta_sigma || R_delta_rho
    pub fn get_bytes_for_challenge(&self, transcript: &mut Transcript) {
        add_challenge_bytes(
            transcript,
            [&self.e_c, &self.t_sigma, &self.t_rho],
            &self.cap_r_e,
            [
                &self.cap_r_sigma,
                &self.cap_r_rho,
                &self.cap_r_delta_sigma,
                &self.cap_r_delta_rho,
            ],
        );
    }
}

fn add_challenge_bytes(
    transcript: &mut Transcript,
    commitments: [&G1Projective; 3],
    cap_r_e: &Gt,
    cap_rs: [&G1Projective; 4],
) {
    let [e_c, t_sigma, t_rho] = commitments;
    let [r_sigma, r_rho, r_delta_sigma, r_delta_rho] = cap_rs;
    transcript.append_message(b"Ec", e_c.to_bytes().as_ref());
    transcript.append_message(b"T_sigma", t_sigma.to_bytes().as_ref());
    transcript.append_message(b"T_rho", t_rho.to_bytes().as_ref());
    transcript.append_message(b"R_E", cap_r_e.to_bytes().as_ref());
    transcript.append_message(b"R_sigma", r_sigma.to_bytes().as_ref());
    transcript.append_message(b"R_rho", r_rho.to_bytes().as_ref());
    transcript.append_message(b"R_delta_sigma", r_delta_sigma.to_bytes().as_ref());
    transcript.append_message(b"R_delta_rho", r_delta_rho.to_bytes().as_ref());
}

fn cap_r(bases: &[G1Projective], scalars: &[Scalar]) -> G1Projective {
    G1Projective::sum_of_products(bases, scalars)
}

fn pair(g1: G1Projective, g2: G2Projective) -> Gt {
    pairing(&g1.to_affine(), &g2.to_affine())
}

fn schnorr(r: Scalar, v: Scalar, challenge: Scalar) -> Scalar {
    v * challenge + r
}
