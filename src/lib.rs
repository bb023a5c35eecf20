//! Anonymous credentials built on Pointcheval-Sanders signatures.
//!
//! An issuer signs a holder's attributes together with a blinded link
//! secret, the holder presents any subset of those attributes, range
//! predicates over the hidden ones and a proof that the credential is
//! still in the issuer's revocation accumulator. Presentations from the
//! same credential cannot be linked.
//!
//! The crate is organised along the protocol:
//!
//! - [`schema`] and [`issuer`] for credential definitions, offers and issuance
//! - [`prover`] for link secrets, credential requests and unblinding
//! - [`revocation`] for registries, deltas, tails and witnesses
//! - [`presentation`] for building presentations and [`verifier`] for checking them
#![warn(missing_docs, unused_qualifications)]
#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Credential values and issued credentials
pub mod credential;
/// Attribute encoding
pub mod encoding;
/// Errors produced by this crate
pub mod error;
/// Credential definitions, offers and issuance
pub mod issuer;
/// The cryptographic primitives
pub mod knox;
/// Protocol nonces
pub mod nonce;
/// Presentation requests and proofs
pub mod presentation;
/// Link secrets, credential requests and processing
pub mod prover;
/// Accumulator based revocation registries
pub mod revocation;
/// Credential schemas
pub mod schema;
/// Presentation verification
pub mod verifier;

mod utils;

/// Result type for this crate
pub type CredxResult<T> = Result<T, error::Error>;

/// The most common types
pub mod prelude {
    pub use super::{
        credential::*, encoding::*, error::*, issuer::*, nonce::*, presentation::*, prover::*,
        revocation::*, schema::*, verifier::*, CredxResult,
    };
    pub use blsful::inner_types::Scalar;
    pub use merlin::Transcript;
}
