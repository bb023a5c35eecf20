use std::fmt::{self, Display, Formatter};

/// Errors created by this library
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Bad credential schema: empty, duplicated or reserved attribute names
    InvalidSchema,
    /// Malformed input that does not fit the operation
    InvalidInput(String),
    /// A requested referent has no credential assigned to it
    UnsatisfiedReferent(String),
    /// The presentation does not line up with its request
    InvalidPresentationData(String),
    /// The blinded link secret correctness proof failed
    RequestProofInvalid,
    /// The issued signature does not verify after unblinding
    SignatureInvalid,
    /// The credential definition key correctness proof failed
    KeyCorrectnessProofInvalid,
    /// Invalid signing operation
    InvalidSigningOperation,
    /// Proof data has the wrong shape
    InvalidProofData,
    /// The blind signature context is inconsistent with the key
    InvalidSignatureProofData,
    /// A protocol step was fed data from a different session
    ProtocolSequencing(String),
    /// No free index is left in the revocation registry
    RegistryFull,
    /// The index has already been revoked
    IndexAlreadyRevoked(u32),
    /// The index has already been issued
    IndexAlreadyIssued(u32),
    /// The index was never issued
    IndexNotIssued(u32),
    /// The index is outside the registry capacity
    InvalidRevocationIndex(u32),
    /// Registry deltas were applied or merged out of order
    DeltaOutOfOrder,
    /// The credential's index has been removed from the accumulator
    CredentialRevoked,
    /// Accumulator arithmetic failed
    InvalidAccumulator(&'static str),
    /// The tails data is missing or corrupt
    InvalidTails(String),
    /// The value cannot be represented in the required numeric encoding
    EncodingError(String),
    /// A persisted document could not be (de)serialized
    SerializationError(String),
    /// General purpose errors
    General(&'static str),
}

/// The broad category of an [`Error`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or inconsistent input
    InvalidInput,
    /// A cryptographic proof or signature failed
    ProofInvalid,
    /// Revocation registry bookkeeping was violated
    RegistryStateError,
    /// A value is not representable in the numeric encoding
    EncodingError,
    /// A document could not be (de)serialized
    SerializationError,
    /// Data from different protocol sessions was mixed
    ProtocolSequencing,
}

impl Error {
    /// The category this error falls under
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSchema
            | Self::InvalidInput(_)
            | Self::UnsatisfiedReferent(_)
            | Self::InvalidPresentationData(_)
            | Self::InvalidSigningOperation
            | Self::InvalidTails(_)
            | Self::General(_) => ErrorKind::InvalidInput,
            Self::RequestProofInvalid
            | Self::SignatureInvalid
            | Self::KeyCorrectnessProofInvalid
            | Self::InvalidProofData
            | Self::InvalidSignatureProofData
            | Self::InvalidAccumulator(_) => ErrorKind::ProofInvalid,
            Self::RegistryFull
            | Self::IndexAlreadyRevoked(_)
            | Self::IndexAlreadyIssued(_)
            | Self::IndexNotIssued(_)
            | Self::InvalidRevocationIndex(_)
            | Self::DeltaOutOfOrder
            | Self::CredentialRevoked => ErrorKind::RegistryStateError,
            Self::EncodingError(_) => ErrorKind::EncodingError,
            Self::SerializationError(_) => ErrorKind::SerializationError,
            Self::ProtocolSequencing(_) => ErrorKind::ProtocolSequencing,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSchema => write!(f, "invalid credential schema"),
            Self::InvalidInput(s) => write!(f, "invalid input: {}", s),
            Self::UnsatisfiedReferent(r) => write!(f, "no credential satisfies referent '{}'", r),
            Self::InvalidPresentationData(s) => write!(f, "invalid presentation data: {}", s),
            Self::RequestProofInvalid => write!(f, "credential request proof is invalid"),
            Self::SignatureInvalid => write!(f, "credential signature is invalid"),
            Self::KeyCorrectnessProofInvalid => write!(f, "key correctness proof is invalid"),
            Self::InvalidSigningOperation => write!(f, "invalid signing operation"),
            Self::InvalidProofData => write!(f, "invalid proof data"),
            Self::InvalidSignatureProofData => write!(f, "invalid signature proof data"),
            Self::ProtocolSequencing(s) => write!(f, "protocol sequencing error: {}", s),
            Self::RegistryFull => write!(f, "revocation registry is full"),
            Self::IndexAlreadyRevoked(i) => write!(f, "index {} is already revoked", i),
            Self::IndexAlreadyIssued(i) => write!(f, "index {} is already issued", i),
            Self::IndexNotIssued(i) => write!(f, "index {} was never issued", i),
            Self::InvalidRevocationIndex(i) => write!(f, "index {} is out of range", i),
            Self::DeltaOutOfOrder => write!(f, "revocation registry deltas are out of order"),
            Self::CredentialRevoked => write!(f, "credential has been revoked"),
            Self::InvalidAccumulator(s) => write!(f, "accumulator error: {}", s),
            Self::InvalidTails(s) => write!(f, "invalid tails: {}", s),
            Self::EncodingError(s) => write!(f, "encoding error: {}", s),
            Self::SerializationError(s) => write!(f, "serialization error: {}", s),
            Self::General(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}
