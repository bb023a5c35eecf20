use blsful::inner_types::Scalar;

/// How a hidden message is blinded inside a proof
#[derive(Copy, Clone, Debug)]
pub enum HiddenMessage {
    /// The message is only used in this proof so a fresh
    /// blinding factor is generated for it
    ProofSpecificBlinding(Scalar),
    /// The message is shared with another proof (an equality,
    /// range or membership proof) so the caller supplies the
    /// blinding factor that links them
    ExternalBlinding(Scalar, Scalar),
}
