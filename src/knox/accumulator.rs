/// The VB20 positive dynamic accumulator
pub mod vb20;
