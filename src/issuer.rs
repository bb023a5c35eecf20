mod credential_definition;
mod issue;
mod key_correctness_proof;
mod offer;

pub use credential_definition::*;
pub use issue::*;
pub use key_correctness_proof::*;
pub use offer::*;
