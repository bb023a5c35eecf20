mod link_secret;
mod process;
mod request;

pub use link_secret::*;
pub use process::*;
pub use request::*;
