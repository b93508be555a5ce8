mod error;
mod jws;
mod key_directory;
mod timing;
mod verifier;

pub use error::CryptoError;
pub use jws::{Header, ParsedToken};
pub use key_directory::{KeyDirectory, KeyDirectorySource, KeyEntry, KeyStatus};
pub use timing::normalize as normalize_timing;
pub use verifier::TokenVerifier;
