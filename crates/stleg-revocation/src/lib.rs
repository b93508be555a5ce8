mod bloom_crl;
mod error;
mod store;

pub use bloom_crl::{BloomCrl, BloomCrlConfig, RevocationStats};
pub use error::RevocationError;
pub use store::RevocationRecord;
