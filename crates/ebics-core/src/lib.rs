pub mod bank;
pub mod constants;
pub mod error;
pub mod return_code;
pub mod types;

pub use bank::{BankKeys, BankPublicKey};
pub use constants::*;
pub use error::EbicsError;
pub use return_code::{OrderStatus, ReturnCode};
pub use types::*;
