//! Transfer requests and their validation
//!
//! Nothing reaches the event publisher without passing [`validate_transfer`].

pub mod types;
pub mod validation;

pub use types::{RawTransferRequest, TransferRequest};
pub use validation::{CURRENCY_CODE_LEN, FieldViolation, ValidationErrors, validate_transfer};
