pub mod error;
pub mod types;
pub mod vocab;

pub use error::{LinkbackError, Result};
pub use types::*;
pub use vocab::Vocabulary;
