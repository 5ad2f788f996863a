pub mod config;
pub mod error;
pub mod keywords;
pub mod text;
pub mod types;

pub use config::{Config, StoreProfile};
pub use error::{DigestError, StoreErrorKind};
pub use keywords::sanitize_keyword;
pub use types::{DatePrecision, DigestState, KeywordType};
