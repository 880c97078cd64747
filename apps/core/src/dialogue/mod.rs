//! # Dialogue Module
//!
//! - `selection`: numbered options, ordinal parsing, commit
//! - `responder`: intent → reply routing

pub mod responder;
pub mod selection;

pub use responder::ResponseGenerator;
pub use selection::{handle_selection, offer_options, parse_ordinal};
