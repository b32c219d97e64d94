//! Shared types for the M (Power Query) incremental-parsing core:
//! positions/ranges, the token vocabulary, the error taxonomy,
//! cancellation, and the `Settings`/`LocalizationTemplates` collaborators.

pub mod cancellation;
pub mod error;
pub mod position;
pub mod settings;
pub mod token;

pub use cancellation::{CancellationToken, FlagCancellationToken, NeverCancelled};
pub use error::{CommonError, ParseError};
pub use position::{Position, TokenRange};
pub use settings::{LocalizationTemplates, Settings};
pub use token::{keyword_from_str, KeywordKind, PrimitiveTypeConstantKind, Token, TokenKind};
