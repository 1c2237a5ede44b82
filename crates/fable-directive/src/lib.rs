//! Directive handling for Fable: pulls commands out of narrator text and
//! checks them before they reach the game state.
//!
//! ```
//! let parsed = fable_directive::parse("夜色深沉。\n节拍操作：推进\n当前景深等级：3\n");
//! assert_eq!(parsed.prose, "夜色深沉。\n");
//! let checked = fable_directive::validate(&parsed.commands);
//! assert_eq!(checked.valid.len(), 2);
//! assert!(checked.errors.is_empty());
//! ```

/// Raw and validated command types.
pub mod command;
/// Prose/command splitting for both dialects.
pub mod parser;
/// Directive keyword and block action tables.
pub mod rules;
/// Per-kind schema checks.
pub mod validate;

/// Re-export command types.
pub use command::{Command, CommandKind, EntityPatch, ValidCommand};
/// Re-export the parser entry point.
pub use parser::{ParsedTurn, parse};
/// Re-export validation types.
pub use validate::{Validation, ValidationError, validate};
