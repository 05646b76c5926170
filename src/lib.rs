//! # jsonbind
//!
//! A crate for JSON Schema compilation, validation, coercion and request
//! binding, loosely tracking Draft 2020-12. Schemas compile into an
//! immutable graph of `Schema` nodes, which keeps runtime costs low and
//! makes concurrent validation against one compiled schema safe without
//! locks.
//!
//! Supports:
//!   - compiling schemas once and validating many instances;
//!   - coercing and default-filling instances during unmarshal;
//!   - loading remote documents via HTTP(S);
//!   - binding validated fields out of HTTP-style requests.
//!
//! ## Example:
//!
//! ```rust
//! use jsonbind::Compiler;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = json!({"maxLength": 5});
//!     let instance = json!("foo");
//!     let compiled = Compiler::new().compile_value(&schema)?;
//!     let result = compiled.validate(&instance);
//!     if let Err(errors) = result {
//!         for error in errors {
//!             println!("Validation error: {}", error)
//!         }
//!     }
//!     Ok(())
//! }
//! ```
#![warn(
    clippy::cast_possible_truncation,
    clippy::doc_markdown,
    clippy::explicit_iter_loop,
    clippy::map_unwrap_or,
    clippy::match_same_arms,
    clippy::needless_borrow,
    clippy::print_stdout,
    clippy::redundant_closure,
    clippy::trivially_copy_pass_by_ref,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    variant_size_differences
)]
#![allow(clippy::unnecessary_wraps, clippy::upper_case_acronyms)]
mod canonical;
mod codec;
mod compiler;
mod content;
mod dotpath;
pub mod error;
mod expressions;
mod formats;
mod parsing;
pub mod paths;
mod patterns;
pub mod primitive_type;
mod request;
mod resolver;
mod schema;
mod validation;
mod vocabularies;

pub use codec::{
    marshal, register_schema, registered_schema, reset_codec, reset_registered_schemas,
    set_codec, unmarshal, unmarshal_with_schema, validate, Codec, JsonCodec,
};
pub use compiler::{Compiler, CompilerOptions, Draft, ErrorMode};
pub use error::{
    BindError, CodecError, CompileError, Error, ParseError, ValidationError, ValidationErrorKind,
    ValidationErrors,
};
pub use expressions::{
    register_expression_evaluator, reset_expression_evaluator, ExpressionEvaluator,
};
pub use formats::{register_format, reset_formats, FormatValidator};
pub use parsing::{parse_slice, Parser};
pub use request::{bind_request, unmarshal_and_validate_request, RequestSource};
pub use resolver::reset_remote_cache;
pub use schema::{Discriminator, Schema, Source};
pub use vocabularies::{register_vocabulary, reset_vocabularies, VocabularyValidator};

pub use dotpath::{get, set};

use serde_json::Value;

/// A shortcut for validating `instance` against `schema` through the
/// process-wide compiler.
/// ```rust
/// use jsonbind::is_valid;
/// use serde_json::json;
///
/// let schema = json!({"maxLength": 5});
/// let instance = json!("foo");
/// assert!(is_valid(&schema, &instance));
/// ```
///
/// This function panics if an invalid schema is passed.
#[must_use]
#[inline]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    let compiled = compiler::default_compiler()
        .compile_value(schema)
        .expect("Invalid schema");
    compiled.is_valid(instance)
}

#[cfg(test)]
pub(crate) mod tests_util {
    use crate::Compiler;
    use serde_json::Value;

    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        let compiled = Compiler::new().compile_value(schema).unwrap();
        assert!(
            compiled.is_valid(instance),
            "{} should be valid (via is_valid)",
            instance
        );
        assert!(
            compiled.validate(instance).is_ok(),
            "{} should be valid (via validate)",
            instance
        );
    }

    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        let compiled = Compiler::new().compile_value(schema).unwrap();
        assert!(
            !compiled.is_valid(instance),
            "{} should not be valid (via is_valid)",
            instance
        );
        assert!(
            compiled.validate(instance).is_err(),
            "{} should not be valid (via validate)",
            instance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid;
    use serde_json::json;

    #[test]
    fn test_is_valid() {
        let schema = json!({"minLength": 5});
        let valid = json!("foobar");
        let invalid = json!("foo");
        assert!(is_valid(&schema, &valid));
        assert!(!is_valid(&schema, &invalid));
    }
}
