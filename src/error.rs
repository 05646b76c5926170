//! Error types
use crate::{
    paths::JSONPointer,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
};
use serde_json::Value;
use std::{
    error, fmt,
    fmt::{Error as FmtError, Formatter},
};

/// The error type produced by the byte-level JSON parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset of the offending input.
    pub position: usize,
    /// A short description of what went wrong.
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            position,
            message: message.into(),
        }
    }
}

impl error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "JSON parse error at byte {}: {}", self.position, self.message)
    }
}

/// The error type that happens when the input schema is not valid.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The schema document itself is not valid JSON.
    Parse(ParseError),
    /// A schema keyword has the wrong structural form.
    SchemaShape {
        /// Slash-joined path of keywords leading to the offender.
        path: String,
        /// The offending keyword.
        keyword: String,
    },
    /// The schema violates a vocabulary it declares as enabled.
    SelfValidation {
        /// Why the schema failed its own rules.
        reason: String,
    },
    /// A `pattern` or `patternProperties` key cannot be compiled.
    Pattern {
        /// The raw pattern text.
        pattern: String,
    },
    /// The non-standard `discriminator` object is malformed.
    Discriminator {
        /// Why the discriminator is rejected.
        reason: String,
    },
    /// Aggregated child failures collected under `ErrorMode::All`.
    Multiple(Vec<CompileError>),
}

impl error::Error for CompileError {}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            CompileError::Parse(error) => write!(f, "{}", error),
            CompileError::SchemaShape { path, keyword } => {
                if path.is_empty() {
                    write!(f, "invalid schema: malformed '{}'", keyword)
                } else {
                    write!(f, "invalid schema at {}: malformed '{}'", path, keyword)
                }
            }
            CompileError::SelfValidation { reason } => {
                write!(f, "schema failed self-validation: {}", reason)
            }
            CompileError::Pattern { pattern } => write!(f, "invalid pattern: '{}'", pattern),
            CompileError::Discriminator { reason } => {
                write!(f, "invalid discriminator: {}", reason)
            }
            CompileError::Multiple(errors) => {
                let mut first = true;
                for error in errors {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    write!(f, "{}", error)?;
                }
                Ok(())
            }
        }
    }
}

impl From<ParseError> for CompileError {
    #[inline]
    fn from(error: ParseError) -> Self {
        CompileError::Parse(error)
    }
}

/// An error that can occur during validation.
#[derive(Debug)]
pub struct ValidationError {
    /// Path to the value that failed validation.
    pub instance_path: JSONPointer,
    /// Value of the property that failed validation.
    pub instance: Value,
    /// Type of validation error.
    pub kind: ValidationErrorKind,
}

/// Kinds of errors that may happen during validation
#[derive(Debug)]
#[allow(missing_docs)]
pub enum ValidationErrorKind {
    /// Unexpected properties.
    AdditionalProperties { unexpected: Vec<String> },
    /// The input value is not valid under any of the given schemas.
    AnyOf,
    /// Everything is invalid for `false` schema.
    BooleanFalse,
    /// The value cannot be coerced to the declared type.
    Coercion { target: PrimitiveType },
    /// The input value doesn't match expected constant.
    Constant { expected: Value },
    /// The input array doesn't contain items conforming to the specified schema.
    Contains,
    /// The input value does not respect the defined `contentEncoding`.
    ContentEncoding { content_encoding: String },
    /// The input value does not respect the defined `contentMediaType`.
    ContentMediaType { content_media_type: String },
    /// The discriminator property selects no `oneOf` candidate.
    Discriminator { value: String },
    /// The input value doesn't match any of specified options.
    Enum { options: Value },
    /// Value is too large.
    ExclusiveMaximum { limit: f64 },
    /// Value is too small.
    ExclusiveMinimum { limit: f64 },
    /// When the input doesn't match to the specified format.
    Format { format: String },
    /// Too few array items matched `contains`.
    MinContains { limit: u64 },
    /// Too many array items matched `contains`.
    MaxContains { limit: u64 },
    /// Too many items in an array.
    MaxItems { limit: u64 },
    /// Value is too large.
    Maximum { limit: f64 },
    /// String is too long.
    MaxLength { limit: u64 },
    /// Too many properties in an object.
    MaxProperties { limit: u64 },
    /// Too few items in an array.
    MinItems { limit: u64 },
    /// Value is too small.
    Minimum { limit: f64 },
    /// String is too short.
    MinLength { limit: u64 },
    /// Not enough properties in an object.
    MinProperties { limit: u64 },
    /// When some number is not a multiple of another number.
    MultipleOf { multiple_of: f64 },
    /// Negated schema failed validation.
    Not { schema: Value },
    /// The given value is valid under more than one of the given schemas.
    OneOfMultipleValid {
        /// Indexes of the candidates that validated.
        valid: Vec<usize>,
    },
    /// The given value is not valid under any of the given schemas.
    OneOfNotValid,
    /// When the input doesn't match to a pattern.
    Pattern { pattern: String },
    /// A reference cannot be resolved.
    RefResolution { reference: String },
    /// A remote schema is unreachable.
    RemoteFetch { url: String, message: String },
    /// When a required property is missing.
    Required { property: String },
    /// A resolved schema failed to compile.
    Schema { message: String },
    /// The input value matches no candidate type.
    TypeMismatch {
        candidates: PrimitiveTypesBitMap,
        actual: PrimitiveType,
        sub_errors: Vec<(PrimitiveType, Vec<ValidationError>)>,
    },
    /// Properties left unevaluated where `unevaluatedProperties` forbids them.
    UnevaluatedProperties { unexpected: Vec<String> },
    /// When the input array has non-unique elements.
    UniqueItems,
}

impl ValidationErrorKind {
    /// The schema keyword this error kind reports on.
    pub fn keyword(&self) -> &'static str {
        match self {
            ValidationErrorKind::AdditionalProperties { .. } => "additionalProperties",
            ValidationErrorKind::AnyOf => "anyOf",
            ValidationErrorKind::BooleanFalse => "false",
            ValidationErrorKind::Coercion { .. } => "type",
            ValidationErrorKind::Constant { .. } => "const",
            ValidationErrorKind::Contains => "contains",
            ValidationErrorKind::ContentEncoding { .. } => "contentEncoding",
            ValidationErrorKind::ContentMediaType { .. } => "contentMediaType",
            ValidationErrorKind::Discriminator { .. } => "discriminator",
            ValidationErrorKind::Enum { .. } => "enum",
            ValidationErrorKind::ExclusiveMaximum { .. } => "exclusiveMaximum",
            ValidationErrorKind::ExclusiveMinimum { .. } => "exclusiveMinimum",
            ValidationErrorKind::Format { .. } => "format",
            ValidationErrorKind::MinContains { .. } => "minContains",
            ValidationErrorKind::MaxContains { .. } => "maxContains",
            ValidationErrorKind::MaxItems { .. } => "maxItems",
            ValidationErrorKind::Maximum { .. } => "maximum",
            ValidationErrorKind::MaxLength { .. } => "maxLength",
            ValidationErrorKind::MaxProperties { .. } => "maxProperties",
            ValidationErrorKind::MinItems { .. } => "minItems",
            ValidationErrorKind::Minimum { .. } => "minimum",
            ValidationErrorKind::MinLength { .. } => "minLength",
            ValidationErrorKind::MinProperties { .. } => "minProperties",
            ValidationErrorKind::MultipleOf { .. } => "multipleOf",
            ValidationErrorKind::Not { .. } => "not",
            ValidationErrorKind::OneOfMultipleValid { .. } => "oneOf",
            ValidationErrorKind::OneOfNotValid => "oneOf",
            ValidationErrorKind::Pattern { .. } => "pattern",
            ValidationErrorKind::RefResolution { .. } => "$ref",
            ValidationErrorKind::RemoteFetch { .. } => "$ref",
            ValidationErrorKind::Required { .. } => "required",
            ValidationErrorKind::Schema { .. } => "$ref",
            ValidationErrorKind::TypeMismatch { .. } => "type",
            ValidationErrorKind::UnevaluatedProperties { .. } => "unevaluatedProperties",
            ValidationErrorKind::UniqueItems => "uniqueItems",
        }
    }
}

/// Shortcuts for creation of specific error kinds.
impl ValidationError {
    fn new(instance_path: JSONPointer, instance: &Value, kind: ValidationErrorKind) -> Self {
        ValidationError {
            instance_path,
            instance: instance.clone(),
            kind,
        }
    }

    pub(crate) fn additional_properties(
        instance_path: JSONPointer,
        instance: &Value,
        unexpected: Vec<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::AdditionalProperties { unexpected },
        )
    }
    pub(crate) fn any_of(instance_path: JSONPointer, instance: &Value) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::AnyOf)
    }
    pub(crate) fn boolean_false(instance_path: JSONPointer, instance: &Value) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::BooleanFalse)
    }
    pub(crate) fn coercion(
        instance_path: JSONPointer,
        instance: &Value,
        target: PrimitiveType,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::Coercion { target })
    }
    pub(crate) fn constant(
        instance_path: JSONPointer,
        instance: &Value,
        expected: &Value,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Constant {
                expected: expected.clone(),
            },
        )
    }
    pub(crate) fn contains(instance_path: JSONPointer, instance: &Value) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::Contains)
    }
    pub(crate) fn content_encoding(
        instance_path: JSONPointer,
        instance: &Value,
        encoding: &str,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::ContentEncoding {
                content_encoding: encoding.to_string(),
            },
        )
    }
    pub(crate) fn content_media_type(
        instance_path: JSONPointer,
        instance: &Value,
        media_type: &str,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::ContentMediaType {
                content_media_type: media_type.to_string(),
            },
        )
    }
    pub(crate) fn discriminator(
        instance_path: JSONPointer,
        instance: &Value,
        value: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Discriminator { value: value.into() },
        )
    }
    pub(crate) fn enumeration(
        instance_path: JSONPointer,
        instance: &Value,
        options: &Value,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Enum {
                options: options.clone(),
            },
        )
    }
    pub(crate) fn exclusive_maximum(
        instance_path: JSONPointer,
        instance: &Value,
        limit: f64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::ExclusiveMaximum { limit })
    }
    pub(crate) fn exclusive_minimum(
        instance_path: JSONPointer,
        instance: &Value,
        limit: f64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::ExclusiveMinimum { limit })
    }
    pub(crate) fn format(
        instance_path: JSONPointer,
        instance: &Value,
        format: &str,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Format {
                format: format.to_string(),
            },
        )
    }
    pub(crate) fn min_contains(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MinContains { limit })
    }
    pub(crate) fn max_contains(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MaxContains { limit })
    }
    pub(crate) fn max_items(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MaxItems { limit })
    }
    pub(crate) fn maximum(
        instance_path: JSONPointer,
        instance: &Value,
        limit: f64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::Maximum { limit })
    }
    pub(crate) fn max_length(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MaxLength { limit })
    }
    pub(crate) fn max_properties(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MaxProperties { limit })
    }
    pub(crate) fn min_items(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MinItems { limit })
    }
    pub(crate) fn minimum(
        instance_path: JSONPointer,
        instance: &Value,
        limit: f64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::Minimum { limit })
    }
    pub(crate) fn min_length(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MinLength { limit })
    }
    pub(crate) fn min_properties(
        instance_path: JSONPointer,
        instance: &Value,
        limit: u64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MinProperties { limit })
    }
    pub(crate) fn multiple_of(
        instance_path: JSONPointer,
        instance: &Value,
        multiple_of: f64,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::MultipleOf { multiple_of })
    }
    pub(crate) fn not(
        instance_path: JSONPointer,
        instance: &Value,
        schema: Value,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::Not { schema })
    }
    pub(crate) fn one_of_multiple_valid(
        instance_path: JSONPointer,
        instance: &Value,
        valid: Vec<usize>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::OneOfMultipleValid { valid },
        )
    }
    pub(crate) fn one_of_not_valid(
        instance_path: JSONPointer,
        instance: &Value,
    ) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::OneOfNotValid)
    }
    pub(crate) fn pattern(
        instance_path: JSONPointer,
        instance: &Value,
        pattern: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Pattern {
                pattern: pattern.into(),
            },
        )
    }
    pub(crate) fn ref_resolution(
        instance_path: JSONPointer,
        instance: &Value,
        reference: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::RefResolution {
                reference: reference.into(),
            },
        )
    }
    pub(crate) fn remote_fetch(
        instance_path: JSONPointer,
        instance: &Value,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::RemoteFetch {
                url: url.into(),
                message: message.into(),
            },
        )
    }
    pub(crate) fn required(
        instance_path: JSONPointer,
        instance: &Value,
        property: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Required {
                property: property.into(),
            },
        )
    }
    pub(crate) fn schema(
        instance_path: JSONPointer,
        instance: &Value,
        message: impl Into<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::Schema {
                message: message.into(),
            },
        )
    }
    pub(crate) fn type_mismatch(
        instance_path: JSONPointer,
        instance: &Value,
        candidates: PrimitiveTypesBitMap,
        actual: PrimitiveType,
        sub_errors: Vec<(PrimitiveType, Vec<ValidationError>)>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::TypeMismatch {
                candidates,
                actual,
                sub_errors,
            },
        )
    }
    pub(crate) fn unevaluated_properties(
        instance_path: JSONPointer,
        instance: &Value,
        unexpected: Vec<String>,
    ) -> ValidationError {
        Self::new(
            instance_path,
            instance,
            ValidationErrorKind::UnevaluatedProperties { unexpected },
        )
    }
    pub(crate) fn unique_items(instance_path: JSONPointer, instance: &Value) -> ValidationError {
        Self::new(instance_path, instance, ValidationErrorKind::UniqueItems)
    }
}

impl error::Error for ValidationError {}

/// Textual representation of various validation errors.
impl fmt::Display for ValidationError {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => write!(
                f,
                "Additional properties are not allowed ({} {} unexpected)",
                unexpected
                    .iter()
                    .map(|property| format!("'{}'", property))
                    .collect::<Vec<String>>()
                    .join(", "),
                if unexpected.len() == 1 { "was" } else { "were" }
            ),
            ValidationErrorKind::AnyOf => write!(
                f,
                "'{}' is not valid under any of the given schemas",
                self.instance
            ),
            ValidationErrorKind::BooleanFalse => {
                write!(f, "False schema does not allow '{}'", self.instance)
            }
            ValidationErrorKind::Coercion { target } => {
                write!(f, "'{}' cannot be coerced to '{}'", self.instance, target)
            }
            ValidationErrorKind::Constant { expected } => {
                write!(f, "'{}' was expected", expected)
            }
            ValidationErrorKind::Contains => {
                write!(f, "None of '{}' are valid under the given schema", self.instance)
            }
            ValidationErrorKind::ContentEncoding { content_encoding } => {
                write!(f, "'{}' is not encoded as '{}'", self.instance, content_encoding)
            }
            ValidationErrorKind::ContentMediaType { content_media_type } => {
                write!(f, "'{}' is not '{}' content", self.instance, content_media_type)
            }
            ValidationErrorKind::Discriminator { value } => write!(
                f,
                "discriminator value '{}' does not match any candidate",
                value
            ),
            ValidationErrorKind::Enum { options } => {
                write!(f, "'{}' is not one of '{}'", self.instance, options)
            }
            ValidationErrorKind::ExclusiveMaximum { limit } => write!(
                f,
                "{} is greater than or equal to the maximum of {}",
                self.instance, limit
            ),
            ValidationErrorKind::ExclusiveMinimum { limit } => write!(
                f,
                "{} is less than or equal to the minimum of {}",
                self.instance, limit
            ),
            ValidationErrorKind::Format { format } => {
                write!(f, "'{}' is not a '{}'", self.instance, format)
            }
            ValidationErrorKind::MinContains { limit } => write!(
                f,
                "'{}' contains fewer than {} matching items",
                self.instance, limit
            ),
            ValidationErrorKind::MaxContains { limit } => write!(
                f,
                "'{}' contains more than {} matching items",
                self.instance, limit
            ),
            ValidationErrorKind::MaxItems { limit } => {
                write!(f, "{} has more than {} items", self.instance, limit)
            }
            ValidationErrorKind::Maximum { limit } => {
                write!(f, "{} is greater than the maximum of {}", self.instance, limit)
            }
            ValidationErrorKind::MaxLength { limit } => {
                write!(f, "'{}' is longer than {} characters", self.instance, limit)
            }
            ValidationErrorKind::MaxProperties { limit } => {
                write!(f, "{} has more than {} properties", self.instance, limit)
            }
            ValidationErrorKind::MinItems { limit } => {
                write!(f, "{} has less than {} items", self.instance, limit)
            }
            ValidationErrorKind::Minimum { limit } => {
                write!(f, "{} is less than the minimum of {}", self.instance, limit)
            }
            ValidationErrorKind::MinLength { limit } => {
                write!(f, "'{}' is shorter than {} characters", self.instance, limit)
            }
            ValidationErrorKind::MinProperties { limit } => {
                write!(f, "{} has less than {} properties", self.instance, limit)
            }
            ValidationErrorKind::MultipleOf { multiple_of } => {
                write!(f, "{} is not a multiple of {}", self.instance, multiple_of)
            }
            ValidationErrorKind::Not { schema } => {
                write!(f, "{} is not allowed for {}", schema, self.instance)
            }
            ValidationErrorKind::OneOfMultipleValid { valid } => write!(
                f,
                "'{}' is valid under more than one of the given schemas (candidates {:?})",
                self.instance, valid
            ),
            ValidationErrorKind::OneOfNotValid => write!(
                f,
                "'{}' is not valid under any of the given schemas",
                self.instance
            ),
            ValidationErrorKind::Pattern { pattern } => {
                write!(f, "'{}' does not match '{}'", self.instance, pattern)
            }
            ValidationErrorKind::RefResolution { reference } => {
                write!(f, "Invalid reference: {}", reference)
            }
            ValidationErrorKind::RemoteFetch { url, message } => {
                write!(f, "Failed to fetch '{}': {}", url, message)
            }
            ValidationErrorKind::Required { property } => {
                write!(f, "'{}' is a required property", property)
            }
            ValidationErrorKind::Schema { message } => write!(f, "Schema error: {}", message),
            ValidationErrorKind::TypeMismatch {
                candidates, actual, ..
            } => {
                if candidates.len() == 1 {
                    write!(f, "'{}' is not of type '{}'", self.instance, candidates)
                } else {
                    write!(
                        f,
                        "'{}' of type '{}' is not of types '{}'",
                        self.instance, actual, candidates
                    )
                }
            }
            ValidationErrorKind::UnevaluatedProperties { unexpected } => write!(
                f,
                "Unevaluated properties are not allowed ({} {} unexpected)",
                unexpected
                    .iter()
                    .map(|property| format!("'{}'", property))
                    .collect::<Vec<String>>()
                    .join(", "),
                if unexpected.len() == 1 { "was" } else { "were" }
            ),
            ValidationErrorKind::UniqueItems => {
                write!(f, "'{}' has non-unique elements", self.instance)
            }
        }
    }
}

/// All violations collected for one instance, in traversal order.
#[derive(Debug, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Number of collected violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no violation was collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the collected violations.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl error::Error for ValidationErrors {}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            if error.instance_path.is_empty() {
                write!(f, "{}", error)?;
            } else {
                write!(f, "{}: {}", error.instance_path, error)?;
            }
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An error produced by the codec indirection.
#[derive(Debug)]
pub struct CodecError {
    /// A short description of the codec failure.
    pub message: String,
}

impl error::Error for CodecError {}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "codec error: {}", self.message)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(error: serde_json::Error) -> Self {
        CodecError {
            message: error.to_string(),
        }
    }
}

/// The unified error type returned by the crate-level free functions.
#[derive(Debug)]
pub enum Error {
    /// Malformed JSON input.
    Parse(ParseError),
    /// The schema could not be compiled.
    Compile(CompileError),
    /// The instance violated the schema.
    Validation(ValidationErrors),
    /// Marshalling or unmarshalling through the codec failed.
    Codec(CodecError),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(error) => write!(f, "{}", error),
            Error::Compile(error) => write!(f, "{}", error),
            Error::Validation(errors) => write!(f, "{}", errors),
            Error::Codec(error) => write!(f, "{}", error),
        }
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::Parse(error)
    }
}
impl From<CompileError> for Error {
    fn from(error: CompileError) -> Self {
        Error::Compile(error)
    }
}
impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        Error::Codec(error)
    }
}

/// An error produced while binding a request to a destination value.
#[derive(Debug)]
pub enum BindError {
    /// A non-body source was requested but the field is missing everywhere.
    Extraction {
        /// The sources that were tried, comma-joined.
        source: String,
        /// The property that could not be filled.
        field: String,
    },
    /// The body or an extracted fragment is not valid JSON.
    Parse(ParseError),
    /// The schema could not be compiled.
    Compile(CompileError),
    /// The assembled instance failed validation.
    Validation(ValidationErrors),
    /// Marshalling the merged output failed.
    Codec(CodecError),
}

impl error::Error for BindError {}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BindError::Extraction { source, field } => {
                write!(f, "no value for '{}' in source(s) '{}'", field, source)
            }
            BindError::Parse(error) => write!(f, "{}", error),
            BindError::Compile(error) => write!(f, "{}", error),
            BindError::Validation(errors) => write!(f, "{}", errors),
            BindError::Codec(error) => write!(f, "{}", error),
        }
    }
}

impl From<ParseError> for BindError {
    fn from(error: ParseError) -> Self {
        BindError::Parse(error)
    }
}
impl From<CompileError> for BindError {
    fn from(error: CompileError) -> Self {
        BindError::Compile(error)
    }
}
impl From<ValidationErrors> for BindError {
    fn from(errors: ValidationErrors) -> Self {
        BindError::Validation(errors)
    }
}
impl From<CodecError> for BindError {
    fn from(error: CodecError) -> Self {
        BindError::Codec(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_error_display() {
        let instance = json!(42);
        let error = ValidationError::type_mismatch(
            JSONPointer::default(),
            &instance,
            PrimitiveTypesBitMap::new().add_type(PrimitiveType::String),
            PrimitiveType::Integer,
            vec![],
        );
        assert_eq!(error.to_string(), "'42' is not of type 'string'");
    }

    #[test]
    fn additional_properties_display() {
        let instance = json!({"a": "x", "b": 1});
        let error = ValidationError::additional_properties(
            JSONPointer::default(),
            &instance,
            vec!["b".to_string()],
        );
        assert_eq!(
            error.to_string(),
            "Additional properties are not allowed ('b' was unexpected)"
        );
    }

    #[test]
    fn errors_display_includes_path() {
        let instance = json!(35000);
        let error = ValidationError::minimum(
            JSONPointer::from(&["employmentDetails", "salary"][..]),
            &instance,
            40000.0,
        );
        let errors = ValidationErrors(vec![error]);
        assert_eq!(
            errors.to_string(),
            "/employmentDetails/salary: 35000 is less than the minimum of 40000"
        );
    }
}
