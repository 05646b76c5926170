//! The codec indirection and the crate-level marshal/unmarshal surface.
//!
//! A process-wide `Codec` turns parsed values into bytes and back; the
//! default uses `serde_json`. Callers may swap it at startup. The free
//! functions mirror the standard-library-style signatures: `marshal`
//! serialises anything `Serialize`, `unmarshal` decodes into a
//! destination, optionally validating and coercing through a schema first.
use crate::{
    compiler::default_compiler,
    error::{CodecError, Error},
    parsing,
    schema::Schema,
};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::any::TypeId;
use std::sync::Arc;

/// Encodes parsed values to bytes and decodes bytes to parsed values.
pub trait Codec: Send + Sync {
    /// Serialise `value` into bytes.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;
    /// Parse `data` into a value.
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;
}

/// The default codec backed by `serde_json`.
#[derive(Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::from)
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(data).map_err(CodecError::from)
    }
}

static CODEC: Lazy<RwLock<Arc<dyn Codec>>> = Lazy::new(|| RwLock::new(Arc::new(JsonCodec)));

/// Replace the process-wide codec. Meant to be called once at startup.
pub fn set_codec(codec: Arc<dyn Codec>) {
    *CODEC.write() = codec;
}

/// Restore the default `serde_json` codec. For tests.
pub fn reset_codec() {
    *CODEC.write() = Arc::new(JsonCodec);
}

pub(crate) fn encode_value(value: &Value) -> Result<Vec<u8>, CodecError> {
    let codec = Arc::clone(&*CODEC.read());
    codec.encode(value)
}

pub(crate) fn decode_value(data: &[u8]) -> Result<Value, CodecError> {
    let codec = Arc::clone(&*CODEC.read());
    codec.decode(data)
}

/// Serialise `value` through the codec indirection.
pub fn marshal<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    let value = serde_json::to_value(value).map_err(CodecError::from)?;
    Ok(encode_value(&value)?)
}

/// Decode `data` into `destination`. When a schema was registered for `T`
/// through [`register_schema`], the instance is validated and coerced
/// through it first; otherwise this is a pure decode.
pub fn unmarshal<T>(data: &[u8], destination: &mut T) -> Result<(), Error>
where
    T: DeserializeOwned + 'static,
{
    if let Some(schema) = registered_schema::<T>() {
        return unmarshal_merged(data, destination, &schema);
    }
    let value = decode_value(data)?;
    *destination = serde_json::from_value(value).map_err(CodecError::from)?;
    Ok(())
}

/// Compile `schema` on the fly, validate and coerce `data` against it and
/// write the merged value into `destination`.
pub fn unmarshal_with_schema<T>(
    data: &[u8],
    destination: &mut T,
    schema: &[u8],
) -> Result<(), Error>
where
    T: DeserializeOwned,
{
    let compiled = default_compiler().compile(schema)?;
    unmarshal_merged(data, destination, &compiled)
}

fn unmarshal_merged<T>(data: &[u8], destination: &mut T, schema: &Schema) -> Result<(), Error>
where
    T: DeserializeOwned,
{
    let instance = parsing::parse_slice(data)?;
    let merged = schema.smart_unmarshal(&instance)?;
    *destination = serde_json::from_value(merged).map_err(CodecError::from)?;
    Ok(())
}

/// Validate raw `instance` bytes against raw `schema` bytes.
pub fn validate(instance: &[u8], schema: &[u8]) -> Result<(), Error> {
    let compiled = default_compiler().compile(schema)?;
    let value = parsing::parse_slice(instance)?;
    compiled.validate(&value)?;
    Ok(())
}

static TYPE_SCHEMAS: Lazy<RwLock<AHashMap<TypeId, Schema>>> =
    Lazy::new(|| RwLock::new(AHashMap::new()));

/// Associate a schema with the Rust type `T`. Subsequent [`unmarshal`]
/// calls for `T` validate and coerce through it. Additive; a later
/// registration replaces the earlier one.
pub fn register_schema<T: 'static>(schema: &[u8]) -> Result<(), Error> {
    let compiled = default_compiler().compile(schema)?;
    TYPE_SCHEMAS.write().insert(TypeId::of::<T>(), compiled);
    Ok(())
}

/// The schema registered for `T`, when there is one.
pub fn registered_schema<T: 'static>() -> Option<Schema> {
    TYPE_SCHEMAS.read().get(&TypeId::of::<T>()).cloned()
}

/// Drop every type-keyed schema registration. For tests.
pub fn reset_registered_schemas() {
    TYPE_SCHEMAS.write().clear();
}
