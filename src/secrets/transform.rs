//! Content transformation
//!
//! Turns the raw payload of a secret version into file contents: optional
//! base64 decoding followed by optional extraction of one key from a JSON or
//! YAML document. Without either, the payload is written unchanged.

use super::error::TransformError;
use crate::domain::{ContentEncoding, KeyExtraction};
use base64::Engine;
use zeroize::Zeroizing;

/// Apply the declared transformations to `payload`
pub fn transform_payload(
    payload: Zeroizing<Vec<u8>>,
    encoding: Option<ContentEncoding>,
    extraction: Option<&KeyExtraction>,
) -> Result<Vec<u8>, TransformError> {
    let decoded = match encoding {
        Some(ContentEncoding::Base64) => decode_base64(&payload)?,
        None => payload,
    };

    match extraction {
        Some(KeyExtraction::Json(key)) => extract_json_key(&decoded, key),
        Some(KeyExtraction::Yaml(key)) => extract_yaml_key(&decoded, key),
        None => Ok(decoded.to_vec()),
    }
}

/// Standard-alphabet, padded base64; ASCII whitespace (line wrapping, a
/// trailing newline) is ignored
pub fn decode_base64(payload: &[u8]) -> Result<Zeroizing<Vec<u8>>, TransformError> {
    let compact: Zeroizing<Vec<u8>> =
        Zeroizing::new(payload.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect());
    let decoded = base64::engine::general_purpose::STANDARD.decode(compact.as_slice())?;
    Ok(Zeroizing::new(decoded))
}

/// Value of a top-level key of a JSON object; strings are written without
/// quotes, numbers and booleans as their JSON text
pub fn extract_json_key(payload: &[u8], key: &str) -> Result<Vec<u8>, TransformError> {
    let document: serde_json::Value = serde_json::from_slice(payload)?;
    let missing = || TransformError::MissingKey { key: key.to_string(), format: "JSON" };

    match document.as_object().ok_or_else(missing)?.get(key) {
        None | Some(serde_json::Value::Null) => Err(missing()),
        Some(serde_json::Value::String(s)) => Ok(s.as_bytes().to_vec()),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => {
            Ok(v.to_string().into_bytes())
        }
        Some(_) => Err(TransformError::NotScalar { key: key.to_string(), format: "JSON" }),
    }
}

/// Value of a top-level key of a YAML mapping, same rendering rules as JSON
pub fn extract_yaml_key(payload: &[u8], key: &str) -> Result<Vec<u8>, TransformError> {
    let document: serde_yaml::Value = serde_yaml::from_slice(payload)?;
    let missing = || TransformError::MissingKey { key: key.to_string(), format: "YAML" };

    if !document.is_mapping() {
        return Err(missing());
    }
    match document.get(key) {
        None | Some(serde_yaml::Value::Null) => Err(missing()),
        Some(serde_yaml::Value::String(s)) => Ok(s.as_bytes().to_vec()),
        Some(serde_yaml::Value::Number(n)) => Ok(n.to_string().into_bytes()),
        Some(serde_yaml::Value::Bool(b)) => Ok(b.to_string().into_bytes()),
        Some(_) => Err(TransformError::NotScalar { key: key.to_string(), format: "YAML" }),
    }
}
