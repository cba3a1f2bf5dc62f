use base64::{
    engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD},
    Engine,
};
use serde_json::{Map, Value};

use crate::{
    algorithm::Algorithm,
    error::{RecoverError, Result},
};

/// A decoded JWS compact serialization `header.body.signature`.
#[derive(Clone, Debug)]
pub struct Token {
    header_b64: String,
    body_b64: String,
    header: Map<String, Value>,
    body: Vec<u8>,
    signature: Vec<u8>,
    alg: String,
}

impl Token {
    pub fn decode(raw: &str) -> Result<Self> {
        let segments: Vec<&str> = raw.trim().split('.').collect();
        let [header_b64, body_b64, signature_b64] = segments[..] else {
            return Err(RecoverError::malformed(format!(
                "expected 3 dot-separated segments, found {}",
                segments.len()
            )));
        };

        let header_bytes = decode_segment(header_b64, "header")?;
        let body = decode_segment(body_b64, "body")?;
        let signature = decode_segment(signature_b64, "signature")?;

        let header = match serde_json::from_slice(&header_bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(RecoverError::malformed("header is not a JSON object")),
            Err(e) => {
                return Err(RecoverError::malformed(format!(
                    "header is not valid JSON: {e}"
                )))
            }
        };
        let alg = header
            .get("alg")
            .and_then(Value::as_str)
            .ok_or_else(|| RecoverError::malformed("header has no \"alg\" string field"))?
            .to_owned();

        Ok(Self {
            header_b64: header_b64.to_owned(),
            body_b64: body_b64.to_owned(),
            header,
            body,
            signature,
            alg,
        })
    }

    /// Serializes `header`, `body` and `signature` in compact form, unpadded.
    pub fn encode(header: &Value, body: &[u8], signature: &[u8]) -> String {
        let signing_input = Self::signing_input(header, body);
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// The `header.body` part of a compact serialization, i.e. the bytes a
    /// signer hashes.
    pub fn signing_input(header: &Value, body: &[u8]) -> String {
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(body)
        )
    }

    pub fn alg(&self) -> &str {
        &self.alg
    }

    pub fn algorithm(&self) -> Algorithm {
        Algorithm::parse(&self.alg)
    }

    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Signed bytes, taken verbatim from the received segments.
    pub fn signed_message(&self) -> Vec<u8> {
        let mut message = Vec::with_capacity(self.header_b64.len() + self.body_b64.len() + 1);
        message.extend_from_slice(self.header_b64.as_bytes());
        message.push(b'.');
        message.extend_from_slice(self.body_b64.as_bytes());
        message
    }

    /// Splits a raw `r || s` signature into its two equally sized halves.
    pub fn ecdsa_signature(&self) -> Result<(&[u8], &[u8])> {
        let len = self.signature.len();
        if len == 0 || len % 2 != 0 {
            return Err(RecoverError::malformed(format!(
                "ECDSA signature must hold two equally sized integers, got {len} bytes"
            )));
        }
        Ok(self.signature.split_at(len / 2))
    }
}

/// Decodes a base64url segment, accepting missing padding and the standard
/// alphabet's `+` and `/`.
fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    let mut repaired: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    while repaired.len() % 4 != 0 {
        repaired.push('=');
    }

    URL_SAFE
        .decode(&repaired)
        .map_err(|e| RecoverError::malformed(format!("{name} is not valid base64url: {e}")))
}
