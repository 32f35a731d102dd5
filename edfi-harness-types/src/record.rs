use serde_json::Value as Json;
use std::{fmt::Display, str::Utf8Error};
pub use time::OffsetDateTime as Timestamp;

use crate::DecodeErr;

/// Position of a record in the order of arrival, starting from zero per subscription.
pub type SeqNo = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// The opaque content of a record. Being `Text` means the data is UTF-8 valid.
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
}

/// Common interface of byte containers.
pub trait Buffer {
    fn size(&self) -> usize;

    fn into_bytes(self) -> Vec<u8>;

    fn as_bytes(&self) -> &[u8];

    fn as_str(&self) -> Result<&str, Utf8Error>;
}

#[derive(Debug, Clone, PartialEq)]
/// A fixed-arity tuple as returned by the query engine.
pub struct Row(Vec<Json>);

#[derive(Debug, Clone, PartialEq, Eq)]
/// One record delivered by a source. It has no identity beyond its arrival order.
pub struct RawRecord {
    sequence: SeqNo,
    timestamp: Timestamp,
    payload: Payload,
}

impl RawRecord {
    pub fn new<P: Into<Payload>>(sequence: SeqNo, timestamp: Timestamp, payload: P) -> Self {
        Self {
            sequence,
            timestamp,
            payload: payload.into(),
        }
    }

    /// The record carried by a row is its first column. A string column is taken verbatim,
    /// any other JSON value is serialized back to text.
    pub fn from_row(sequence: SeqNo, timestamp: Timestamp, row: Row) -> Result<Self, DecodeErr> {
        let first = row.into_columns().into_iter().next();
        let payload = match first {
            Some(Json::String(text)) => Payload::Text(text),
            Some(other) => Payload::Text(other.to_string()),
            None => return Err(DecodeErr::EmptyRow),
        };
        Ok(Self::new(sequence, timestamp, payload))
    }

    pub fn sequence(&self) -> SeqNo {
        self.sequence
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn take_payload(self) -> Payload {
        self.payload
    }

    pub fn deserialize_json<D: serde::de::DeserializeOwned>(&self) -> Result<D, DecodeErr> {
        Ok(serde_json::from_str(self.payload.as_str()?)?)
    }
}

impl Row {
    pub fn new(columns: Vec<Json>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[Json] {
        &self.0
    }

    pub fn into_columns(self) -> Vec<Json> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}")?;
        }
        write!(f, ")")
    }
}

impl Buffer for Payload {
    fn size(&self) -> usize {
        self.as_bytes().len()
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Payload::Bytes(bytes) => bytes,
            Payload::Text(text) => text.into_bytes(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Bytes(bytes) => bytes,
            Payload::Text(text) => text.as_bytes(),
        }
    }

    fn as_str(&self) -> Result<&str, Utf8Error> {
        match self {
            Payload::Bytes(bytes) => std::str::from_utf8(bytes),
            Payload::Text(text) => Ok(text),
        }
    }
}

impl Buffer for &'_ [u8] {
    fn size(&self) -> usize {
        self.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_owned()
    }

    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self)
    }
}

impl Buffer for &'_ str {
    fn size(&self) -> usize {
        self.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.as_bytes().to_owned()
    }

    fn as_bytes(&self) -> &[u8] {
        str::as_bytes(self)
    }

    fn as_str(&self) -> Result<&str, Utf8Error> {
        Ok(self)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row() {
        let now = Timestamp::now_utc();
        let record =
            RawRecord::from_row(3, now, Row::new(vec![json!(r#"{"schoolId":1}"#), json!(7)]))
                .unwrap();
        assert_eq!(record.sequence(), 3);
        assert_eq!(record.payload().as_str().unwrap(), r#"{"schoolId":1}"#);

        let record = RawRecord::from_row(0, now, Row::new(vec![json!({ "schoolId": 1 })])).unwrap();
        assert_eq!(record.payload().as_str().unwrap(), r#"{"schoolId":1}"#);

        assert!(matches!(
            RawRecord::from_row(0, now, Row::new(vec![])),
            Err(DecodeErr::EmptyRow)
        ));
    }

    #[test]
    fn test_payload_utf8() {
        let payload = Payload::Bytes(vec![0xff, 0xfe]);
        assert_eq!(payload.size(), 2);
        assert!(payload.as_str().is_err());
        let record = RawRecord::new(0, Timestamp::now_utc(), payload);
        assert!(matches!(
            record.deserialize_json::<Json>(),
            Err(DecodeErr::Utf8Error(_))
        ));
    }

    #[test]
    fn test_row_display() {
        let row = Row::new(vec![json!("I am alive"), json!(1)]);
        assert_eq!(row.to_string(), r#"("I am alive", 1)"#);
    }
}
