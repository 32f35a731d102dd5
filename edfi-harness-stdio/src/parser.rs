//! A line is a record, optionally preceded by its metadata:
//!
//! ```json
//! [timestamp | source key | sequence] { "schoolId": 1 }
//! ```
//!
//! The square brackets are literal `[]`. Every part is optional, but they must come in this order.
//!
//! The following all carry a prefix:
//!
//! ```json
//! [2022-01-01T00:00:00] { "schoolId": 1 }
//! [2022-01-01T00:00:00 | document] { "schoolId": 1 }
//! [2022-01-01T00:00:00 | document | 123] { "schoolId": 1 }
//! [document] { "schoolId": 1 }
//! [document | 123] { "schoolId": 1 }
//! [123] { "schoolId": 1 }
//! ```
//!
//! If the brackets do not hold valid metadata, e.g. `["an", "array"]`, the line has no prefix.

use edfi_harness_types::{is_valid_source_key_char, SeqNo, SourceKey, Timestamp, MAX_SOURCE_KEY_LEN};
use nom::{
    bytes::complete::{is_not, take_while_m_n},
    character::complete::char,
    sequence::delimited,
    IResult,
};
use thiserror::Error;
use time::{macros::format_description, PrimitiveDateTime};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    pub timestamp: Option<Timestamp>,
    pub source_key: Option<SourceKey>,
    pub sequence: Option<SeqNo>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErr {
    #[error("Empty RecordMeta")]
    Empty,
    #[error("Error parsing brackets: {0}")]
    Nom(String),
    #[error("Unknown part: {0}")]
    Unknown(String),
}

/// Split a line into its metadata and the remaining payload, trimmed.
///
/// Timestamps have no offset and are taken as UTC.
pub fn parse_meta(input: &str) -> Result<(RecordMeta, &str), ParseErr> {
    let (rest, raw) = brackets(input).map_err(|e| ParseErr::Nom(e.to_string()))?;
    let mut meta = RecordMeta::default();
    for part in raw.split('|').map(str::trim) {
        if meta == RecordMeta::default() {
            if let Some(timestamp) = parse_timestamp(part) {
                meta.timestamp = Some(timestamp);
                continue;
            }
        }
        if meta.sequence.is_none() && !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
            let sequence = part
                .parse()
                .map_err(|_| ParseErr::Unknown(part.to_owned()))?;
            meta.sequence = Some(sequence);
            continue;
        }
        if meta.source_key.is_none() && meta.sequence.is_none() {
            if let Ok(("", key)) = parse_source_key(part) {
                meta.source_key =
                    Some(SourceKey::new(key).map_err(|_| ParseErr::Unknown(part.to_owned()))?);
                continue;
            }
        }
        return Err(ParseErr::Unknown(part.to_owned()));
    }
    if meta == RecordMeta::default() {
        return Err(ParseErr::Empty);
    }
    Ok((meta, rest.trim()))
}

fn parse_timestamp(part: &str) -> Option<Timestamp> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(part, &format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn parse_source_key(input: &str) -> IResult<&str, &str> {
    take_while_m_n(1, MAX_SOURCE_KEY_LEN, is_valid_source_key_char)(input)
}

fn brackets(input: &str) -> IResult<&str, &str> {
    delimited(char('['), is_not("]"), char(']'))(input)
}

#[cfg(test)]
mod test {
    use time::macros::datetime;

    use super::*;

    fn key(s: &str) -> Option<SourceKey> {
        Some(SourceKey::new(s).unwrap())
    }

    #[test]
    fn test_parse_meta_timestamp() {
        assert_eq!(
            parse_meta(r#"[2022-01-02T03:04:05] { "schoolId": 1 }"#).unwrap(),
            (
                RecordMeta {
                    timestamp: Some(datetime!(2022-01-02 03:04:05 UTC)),
                    ..Default::default()
                },
                r#"{ "schoolId": 1 }"#
            )
        )
    }

    #[test]
    fn test_parse_meta_full() {
        assert_eq!(
            parse_meta(r#"[2022-01-02T03:04:05 | edfi.dms-document_1 | 123] { "schoolId": 1 }"#)
                .unwrap(),
            (
                RecordMeta {
                    timestamp: Some(datetime!(2022-01-02 03:04:05 UTC)),
                    source_key: key("edfi.dms-document_1"),
                    sequence: Some(123),
                },
                r#"{ "schoolId": 1 }"#
            )
        )
    }

    #[test]
    fn test_parse_meta_key_and_sequence() {
        assert_eq!(
            parse_meta("[document | 7]{}").unwrap(),
            (
                RecordMeta {
                    timestamp: None,
                    source_key: key("document"),
                    sequence: Some(7),
                },
                "{}"
            )
        );
        assert_eq!(
            parse_meta("[42] {}").unwrap(),
            (
                RecordMeta {
                    sequence: Some(42),
                    ..Default::default()
                },
                "{}"
            )
        );
    }

    #[test]
    fn test_parse_meta_errors() {
        assert!(matches!(parse_meta("{}"), Err(ParseErr::Nom(_))));
        assert!(matches!(parse_meta("[ ] {}"), Err(ParseErr::Unknown(_))));
        assert!(matches!(
            parse_meta(r#"["an", "array"]"#),
            Err(ParseErr::Unknown(_))
        ));
        assert!(matches!(
            parse_meta("[Jan 1, 2022] {}"),
            Err(ParseErr::Unknown(_))
        ));
        assert!(matches!(
            parse_meta("[7 | document] {}"),
            Err(ParseErr::Unknown(_))
        ));
        assert!(matches!(
            parse_meta("[document | 2022-01-02T03:04:05] {}"),
            Err(ParseErr::Unknown(_))
        ));
    }
}
