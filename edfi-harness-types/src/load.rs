use serde::Serialize;
use serde_json::Value as Json;
use std::{fmt::Display, str::FromStr, time::Duration};

use crate::{DescriptorErr, RequestErr, StatsErr, Timestamp};

/// Header line of a result log.
pub const RESULT_LOG_HEADER: &str = "from_offset,size,response_time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// One page of a larger result set to request: skip `offset` items, then take `size`.
pub struct RequestDescriptor {
    offset: u64,
    size: u64,
}

#[derive(Debug, Clone, PartialEq)]
/// A response, classified once at the executor boundary.
pub enum Response {
    Json(Json),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
/// The outcome of one successful request. Never mutated after creation.
pub struct BatchResult {
    descriptor: RequestDescriptor,
    repetition: u32,
    elapsed: Duration,
    response: Response,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A capture of a process's resource usage, verbatim from the stats tool.
pub struct ResourceSnapshot {
    process: String,
    taken_at: Timestamp,
    header: String,
    rows: Vec<String>,
}

impl RequestDescriptor {
    pub fn new(offset: u64, size: u64) -> Result<Self, DescriptorErr> {
        if size == 0 {
            return Err(DescriptorErr::ZeroSize);
        }
        Ok(Self { offset, size })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Display for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.offset, self.size)
    }
}

impl FromStr for RequestDescriptor {
    type Err = DescriptorErr;

    /// Parses `offset:size`, e.g. `100000:25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DescriptorErr::Malformed(s.to_owned());
        let (offset, size) = s.trim().split_once(':').ok_or_else(malformed)?;
        let offset = offset.trim().parse().map_err(|_| malformed())?;
        let size = size.trim().parse().map_err(|_| malformed())?;
        Self::new(offset, size)
    }
}

impl Response {
    /// Classify a response body. The ODS API omits the `Content-Type` header on JSON responses,
    /// so `application/octet-stream` is read as JSON too.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self, RequestErr> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::Empty);
        }
        let content_type = content_type.unwrap_or("application/octet-stream");
        if content_type.starts_with("application/json")
            || content_type.starts_with("application/octet-stream")
        {
            serde_json::from_slice(body)
                .map(Self::Json)
                .map_err(|e| RequestErr::InvalidResponse(e.to_string()))
        } else {
            Ok(Self::Text(String::from_utf8_lossy(body).into_owned()))
        }
    }

    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Self::Json(json) => Some(json),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl BatchResult {
    pub fn new(
        descriptor: RequestDescriptor,
        repetition: u32,
        elapsed: Duration,
        response: Response,
    ) -> Self {
        Self {
            descriptor,
            repetition,
            elapsed,
            response,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Zero-based repetition this request belongs to.
    pub fn repetition(&self) -> u32 {
        self.repetition
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// `offset,size,elapsed_seconds`, as appended to the result log.
    pub fn to_log_row(&self) -> String {
        format!(
            "{},{},{}",
            self.descriptor.offset,
            self.descriptor.size,
            self.elapsed_seconds()
        )
    }
}

impl ResourceSnapshot {
    pub fn new(process: String, taken_at: Timestamp, header: String, rows: Vec<String>) -> Self {
        Self {
            process,
            taken_at,
            header,
            rows,
        }
    }

    /// Split the tool output into its header line and data rows. Blank lines are dropped.
    pub fn parse(process: &str, taken_at: Timestamp, output: &str) -> Result<Self, StatsErr> {
        let mut lines = output.lines().filter(|line| !line.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| StatsErr::EmptyOutput(process.to_owned()))?;
        Ok(Self::new(
            process.to_owned(),
            taken_at,
            header.to_owned(),
            lines.map(ToOwned::to_owned).collect(),
        ))
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn taken_at(&self) -> Timestamp {
        self.taken_at
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor() {
        assert_eq!(
            "10000:1".parse::<RequestDescriptor>().unwrap(),
            RequestDescriptor::new(10000, 1).unwrap()
        );
        assert_eq!(
            " 0 : 500 ".parse::<RequestDescriptor>().unwrap(),
            RequestDescriptor::new(0, 500).unwrap()
        );
        assert_eq!(RequestDescriptor::new(1, 0), Err(DescriptorErr::ZeroSize));
        assert_eq!("5:0".parse::<RequestDescriptor>(), Err(DescriptorErr::ZeroSize));
        assert!(matches!(
            "5".parse::<RequestDescriptor>(),
            Err(DescriptorErr::Malformed(_))
        ));
        assert!(matches!(
            "-5:1".parse::<RequestDescriptor>(),
            Err(DescriptorErr::Malformed(_))
        ));
        assert_eq!(RequestDescriptor::new(7, 25).unwrap().to_string(), "7:25");
    }

    #[test]
    fn test_response_from_body() {
        assert_eq!(
            Response::from_body(Some("application/json; charset=utf-8"), br#"{"id":"abc"}"#)
                .unwrap(),
            Response::Json(json!({ "id": "abc" }))
        );
        assert_eq!(
            Response::from_body(None, b"[]").unwrap(),
            Response::Json(json!([]))
        );
        assert_eq!(
            Response::from_body(Some("text/plain"), b"Created").unwrap(),
            Response::Text("Created".to_owned())
        );
        assert_eq!(
            Response::from_body(Some("application/json"), b"").unwrap(),
            Response::Empty
        );
        assert_eq!(Response::from_body(None, b" \n").unwrap(), Response::Empty);
        assert!(matches!(
            Response::from_body(Some("application/json"), b"<html>"),
            Err(RequestErr::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_log_row() {
        let result = BatchResult::new(
            RequestDescriptor::new(100000, 1).unwrap(),
            0,
            Duration::from_millis(1500),
            Response::Empty,
        );
        assert_eq!(result.to_log_row(), "100000,1,1.5");
    }

    #[test]
    fn test_parse_snapshot() {
        let output = "CONTAINER ID   NAME         CPU %     MEM USAGE / LIMIT\n\
                      1b2c3d4e5f6a   opensearch   2.35%     1.2GiB / 7.6GiB\n";
        let snapshot =
            ResourceSnapshot::parse("opensearch", Timestamp::now_utc(), output).unwrap();
        assert!(snapshot.header().starts_with("CONTAINER ID"));
        assert_eq!(snapshot.rows().len(), 1);
        assert!(snapshot.rows()[0].contains("opensearch"));

        assert!(matches!(
            ResourceSnapshot::parse("missing", Timestamp::now_utc(), "\n"),
            Err(StatsErr::EmptyOutput(p)) if p == "missing"
        ));
    }
}
