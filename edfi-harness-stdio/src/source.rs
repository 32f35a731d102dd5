use flume::{unbounded, Sender};
use std::{
    collections::HashMap,
    fmt::Debug,
    io::{BufRead, BufReader},
};

use edfi_harness_types::{
    export::futures::{future, stream::BoxStream, StreamExt},
    HarnessErr, RawRecord, RecordSource, SeqNo, SourceKey, Timestamp,
};

use crate::{parse_meta, stream_err, RecordMeta, StdioErr, StdioOptions, StdioResult};

type Line = std::io::Result<String>;

/// Records read line by line. There can only be one subscription, as the input cannot be rewound.
pub struct StdioSource {
    options: StdioOptions,
    reader: Option<Box<dyn BufRead + Send>>,
}

impl Debug for StdioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioSource")
            .field("options", &self.options)
            .field("subscribed", &self.reader.is_none())
            .finish()
    }
}

impl StdioSource {
    /// Read from stdin.
    pub fn new(options: StdioOptions) -> Self {
        Self::from_reader(BufReader::new(std::io::stdin()), options)
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R, options: StdioOptions) -> Self {
        Self {
            options,
            reader: Some(Box::new(reader)),
        }
    }

    pub fn options(&self) -> &StdioOptions {
        &self.options
    }
}

impl RecordSource for StdioSource {
    type Error = StdioErr;
    type Stream<'a> = BoxStream<'a, StdioResult<RawRecord>>;

    async fn subscribe(&mut self) -> StdioResult<Self::Stream<'_>> {
        let reader = self.reader.take().ok_or_else(|| {
            HarnessErr::StreamUnavailable("stdin can only be subscribed once".to_owned())
        })?;
        let (sender, receiver) = unbounded();
        std::thread::Builder::new()
            .name("edfi-harness-stdio".to_owned())
            .spawn(move || read_lines(reader, sender))
            .map_err(|e| stream_err(StdioErr::IoError(e)))?;

        let mut lines = LineDecoder::new(self.options.clone());
        Ok(receiver
            .into_stream()
            .filter_map(move |line| {
                future::ready(match line {
                    Ok(line) => lines.decode(&line).map(Ok),
                    Err(e) => Some(Err(stream_err(StdioErr::IoError(e)))),
                })
            })
            .boxed())
    }
}

/// Runs until the input ends, the input fails, or the subscription is dropped.
fn read_lines(mut reader: Box<dyn BufRead + Send>, sender: Sender<Line>) {
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            // this means the input is closed
            Ok(0) => break,
            Ok(_) => {
                if sender.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                sender.send(Err(e)).ok();
                break;
            }
        }
    }
    log::debug!("Input closed");
}

/// Turns lines into records, keeping a sequence number per source key.
#[derive(Debug)]
pub(crate) struct LineDecoder {
    options: StdioOptions,
    sequences: HashMap<Option<SourceKey>, SeqNo>,
}

impl LineDecoder {
    pub fn new(options: StdioOptions) -> Self {
        Self {
            options,
            sequences: Default::default(),
        }
    }

    /// `None` for a blank line, or a line of another source.
    pub fn decode(&mut self, line: &str) -> Option<RawRecord> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return None;
        }
        let (meta, payload) = parse_meta(line).unwrap_or_else(|_| (RecordMeta::default(), line));
        if !self.options.accepts(meta.source_key.as_ref()) {
            log::trace!("Dropping a line of {:?}", meta.source_key);
            return None;
        }
        let next = self.sequences.entry(meta.source_key).or_default();
        let sequence = meta.sequence.unwrap_or(*next);
        *next = sequence.wrapping_add(1);
        Some(RawRecord::new(
            sequence,
            meta.timestamp.unwrap_or_else(Timestamp::now_utc),
            payload.to_owned(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use edfi_harness_types::Buffer;
    use time::macros::datetime;

    #[test]
    fn test_line_decoder() {
        let mut lines = LineDecoder::new(Default::default());
        assert!(lines.decode("\n").is_none());
        assert!(lines.decode("  \r\n").is_none());

        let record = lines.decode("{\"schoolId\": 1}\r\n").unwrap();
        assert_eq!(record.sequence(), 0);
        assert_eq!(record.payload().as_str().unwrap(), "{\"schoolId\": 1}");

        let record = lines
            .decode("[2022-01-02T03:04:05 | 10] {\"schoolId\": 2}\n")
            .unwrap();
        assert_eq!(record.sequence(), 10);
        assert_eq!(record.timestamp(), datetime!(2022-01-02 03:04:05 UTC));
        assert_eq!(record.payload().as_str().unwrap(), "{\"schoolId\": 2}");

        assert_eq!(lines.decode("{}").unwrap().sequence(), 11);
        // each source key is numbered on its own
        assert_eq!(lines.decode("[other] {}").unwrap().sequence(), 0);
        assert_eq!(lines.decode("{}").unwrap().sequence(), 12);

        let record = lines.decode("[\"an\", \"array\"]").unwrap();
        assert_eq!(record.payload().as_str().unwrap(), "[\"an\", \"array\"]");
    }

    #[test]
    fn test_last_sequence_number() {
        let mut lines = LineDecoder::new(Default::default());
        let record = lines
            .decode("[18446744073709551615] {\"schoolId\": 1}")
            .unwrap();
        assert_eq!(record.sequence(), u64::MAX);
        // the counter of the key starts over
        assert_eq!(lines.decode("{}").unwrap().sequence(), 0);
    }

    #[test]
    fn test_source_key_filter() {
        let mut options = StdioOptions::default();
        options.set_source_key(SourceKey::new("document").unwrap());
        let mut lines = LineDecoder::new(options);

        assert!(lines.decode("[school] {}").is_none());
        assert_eq!(lines.decode("[document] {}").unwrap().sequence(), 0);
        assert_eq!(lines.decode("{}").unwrap().sequence(), 0);
        assert_eq!(lines.decode("[document | 5] {}").unwrap().sequence(), 5);
    }
}
