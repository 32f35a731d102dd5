use edfi_harness_types::{
    export::futures::{
        stream::{self, BoxStream},
        Stream, StreamExt,
    },
    export::serde_json::{self, Value as Json},
    DecodeErr, HarnessErr, Row,
};
use std::{fmt::Display, pin::Pin};

use crate::{ProtonErr, ProtonResult};

/// Splits a byte stream into lines. A line may span any number of chunks.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// The next complete line, without its line ending.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// Whatever is left after the last line ending.
    pub fn take_rest(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

/// One `JSONCompactEachRow` line: a JSON array of column values.
pub(crate) fn parse_row(line: &[u8]) -> Result<Row, DecodeErr> {
    let columns: Vec<Json> = serde_json::from_slice(line)?;
    Ok(Row::new(columns))
}

struct RowReader<S> {
    body: Pin<Box<S>>,
    lines: LineBuffer,
    ended: bool,
    failed: bool,
}

/// Rows of a response body, parsed lazily as chunks arrive. A transport error is the last item.
pub(crate) fn row_stream<S, B, E>(body: S) -> BoxStream<'static, ProtonResult<Row>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display,
{
    let reader = RowReader {
        body: Box::pin(body),
        lines: LineBuffer::default(),
        ended: false,
        failed: false,
    };
    stream::unfold(reader, |mut reader| async move {
        if reader.failed {
            return None;
        }
        loop {
            let line = match reader.lines.next_line() {
                Some(line) => line,
                None if reader.ended => reader.lines.take_rest()?,
                None => {
                    match reader.body.next().await {
                        Some(Ok(bytes)) => reader.lines.extend(bytes.as_ref()),
                        Some(Err(e)) => {
                            reader.failed = true;
                            let e = HarnessErr::StreamUnavailable(e.to_string());
                            return Some((Err(e), reader));
                        }
                        None => reader.ended = true,
                    }
                    continue;
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            let row = parse_row(&line).map_err(HarnessErr::<ProtonErr>::Decode);
            return Some((row, reader));
        }
    })
    .boxed()
}
