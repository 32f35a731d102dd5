use edfi_harness_types::{
    export::futures::{
        future::{self, Either},
        Stream, StreamExt,
    },
    DecodeErr, DecodeOptions, Diagnostic, Document, HarnessErr, HarnessResult, RawRecord,
    RecordSource, Verdict,
};

use crate::{CancelToken, DiagnosticSink, Rule};

#[derive(Debug, Clone)]
/// Applies a [`Rule`] to every document of a record stream.
pub struct StreamValidator<R: Rule> {
    rule: R,
    options: ValidatorOptions,
}

#[derive(Debug, Default, Clone)]
pub struct ValidatorOptions {
    decode: DecodeOptions,
    log_valid: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Counters of one validation run.
pub struct ValidationStats {
    /// Records received from the source
    pub records: u64,
    /// Records decoded into documents
    pub decoded: u64,
    /// Records skipped because they could not be decoded
    pub skipped: u64,
    /// Documents that failed the rule
    pub invalid: u64,
}

enum Outcome<E: std::error::Error> {
    Valid,
    Invalid(Diagnostic),
    Skipped(DecodeErr),
    Fatal(HarnessErr<E>),
}

impl ValidatorOptions {
    /// How documents are read from record payloads.
    pub fn set_decode_options(&mut self, v: DecodeOptions) -> &mut Self {
        self.decode = v;
        self
    }
    pub fn decode_options(&self) -> &DecodeOptions {
        &self.decode
    }

    /// Log every valid document at `debug` level.
    ///
    /// If unset, defaults to false.
    pub fn set_log_valid(&mut self, v: bool) -> &mut Self {
        self.log_valid = v;
        self
    }
    pub fn log_valid(&self) -> bool {
        self.log_valid
    }
}

impl<R: Rule> StreamValidator<R> {
    pub fn new(rule: R, options: ValidatorOptions) -> Self {
        Self { rule, options }
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Check a single record. `None` means the record is fine.
    pub fn check_record(&self, record: &RawRecord) -> Result<Option<Diagnostic>, DecodeErr> {
        let document = Document::decode(record, &self.options.decode)?;
        Ok(self.check_document(&document))
    }

    pub fn check_document(&self, document: &Document) -> Option<Diagnostic> {
        match self.rule.check(document) {
            Verdict::Valid => {
                if self.options.log_valid {
                    log::debug!("{} {} is valid", document.resource(), document.id());
                }
                None
            }
            Verdict::Invalid(tag) => Some(Diagnostic::new(document, tag)),
        }
    }

    fn classify<E: std::error::Error>(&self, item: HarnessResult<RawRecord, E>) -> Outcome<E> {
        let record = match item {
            Ok(record) => record,
            Err(HarnessErr::Decode(e)) => return Outcome::Skipped(e),
            Err(e) => return Outcome::Fatal(e),
        };
        match self.check_record(&record) {
            Ok(Some(diagnostic)) => Outcome::Invalid(diagnostic),
            Ok(None) => Outcome::Valid,
            Err(e) => {
                log::debug!("Record #{} is not a document", record.sequence());
                Outcome::Skipped(e)
            }
        }
    }

    /// The lazy sequence of diagnostics of a record stream.
    ///
    /// Undecodable records are logged and skipped. The first fatal error is yielded, then the sequence ends.
    pub fn diagnostics<'a, S, E>(
        &'a self,
        records: S,
    ) -> impl Stream<Item = HarnessResult<Diagnostic, E>> + 'a
    where
        S: Stream<Item = HarnessResult<RawRecord, E>> + 'a,
        E: std::error::Error + 'a,
    {
        records
            .scan(false, |failed, item| {
                if *failed {
                    return future::ready(None);
                }
                *failed = matches!(&item, Err(e) if e.is_fatal());
                future::ready(Some(item))
            })
            .filter_map(move |item| {
                future::ready(match self.classify(item) {
                    Outcome::Valid => None,
                    Outcome::Invalid(diagnostic) => Some(Ok(diagnostic)),
                    Outcome::Skipped(e) => {
                        log::warn!("Skipping record: {e}");
                        None
                    }
                    Outcome::Fatal(e) => Some(Err(e)),
                })
            })
    }

    /// Subscribe to the source and emit a diagnostic per invalid document, until the source ends,
    /// the token is cancelled, or the source is lost.
    ///
    /// Cancellation is honoured while waiting for the next record too.
    pub async fn run<Src, K>(
        &self,
        source: &mut Src,
        sink: &mut K,
        cancel: &CancelToken,
    ) -> HarnessResult<ValidationStats, Src::Error>
    where
        Src: RecordSource,
        K: DiagnosticSink + ?Sized,
    {
        let records = source.subscribe().await?;
        let mut records = std::pin::pin!(records);
        let mut stats = ValidationStats::default();

        loop {
            if cancel.is_cancelled() {
                log::debug!("Validation cancelled");
                break;
            }
            let item = {
                let cancelled = std::pin::pin!(cancel.cancelled());
                match future::select(records.next(), cancelled).await {
                    Either::Left((Some(item), _)) => item,
                    Either::Left((None, _)) => {
                        log::debug!("Source ended");
                        break;
                    }
                    Either::Right(_) => {
                        log::debug!("Validation cancelled");
                        break;
                    }
                }
            };
            match self.classify(item) {
                Outcome::Valid => stats.decoded += 1,
                Outcome::Invalid(diagnostic) => {
                    stats.decoded += 1;
                    stats.invalid += 1;
                    sink.emit(diagnostic);
                }
                Outcome::Skipped(e) => {
                    stats.skipped += 1;
                    log::warn!("Skipping record: {e}");
                }
                Outcome::Fatal(e) => {
                    log::error!("Lost the record source: {e}");
                    return Err(e);
                }
            }
            stats.records += 1;
        }

        Ok(stats)
    }
}
