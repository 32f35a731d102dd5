use edfi_harness_types::Diagnostic;

/// Receives one call per invalid document.
pub trait DiagnosticSink: Send {
    fn emit(&mut self, diagnostic: Diagnostic);
}

#[derive(Debug, Default, Clone, Copy)]
/// Prints diagnostics to stdout for the operator.
pub struct ConsoleSink;

#[derive(Debug, Default, Clone, Copy)]
/// Forwards diagnostics to the `log` facade at `warn` level.
pub struct LogSink;

#[derive(Debug, Default, Clone)]
/// Keeps every diagnostic in memory.
pub struct Collector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for ConsoleSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        println!("❌ {diagnostic}");
    }
}

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
    }
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for Collector {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl<F> DiagnosticSink for F
where
    F: FnMut(Diagnostic) + Send,
{
    fn emit(&mut self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}
