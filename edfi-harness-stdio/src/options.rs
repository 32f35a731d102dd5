use edfi_harness_types::SourceKey;

#[derive(Debug, Default, Clone)]
pub struct StdioOptions {
    source_key: Option<SourceKey>,
}

impl StdioOptions {
    /// Only accept lines without a source key, or with this one.
    ///
    /// If unset, every line is accepted.
    pub fn set_source_key(&mut self, v: SourceKey) -> &mut Self {
        self.source_key = Some(v);
        self
    }
    pub fn source_key(&self) -> Option<&SourceKey> {
        self.source_key.as_ref()
    }

    pub(crate) fn accepts(&self, key: Option<&SourceKey>) -> bool {
        match (&self.source_key, key) {
            (Some(wanted), Some(key)) => wanted == key,
            _ => true,
        }
    }
}
