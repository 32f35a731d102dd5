use edfi_harness_types::{Document, Verdict, DEFAULT_CATEGORY_SUFFIX};

/// A data-quality predicate over one document.
pub trait Rule: Send + Sync {
    fn check(&self, document: &Document) -> Verdict;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every category tag of a document must end with the suffix.
///
/// Only the first offending tag (in list order) is reported. A document without categories is valid.
pub struct CategorySuffixRule {
    suffix: String,
}

impl CategorySuffixRule {
    pub fn new<S: Into<String>>(suffix: S) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for CategorySuffixRule {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_SUFFIX)
    }
}

impl Rule for CategorySuffixRule {
    fn check(&self, document: &Document) -> Verdict {
        match document
            .categories()
            .iter()
            .find(|tag| !tag.has_suffix(&self.suffix))
        {
            Some(tag) => Verdict::Invalid(tag.clone()),
            None => Verdict::Valid,
        }
    }
}

impl<F> Rule for F
where
    F: Fn(&Document) -> Verdict + Send + Sync,
{
    fn check(&self, document: &Document) -> Verdict {
        self(document)
    }
}
