use serde_json::{Map, Value as Json};
use std::fmt::Display;

use crate::{Buffer, DecodeErr, RawRecord};

/// The suffix every education organization category of a school must end with.
pub const DEFAULT_CATEGORY_SUFFIX: &str = "#School";
/// Documents published on the platform topic are wrapped in this field.
pub const ENVELOPE_FIELD: &str = "edfidoc";
pub const CATEGORIES_FIELD: &str = "educationOrganizationCategories";
pub const CATEGORY_DESCRIPTOR_FIELD: &str = "educationOrganizationCategoryDescriptor";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A descriptor URI, e.g. `uri://ed-fi.org/EducationOrganizationCategoryDescriptor#School`.
pub struct CategoryTag(String);

#[derive(Debug, Clone, PartialEq, Eq)]
/// A decoded record: an identifier and its ordered category tags.
pub struct Document {
    resource: String,
    id: String,
    categories: Vec<CategoryTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// How to read a [`Document`] out of a JSON payload.
pub struct DecodeOptions {
    resource: String,
    id_field: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of a rule on one document.
pub enum Verdict {
    Valid,
    /// Carries the first offending tag only.
    Invalid(CategoryTag),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A human-readable report of one validation failure.
pub struct Diagnostic {
    resource: String,
    id: String,
    tag: CategoryTag,
}

impl CategoryTag {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl Display for CategoryTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Document {
    pub fn new<R, I>(resource: R, id: I, categories: Vec<CategoryTag>) -> Self
    where
        R: Into<String>,
        I: Into<String>,
    {
        Self {
            resource: resource.into(),
            id: id.into(),
            categories,
        }
    }

    /// Decode the payload of a record. The `edfidoc` envelope is unwrapped if present.
    pub fn decode(record: &RawRecord, options: &DecodeOptions) -> Result<Self, DecodeErr> {
        let json: Json = serde_json::from_str(record.payload().as_str()?)?;
        Self::from_json(json, options)
    }

    pub fn from_json(json: Json, options: &DecodeOptions) -> Result<Self, DecodeErr> {
        let mut object = into_object(json)?;
        if let Some(inner) = object.remove(ENVELOPE_FIELD) {
            object = into_object(inner)?;
        }

        let id = match object.get(options.id_field()) {
            Some(Json::Number(n)) => n.to_string(),
            Some(Json::String(s)) => s.to_owned(),
            Some(_) => return Err(DecodeErr::UnexpectedType(options.id_field().to_owned())),
            None => return Err(DecodeErr::MissingField(options.id_field().to_owned())),
        };

        let categories = match object.remove(CATEGORIES_FIELD) {
            None | Some(Json::Null) => Vec::new(),
            Some(Json::Array(entries)) => entries
                .into_iter()
                .map(category_of)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(DecodeErr::UnexpectedType(CATEGORIES_FIELD.to_owned())),
        };

        Ok(Self::new(options.resource(), id, categories))
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn categories(&self) -> &[CategoryTag] {
        &self.categories
    }
}

fn into_object(json: Json) -> Result<Map<String, Json>, DecodeErr> {
    match json {
        Json::Object(object) => Ok(object),
        _ => Err(DecodeErr::NotAnObject),
    }
}

fn category_of(entry: Json) -> Result<CategoryTag, DecodeErr> {
    match entry {
        Json::Object(mut object) => match object.remove(CATEGORY_DESCRIPTOR_FIELD) {
            Some(Json::String(tag)) => Ok(CategoryTag::new(tag)),
            Some(_) => Err(DecodeErr::UnexpectedType(
                CATEGORY_DESCRIPTOR_FIELD.to_owned(),
            )),
            None => Err(DecodeErr::MissingField(CATEGORY_DESCRIPTOR_FIELD.to_owned())),
        },
        _ => Err(DecodeErr::NotAnObject),
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            resource: "School".to_owned(),
            id_field: "schoolId".to_owned(),
        }
    }
}

impl DecodeOptions {
    /// Resource name used in diagnostics, and to filter the platform topic.
    ///
    /// If unset, defaults to `School`.
    pub fn set_resource<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.resource = v.into();
        self
    }
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Field holding the document identifier; a JSON number or string.
    ///
    /// If unset, defaults to `schoolId`.
    pub fn set_id_field<S: Into<String>>(&mut self, v: S) -> &mut Self {
        self.id_field = v.into();
        self
    }
    pub fn id_field(&self) -> &str {
        &self.id_field
    }
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl Diagnostic {
    pub fn new(document: &Document, tag: CategoryTag) -> Self {
        Self {
            resource: document.resource.clone(),
            id: document.id.clone(),
            tag,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tag(&self) -> &CategoryTag {
        &self.tag
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} has invalid category {}",
            self.resource, self.id, self.tag
        )
    }
}
