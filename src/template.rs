// ABOUTME: Tag substitution for bulk-copy command templates
// ABOUTME: Replaces ${name} and ${group.name} tokens from a typed tag map

use anyhow::{bail, Context, Result};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const DEFAULT_PATTERN: &str = r"\$\{(?:(?P<group>\w+)\.)?(?P<name>\w+)\}";

/// A single tag value: either a flat string or one level of named values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Flat(String),
    Group(BTreeMap<String, String>),
}

/// Typed tag dictionary used to render command templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    values: BTreeMap<String, TagValue>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a flat tag, replacing any previous value under the same key
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values
            .insert(key.into(), TagValue::Flat(value.to_string()));
        self
    }

    /// Insert a group of tags addressed as `${key.name}`
    pub fn insert_group(
        &mut self,
        key: impl Into<String>,
        group: BTreeMap<String, String>,
    ) -> &mut Self {
        self.values.insert(key.into(), TagValue::Group(group));
        self
    }

    /// Merge every key of a JSON object into the tags
    ///
    /// Top-level objects become groups. Anything nested deeper is rendered
    /// as compact JSON so the result stays deterministic.
    pub fn extend_from_json(&mut self, object: &serde_json::Map<String, Value>) -> &mut Self {
        for (key, value) in object {
            match value {
                Value::Object(inner) => {
                    let group = inner
                        .iter()
                        .map(|(k, v)| (k.clone(), value_to_string(v)))
                        .collect();
                    self.insert_group(key.clone(), group);
                }
                other => {
                    self.insert(key.clone(), value_to_string(other));
                }
            }
        }
        self
    }

    /// Resolve a bare or grouped key
    pub fn lookup(&self, group: Option<&str>, name: &str) -> Option<&str> {
        match group {
            Some(group) => match self.values.get(group)? {
                TagValue::Group(values) => values.get(name).map(String::as_str),
                TagValue::Flat(_) => None,
            },
            None => match self.values.get(name)? {
                TagValue::Flat(value) => Some(value.as_str()),
                TagValue::Group(_) => None,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TryFrom<&Value> for Tags {
    type Error = anyhow::Error;

    fn try_from(value: &Value) -> Result<Self> {
        let Value::Object(object) = value else {
            bail!("Tags must be built from a JSON object, got: {}", value);
        };
        let mut tags = Tags::new();
        tags.extend_from_json(object);
        Ok(tags)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Compiled token pattern
///
/// A pattern must expose a `name` capture and may expose a `group` capture.
#[derive(Debug, Clone)]
pub struct TagPattern {
    regex: Regex,
}

impl TagPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid tag pattern: {}", pattern))?;
        if !regex.capture_names().flatten().any(|n| n == "name") {
            bail!(
                "Tag pattern must define a named capture 'name': {}",
                pattern
            );
        }
        Ok(Self { regex })
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        static DEFAULT: OnceLock<Regex> = OnceLock::new();
        let regex = DEFAULT
            .get_or_init(|| Regex::new(DEFAULT_PATTERN).expect("default tag pattern compiles"))
            .clone();
        Self { regex }
    }
}

/// Options for [`render`]
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub template: TagPattern,
    /// Keep unresolved tokens verbatim instead of removing them
    pub keep_missing_tags: bool,
}

/// Replace every tag token in `source` with its value from `tags`
///
/// Replacement values are never rescanned.
///
/// # Examples
///
/// ```
/// # use table_copy::template::{render, RenderOptions, Tags};
/// let mut tags = Tags::new();
/// tags.insert("firstName", "John").insert("lastName", "Doe");
/// assert_eq!(
///     render("${firstName} ${lastName}", &tags, &RenderOptions::default()),
///     "John Doe"
/// );
/// ```
pub fn render(source: &str, tags: &Tags, options: &RenderOptions) -> String {
    if source.is_empty() || tags.is_empty() && options.keep_missing_tags {
        return source.to_string();
    }

    options
        .template
        .regex
        .replace_all(source, |caps: &Captures| {
            let Some(name) = caps.name("name") else {
                return caps[0].to_string();
            };
            let group = caps.name("group").map(|m| m.as_str());
            match tags.lookup(group, name.as_str()) {
                Some(value) => value.to_string(),
                None if options.keep_missing_tags => caps[0].to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}
