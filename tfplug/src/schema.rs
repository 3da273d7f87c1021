//! Schema types and builders for tfplug
//!
//! This module provides the schema system for describing provider
//! configuration blocks, and validation of configuration against a schema.

pub use crate::attribute_type::AttributeType;
use crate::types::{AttributePath, Config, Diagnostic, Diagnostics, Dynamic};
use crate::validator::Validator;
use serde::Serialize;
use std::sync::Arc;

/// Schema is returned by providers
/// Version is used for state migration
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub version: i64,
    pub block: Block,
}

/// Block represents a configuration block
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub version: i64,
    pub attributes: Vec<Attribute>,
    pub description: String,
    pub description_kind: StringKind,
    pub deprecated: bool,
}

/// Attribute represents a single configuration attribute
#[derive(Clone, Serialize)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub deprecated: bool,
    #[serde(skip)]
    pub validators: Vec<Arc<dyn Validator>>,
}

// Manual Debug implementation since validators don't implement Debug
impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("description", &self.description)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("deprecated", &self.deprecated)
            .field(
                "validators",
                &format!("{} validators", self.validators.len()),
            )
            .finish()
    }
}

/// StringKind represents the format of string values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringKind {
    Plain,
    Markdown,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.block.attributes.iter().find(|a| a.name == name)
    }

    /// Checks a configuration object against the schema: unsupported and
    /// missing arguments, value types, deprecations and attribute validators.
    /// Unknown values are accepted as-is.
    pub fn validate(&self, config: &Config) -> Diagnostics {
        let mut diags = Diagnostics::new();

        if let Dynamic::Map(values) = &config.value {
            for name in values.keys() {
                if self.attribute(name).is_none() {
                    diags.add(
                        Diagnostic::error(
                            "Unsupported argument",
                            format!("An argument named \"{}\" is not expected here.", name),
                        )
                        .with_attribute(AttributePath::new(name)),
                    );
                }
            }
        }

        for attr in &self.block.attributes {
            let path = AttributePath::new(&attr.name);
            let Some(value) = config.get_optional(&path) else {
                if attr.required {
                    diags.add(
                        Diagnostic::error(
                            "Missing required argument",
                            format!("The argument \"{}\" is required.", attr.name),
                        )
                        .with_attribute(path),
                    );
                }
                continue;
            };

            if value.is_unknown() {
                continue;
            }

            if !value_matches_type(value, &attr.r#type) {
                diags.add(
                    Diagnostic::error(
                        "Incorrect attribute value type",
                        format!(
                            "Inappropriate value for attribute \"{}\": {} required, got {}.",
                            attr.name,
                            attr.r#type,
                            value.type_name()
                        ),
                    )
                    .with_attribute(path),
                );
                continue;
            }

            if attr.deprecated {
                diags.add(
                    Diagnostic::warning(
                        "Argument is deprecated",
                        format!("The argument \"{}\" is deprecated.", attr.name),
                    )
                    .with_attribute(path.clone()),
                );
            }

            for validator in &attr.validators {
                let mut attr_diags = Diagnostics::new();
                validator.validate(value, &attr.name, &mut attr_diags);
                for diag in attr_diags.errors.into_iter().chain(attr_diags.warnings) {
                    diags.add(diag.with_attribute(path.clone()));
                }
            }
        }

        diags
    }
}

fn value_matches_type(value: &Dynamic, attr_type: &AttributeType) -> bool {
    match (value, attr_type) {
        (Dynamic::Null | Dynamic::Unknown, _) => true,
        (Dynamic::String(_), AttributeType::String) => true,
        (Dynamic::Number(_), AttributeType::Number) => true,
        (Dynamic::Bool(_), AttributeType::Bool) => true,
        (Dynamic::List(items), AttributeType::List(e) | AttributeType::Set(e)) => {
            items.iter().all(|item| value_matches_type(item, e))
        }
        (Dynamic::Map(entries), AttributeType::Map(e)) => {
            entries.values().all(|item| value_matches_type(item, e))
        }
        (Dynamic::Map(entries), AttributeType::Object(fields)) => entries
            .iter()
            .all(|(k, v)| fields.get(k).is_some_and(|t| value_matches_type(v, t))),
        _ => false,
    }
}

/// AttributeBuilder provides fluent API for building attributes
/// ALWAYS use this instead of constructing Attribute directly
pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    /// Create a new attribute builder
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                deprecated: false,
                validators: Vec::new(),
            },
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, AttributeType::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, AttributeType::Number)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, AttributeType::Bool)
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    /// Mark as sensitive (hidden)
    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.attribute.deprecated = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

/// SchemaBuilder provides fluent API for building schemas
/// ALWAYS use this for consistency
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block {
                    version: 0,
                    attributes: Vec::new(),
                    description: String::new(),
                    description_kind: StringKind::Plain,
                    deprecated: false,
                },
            },
        }
    }

    /// Set schema version
    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self.schema.block.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn description_kind(mut self, kind: StringKind) -> Self {
        self.schema.block.description_kind = kind;
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
