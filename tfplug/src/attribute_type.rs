//! Attribute type system
//!
//! Mirrors Terraform's type system. Types serialize to the JSON type
//! expressions Terraform uses on the wire, e.g. `"string"` or
//! `["list","string"]`.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number, // Always f64
    Bool,
    List(Box<AttributeType>),               // Ordered, allows duplicates
    Set(Box<AttributeType>),                // Unordered, no duplicates
    Map(Box<AttributeType>),                // String keys only
    Object(HashMap<String, AttributeType>), // Fixed structure
}

impl AttributeType {
    pub fn list_of(element: AttributeType) -> Self {
        AttributeType::List(Box::new(element))
    }

    pub fn set_of(element: AttributeType) -> Self {
        AttributeType::Set(Box::new(element))
    }

    /// Element type of a collection type, `None` for primitives and objects
    pub fn element_type(&self) -> Option<&AttributeType> {
        match self {
            AttributeType::List(e) | AttributeType::Set(e) | AttributeType::Map(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.element_type().is_some()
    }

    /// Terraform JSON type expression
    pub fn to_type_json(&self) -> Value {
        match self {
            AttributeType::String => json!("string"),
            AttributeType::Number => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::List(e) => json!(["list", e.to_type_json()]),
            AttributeType::Set(e) => json!(["set", e.to_type_json()]),
            AttributeType::Map(e) => json!(["map", e.to_type_json()]),
            AttributeType::Object(attrs) => {
                let fields: serde_json::Map<String, Value> = attrs
                    .iter()
                    .map(|(name, t)| (name.clone(), t.to_type_json()))
                    .collect();
                json!(["object", fields])
            }
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Number => write!(f, "number"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::List(e) => write!(f, "list({})", e),
            AttributeType::Set(e) => write!(f, "set({})", e),
            AttributeType::Map(e) => write!(f, "map({})", e),
            AttributeType::Object(_) => write!(f, "object"),
        }
    }
}

impl Serialize for AttributeType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_type_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_type_list_contains_element_type() {
        let attr_type = AttributeType::list_of(AttributeType::String);

        match attr_type {
            AttributeType::List(elem_type) => {
                assert!(matches!(*elem_type, AttributeType::String));
            }
            _ => panic!("Expected List type"),
        }
    }

    #[test]
    fn attribute_type_set_contains_element_type() {
        let attr_type = AttributeType::set_of(AttributeType::Number);
        assert_eq!(attr_type.element_type(), Some(&AttributeType::Number));
        assert!(attr_type.is_collection());
        assert!(!AttributeType::Bool.is_collection());
    }

    #[test]
    fn primitive_types_encode_as_bare_strings() {
        assert_eq!(AttributeType::String.to_type_json(), json!("string"));
        assert_eq!(AttributeType::Number.to_type_json(), json!("number"));
        assert_eq!(AttributeType::Bool.to_type_json(), json!("bool"));
    }

    #[test]
    fn nested_collection_types_encode_recursively() {
        let attr_type = AttributeType::list_of(AttributeType::Map(Box::new(AttributeType::String)));
        assert_eq!(
            serde_json::to_string(&attr_type).unwrap(),
            r#"["list",["map","string"]]"#
        );
    }

    #[test]
    fn object_type_encodes_field_types() {
        let attr_type = AttributeType::Object(HashMap::from([
            ("name".to_string(), AttributeType::String),
            ("age".to_string(), AttributeType::Number),
        ]));
        assert_eq!(
            attr_type.to_type_json(),
            json!(["object", {"age": "number", "name": "string"}])
        );
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(AttributeType::set_of(AttributeType::String).to_string(), "set(string)");
    }
}
