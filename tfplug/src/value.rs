//! Typed collection values
//!
//! `ListValue<T>` and `SetValue<T>` are the typed counterparts of
//! `Dynamic::List`. Each is null, unknown, or a known collection; the element
//! type is the type parameter, so a null list still knows it holds `T`.

use crate::attribute_type::AttributeType;
use crate::error::{Result, TfplugError};
use crate::types::Dynamic;

/// A Rust type that maps onto a Terraform primitive type
pub trait ElementType: Clone + PartialEq + Sized {
    fn attribute_type() -> AttributeType;

    fn to_dynamic(&self) -> Dynamic;

    fn from_dynamic(value: &Dynamic) -> Result<Self>;
}

fn element_mismatch<T: ElementType>(value: &Dynamic) -> TfplugError {
    TfplugError::TypeMismatch {
        expected: T::attribute_type().to_string(),
        actual: value.type_name().to_string(),
    }
}

impl ElementType for String {
    fn attribute_type() -> AttributeType {
        AttributeType::String
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::String(self.clone())
    }

    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        value
            .as_string()
            .map(str::to_string)
            .ok_or_else(|| element_mismatch::<Self>(value))
    }
}

impl ElementType for bool {
    fn attribute_type() -> AttributeType {
        AttributeType::Bool
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Bool(*self)
    }

    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| element_mismatch::<Self>(value))
    }
}

impl ElementType for f64 {
    fn attribute_type() -> AttributeType {
        AttributeType::Number
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Number(*self)
    }

    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        value
            .as_number()
            .ok_or_else(|| element_mismatch::<Self>(value))
    }
}

impl ElementType for i64 {
    fn attribute_type() -> AttributeType {
        AttributeType::Number
    }

    fn to_dynamic(&self) -> Dynamic {
        Dynamic::Number(*self as f64)
    }

    fn from_dynamic(value: &Dynamic) -> Result<Self> {
        match value.as_number() {
            Some(n) if n.fract() == 0.0 => Ok(n as i64),
            Some(n) => Err(TfplugError::TypeMismatch {
                expected: "whole number".to_string(),
                actual: n.to_string(),
            }),
            None => Err(element_mismatch::<Self>(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum State<T> {
    Null,
    Unknown,
    Known(Vec<T>),
}

/// Ordered collection, duplicates allowed
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue<T: ElementType> {
    state: State<T>,
}

impl<T: ElementType> ListValue<T> {
    pub fn null() -> Self {
        Self { state: State::Null }
    }

    pub fn unknown() -> Self {
        Self {
            state: State::Unknown,
        }
    }

    pub fn new(elements: Vec<T>) -> Self {
        Self {
            state: State::Known(elements),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.state, State::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.state, State::Unknown)
    }

    /// Elements of a known list, `None` when null or unknown
    pub fn elements(&self) -> Option<&[T]> {
        match &self.state {
            State::Known(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<T>> {
        match self.state {
            State::Known(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.elements().map_or(0, <[T]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> AttributeType {
        T::attribute_type()
    }

    pub fn attribute_type(&self) -> AttributeType {
        AttributeType::list_of(T::attribute_type())
    }

    pub fn to_dynamic(&self) -> Dynamic {
        state_to_dynamic(&self.state)
    }

    pub fn from_dynamic(value: &Dynamic) -> Result<Self> {
        Ok(Self {
            state: state_from_dynamic(value, "list")?,
        })
    }
}

impl<T: ElementType> FromIterator<T> for ListValue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Unordered collection. Duplicates collapse when the set is built; the
/// first occurrence of each element is kept.
#[derive(Debug, Clone)]
pub struct SetValue<T: ElementType> {
    state: State<T>,
}

impl<T: ElementType> SetValue<T> {
    pub fn null() -> Self {
        Self { state: State::Null }
    }

    pub fn unknown() -> Self {
        Self {
            state: State::Unknown,
        }
    }

    pub fn new(elements: Vec<T>) -> Self {
        let mut unique: Vec<T> = Vec::with_capacity(elements.len());
        for element in elements {
            if !unique.contains(&element) {
                unique.push(element);
            }
        }
        Self {
            state: State::Known(unique),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.state, State::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.state, State::Unknown)
    }

    pub fn elements(&self) -> Option<&[T]> {
        match &self.state {
            State::Known(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn into_elements(self) -> Option<Vec<T>> {
        match self.state {
            State::Known(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn contains(&self, element: &T) -> bool {
        self.elements().is_some_and(|e| e.contains(element))
    }

    pub fn len(&self) -> usize {
        self.elements().map_or(0, <[T]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> AttributeType {
        T::attribute_type()
    }

    pub fn attribute_type(&self) -> AttributeType {
        AttributeType::set_of(T::attribute_type())
    }

    pub fn to_dynamic(&self) -> Dynamic {
        state_to_dynamic(&self.state)
    }

    pub fn from_dynamic(value: &Dynamic) -> Result<Self> {
        Ok(match state_from_dynamic(value, "set")? {
            State::Known(elements) => Self::new(elements),
            State::Null => Self::null(),
            State::Unknown => Self::unknown(),
        })
    }
}

impl<T: ElementType> PartialEq for SetValue<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (State::Known(a), State::Known(b)) => {
                a.len() == b.len() && a.iter().all(|e| b.contains(e))
            }
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl<T: ElementType> FromIterator<T> for SetValue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn state_to_dynamic<T: ElementType>(state: &State<T>) -> Dynamic {
    match state {
        State::Null => Dynamic::Null,
        State::Unknown => Dynamic::Unknown,
        State::Known(elements) => Dynamic::List(elements.iter().map(T::to_dynamic).collect()),
    }
}

fn state_from_dynamic<T: ElementType>(value: &Dynamic, kind: &str) -> Result<State<T>> {
    match value {
        Dynamic::Null => Ok(State::Null),
        Dynamic::Unknown => Ok(State::Unknown),
        Dynamic::List(items) => items
            .iter()
            .map(T::from_dynamic)
            .collect::<Result<Vec<_>>>()
            .map(State::Known),
        other => Err(TfplugError::TypeMismatch {
            expected: kind.to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn null_list_keeps_element_type() {
        let list = ListValue::<String>::null();
        assert!(list.is_null());
        assert_eq!(list.element_type(), AttributeType::String);
        assert_eq!(list.attribute_type(), AttributeType::list_of(AttributeType::String));
        assert_eq!(list.to_dynamic(), Dynamic::Null);
        assert!(list.elements().is_none());
    }

    #[test]
    fn known_empty_list_is_not_null() {
        let list = ListValue::<String>::new(Vec::new());
        assert!(!list.is_null());
        assert_eq!(list.elements(), Some(&[][..]));
        assert_ne!(list, ListValue::null());
    }

    #[test]
    fn list_keeps_order_and_duplicates() {
        let list = ListValue::new(strings(&["b", "a", "b"]));
        assert_eq!(list.elements().unwrap(), strings(&["b", "a", "b"]).as_slice());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn set_collapses_duplicates_keeping_first() {
        let set = SetValue::new(strings(&["x", "y", "x"]));
        assert_eq!(set.elements().unwrap(), strings(&["x", "y"]).as_slice());
        assert!(set.contains(&"y".to_string()));
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = SetValue::new(strings(&["x", "y"]));
        let b = SetValue::new(strings(&["y", "x"]));
        assert_eq!(a, b);
        assert_ne!(a, SetValue::new(strings(&["x"])));
        assert_ne!(SetValue::<String>::null(), SetValue::unknown());
        assert_eq!(SetValue::<String>::null(), SetValue::null());
    }

    #[test]
    fn list_from_dynamic_reads_elements() {
        let value = Dynamic::List(vec![Dynamic::Number(1.0), Dynamic::Number(2.0)]);
        let list = ListValue::<i64>::from_dynamic(&value).unwrap();
        assert_eq!(list.elements(), Some(&[1, 2][..]));
        assert_eq!(list.to_dynamic(), value);
    }

    #[test]
    fn from_dynamic_rejects_wrong_element_type() {
        let value = Dynamic::List(vec![Dynamic::Bool(true)]);
        let err = ListValue::<String>::from_dynamic(&value).unwrap_err();
        assert!(matches!(err, TfplugError::TypeMismatch { .. }));

        let err = SetValue::<String>::from_dynamic(&Dynamic::String("x".into())).unwrap_err();
        assert!(err.to_string().contains("expected set"));
    }

    #[test]
    fn from_dynamic_preserves_null_and_unknown() {
        assert!(ListValue::<bool>::from_dynamic(&Dynamic::Null).unwrap().is_null());
        assert!(SetValue::<bool>::from_dynamic(&Dynamic::Unknown)
            .unwrap()
            .is_unknown());
    }

    #[test]
    fn fractional_numbers_are_not_integers() {
        assert!(i64::from_dynamic(&Dynamic::Number(1.5)).is_err());
        assert_eq!(i64::from_dynamic(&Dynamic::Number(30.0)).unwrap(), 30);
    }
}
