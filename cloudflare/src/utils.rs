use tfplug::{ListValue, SetValue};

/// Converts strings into a list value. No input gives a null list rather
/// than an empty one, so unset arguments stay unset in state.
pub fn string_list<I, S>(values: I) -> ListValue<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let elements: Vec<String> = values.into_iter().map(Into::into).collect();
    if elements.is_empty() {
        return ListValue::null();
    }
    ListValue::new(elements)
}

/// Like [`string_list`] but for set attributes. Duplicates are left for the
/// set value itself to collapse.
pub fn string_set<I, S>(values: I) -> SetValue<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let elements: Vec<String> = values.into_iter().map(Into::into).collect();
    if elements.is_empty() {
        return SetValue::null();
    }
    SetValue::new(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfplug::{AttributeType, Dynamic};

    #[test]
    fn empty_input_gives_null_list() {
        let list = string_list(Vec::<String>::new());
        assert!(list.is_null());
        assert_eq!(list.element_type(), AttributeType::String);
        assert_eq!(list, string_list(Vec::<&str>::new()));
    }

    #[test]
    fn list_keeps_input_order() {
        let list = string_list(["a", "b", "c"]);
        assert!(!list.is_null());
        assert_eq!(list.elements().unwrap(), ["a", "b", "c"]);
    }

    #[test]
    fn list_keeps_duplicates() {
        let list = string_list(vec!["a".to_string(), "a".to_string()]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn empty_input_gives_null_set() {
        let set = string_set(std::iter::empty::<&str>());
        assert!(set.is_null());
        assert_eq!(set.attribute_type(), AttributeType::set_of(AttributeType::String));
    }

    #[test]
    fn set_holds_each_input() {
        let set = string_set(["x", "y"]);
        assert!(!set.is_null());
        assert_eq!(set.len(), 2);
        assert!(set.contains(&"x".to_string()));
        assert!(set.contains(&"y".to_string()));
        assert_eq!(set, string_set(["y", "x"]));
    }

    #[test]
    fn set_collapses_repeated_values() {
        let set = string_set(["x", "y", "x"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn extracting_a_converted_list_gives_back_the_input() {
        for len in 0..5 {
            let input: Vec<String> = (0..len).map(|i| format!("v{}", i % 2)).collect();
            let extracted = string_list(input.clone()).into_elements().unwrap_or_default();
            assert_eq!(extracted, input);
        }
    }

    #[test]
    fn converted_list_encodes_as_dynamic_list() {
        let list = string_list(["zone-a", "zone-b"]);
        assert_eq!(
            list.to_dynamic(),
            Dynamic::List(vec![
                Dynamic::String("zone-a".into()),
                Dynamic::String("zone-b".into())
            ])
        );
        assert_eq!(string_list(Vec::<String>::new()).to_dynamic(), Dynamic::Null);
    }
}
