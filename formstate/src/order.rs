//! Property ordering.

use crate::{context::SchemaContext, schema::SchemaError};

const WILDCARD: &str = "*";

/// Arrange `properties` according to an explicit `order` list.
///
/// Without a list the declaration order is kept. Names in the list that are
/// not properties are dropped with a warning. A single `*` stands for every
/// property the list does not mention, in declaration order.
///
/// # Errors
///
/// [`SchemaError::OrderMissing`] when the list has no `*` and leaves out some
/// properties, [`SchemaError::OrderWildcard`] when it has more than one `*`.
pub fn order_properties(
    cx: &SchemaContext<'_>,
    properties: &[String],
    order: Option<&[String]>,
) -> Result<Vec<String>, SchemaError> {
    let Some(order) = order else {
        return Ok(properties.to_vec());
    };

    let mut filtered: Vec<&str> = Vec::with_capacity(order.len());
    let mut unknown: Vec<&str> = Vec::new();
    for name in order {
        if name == WILDCARD || properties.contains(name) {
            filtered.push(name);
        } else {
            unknown.push(name);
        }
    }
    if !unknown.is_empty() {
        cx.warn(&format!(
            "order list contains unknown properties: {}",
            unknown.join(", ")
        ));
    }

    let rest: Vec<&str> = properties
        .iter()
        .map(String::as_str)
        .filter(|p| !filtered.contains(p))
        .collect();

    let wildcards: Vec<usize> = filtered
        .iter()
        .enumerate()
        .filter(|(_, name)| **name == WILDCARD)
        .map(|(i, _)| i)
        .collect();

    match wildcards.as_slice() {
        [] if rest.is_empty() => Ok(filtered.into_iter().map(str::to_string).collect()),
        [] => Err(SchemaError::OrderMissing {
            properties: rest.into_iter().map(str::to_string).collect(),
        }),
        [at] => {
            let mut complete = filtered;
            complete.splice(*at..=*at, rest);
            Ok(complete.into_iter().map(str::to_string).collect())
        }
        _ => Err(SchemaError::OrderWildcard),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_order_keeps_declaration() {
        let cx = SchemaContext::default();
        let props = names(&["a", "b", "c"]);
        assert_eq!(order_properties(&cx, &props, None).unwrap(), props);
    }

    #[test]
    fn test_full_order() {
        let cx = SchemaContext::default();
        let props = names(&["a", "b", "c"]);
        let order = names(&["c", "a", "b"]);
        assert_eq!(order_properties(&cx, &props, Some(&order)).unwrap(), order);
    }

    #[test]
    fn test_wildcard_expands_rest() {
        let cx = SchemaContext::default();
        let props = names(&["a", "b", "c", "d"]);
        let order = names(&["d", "*", "a"]);
        assert_eq!(
            order_properties(&cx, &props, Some(&order)).unwrap(),
            names(&["d", "b", "c", "a"])
        );
    }

    #[test]
    fn test_missing_properties_is_error() {
        let cx = SchemaContext::default();
        let props = names(&["a", "b", "c"]);
        let order = names(&["a"]);
        let err = order_properties(&cx, &props, Some(&order)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::OrderMissing {
                properties: names(&["b", "c"])
            }
        );
        assert_eq!(
            err.to_string(),
            "order list does not contain properties 'b', 'c'"
        );
    }

    #[test]
    fn test_multiple_wildcards_is_error() {
        let cx = SchemaContext::default();
        let props = names(&["a", "b"]);
        let order = names(&["*", "a", "*"]);
        assert_eq!(
            order_properties(&cx, &props, Some(&order)).unwrap_err(),
            SchemaError::OrderWildcard
        );
    }

    #[test]
    fn test_unknown_names_dropped_with_warning() {
        let seen = Mutex::new(Vec::new());
        let sink = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        let cx = SchemaContext::default().with_diagnostics(&sink);

        let props = names(&["a", "b"]);
        let order = names(&["b", "ghost", "*"]);
        assert_eq!(
            order_properties(&cx, &props, Some(&order)).unwrap(),
            names(&["b", "a"])
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("ghost"));
    }
}
