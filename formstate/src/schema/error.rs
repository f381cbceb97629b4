use thiserror::Error;

/// Errors raised while resolving or interpreting a schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A `$ref` does not resolve inside the definitions table.
    #[error("could not find a definition for {reference}")]
    MissingDefinition { reference: String },

    /// A `$ref` chain leads back to a reference it is already resolving.
    #[error("circular reference detected while resolving {reference}")]
    CircularReference { reference: String },

    /// A schema node has the wrong shape.
    #[error("invalid schema at {path}: expected {expected}, found {actual}")]
    InvalidSchema {
        path: String,
        expected: String,
        actual: String,
    },

    /// A schema was used as a constant but has neither `const` nor a single `enum` value.
    #[error("schema cannot be inferred as a constant")]
    NotConstant,

    /// An explicit order list leaves declared properties out and has no wildcard.
    #[error("order list does not contain {}", describe_properties(.properties))]
    OrderMissing { properties: Vec<String> },

    /// An explicit order list has more than one `*` entry.
    #[error("order list contains more than one wildcard item")]
    OrderWildcard,
}

fn describe_properties(properties: &[String]) -> String {
    if properties.len() > 1 {
        format!("properties '{}'", properties.join("', '"))
    } else {
        format!("property '{}'", properties.first().map(String::as_str).unwrap_or_default())
    }
}

impl SchemaError {
    pub(crate) fn missing(reference: &str) -> Self {
        SchemaError::MissingDefinition {
            reference: reference.to_string(),
        }
    }

    pub(crate) fn invalid(path: &str, expected: &str, actual: &serde_json::Value) -> Self {
        SchemaError::InvalidSchema {
            path: path.to_string(),
            expected: expected.to_string(),
            actual: format!("{actual}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_missing_message() {
        let one = SchemaError::OrderMissing {
            properties: vec!["foo".into()],
        };
        assert_eq!(one.to_string(), "order list does not contain property 'foo'");

        let many = SchemaError::OrderMissing {
            properties: vec!["foo".into(), "bar".into()],
        };
        assert_eq!(
            many.to_string(),
            "order list does not contain properties 'foo', 'bar'"
        );
    }
}
