//! Parsing of the ids we attach to checkout preferences.
//!
//! Mercado Pago echoes preference metadata back on the payment, but it
//! rewrites keys to snake_case and may turn our string ids into numbers.
//! Both spellings and both representations are accepted.

use serde_json::Value;
use thiserror::Error;

use vitaforge_core::{OrderId, UserId};

/// Ids recovered from payment metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentMetadata {
    pub user_id: UserId,
    /// Absent for preference-only checkouts.
    pub order_id: Option<OrderId>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("payment metadata has no user id")]
    Missing,

    #[error("payment metadata field {field} is invalid: {value}")]
    Invalid { field: &'static str, value: String },
}

impl PaymentMetadata {
    /// Parse metadata from a payment.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Missing`] when there is no user id and
    /// [`MetadataError::Invalid`] when an id is present but not an integer.
    pub fn parse(metadata: &Value) -> Result<Self, MetadataError> {
        let user_id = lookup(metadata, "userId", "user_id")
            .map(|value| parse_id(value, "userId"))
            .transpose()?
            .ok_or(MetadataError::Missing)?;

        let order_id = lookup(metadata, "orderId", "order_id")
            .map(|value| parse_id(value, "orderId"))
            .transpose()?;

        Ok(Self {
            user_id: UserId::new(user_id),
            order_id: order_id.map(OrderId::new),
        })
    }
}

/// First non-null, non-empty value under either key.
fn lookup<'a>(metadata: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    [camel, snake]
        .into_iter()
        .filter_map(|key| metadata.get(key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn parse_id(value: &Value, field: &'static str) -> Result<i32, MetadataError> {
    let invalid = || MetadataError::Invalid {
        field,
        value: value.to_string(),
    };

    match value {
        Value::String(s) => s.trim().parse().map_err(|_| invalid()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_camel_case_strings() {
        let parsed = PaymentMetadata::parse(&json!({"userId": "7", "orderId": "42"})).unwrap();
        assert_eq!(parsed.user_id, UserId::new(7));
        assert_eq!(parsed.order_id, Some(OrderId::new(42)));
    }

    #[test]
    fn test_parse_snake_case_numbers() {
        let parsed = PaymentMetadata::parse(&json!({"user_id": 7, "order_id": 42})).unwrap();
        assert_eq!(parsed.user_id, UserId::new(7));
        assert_eq!(parsed.order_id, Some(OrderId::new(42)));
    }

    #[test]
    fn test_parse_without_order() {
        let parsed = PaymentMetadata::parse(&json!({"user_id": "7"})).unwrap();
        assert_eq!(parsed.order_id, None);

        let parsed = PaymentMetadata::parse(&json!({"userId": "7", "orderId": ""})).unwrap();
        assert_eq!(parsed.order_id, None);
    }

    #[test]
    fn test_missing_user() {
        assert_eq!(
            PaymentMetadata::parse(&json!({"orderId": "42"})),
            Err(MetadataError::Missing)
        );
        assert_eq!(
            PaymentMetadata::parse(&Value::Null),
            Err(MetadataError::Missing)
        );
        assert_eq!(
            PaymentMetadata::parse(&json!({"user_id": null})),
            Err(MetadataError::Missing)
        );
    }

    #[test]
    fn test_invalid_ids() {
        assert!(matches!(
            PaymentMetadata::parse(&json!({"userId": "abc"})),
            Err(MetadataError::Invalid { field: "userId", .. })
        ));
        assert!(matches!(
            PaymentMetadata::parse(&json!({"userId": 7, "orderId": 1.5})),
            Err(MetadataError::Invalid { field: "orderId", .. })
        ));
    }
}
