//! Gateway-neutral request and payment types.
//!
//! [`Payment`] mirrors the subset of the Mercado Pago payment resource we
//! read. The gateway is inconsistent about whether ids, quantities and
//! prices arrive as strings or numbers, so those fields accept both.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use vitaforge_core::{CartItem, OrderId, UserId};

/// What checkout asks the gateway for.
#[derive(Debug, Clone)]
pub struct PreferenceRequest {
    pub items: Vec<CartItem>,
    pub user_id: UserId,
    /// Absent for preference-only checkouts.
    pub order_id: Option<OrderId>,
}

/// A created checkout preference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preference {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    /// Hosted checkout URL the customer is redirected to.
    pub init_point: String,
}

/// Payment status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(other)]
    Unknown,
}

impl GatewayPaymentStatus {
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// A gateway payment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    pub status: GatewayPaymentStatus,
    #[serde(deserialize_with = "lenient::decimal")]
    pub transaction_amount: Decimal,
    pub currency_id: String,
    /// Whatever we attached to the preference, echoed back verbatim.
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub additional_info: Option<AdditionalInfo>,
}

impl Payment {
    /// Line items echoed back by the gateway, as cart items.
    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.additional_info
            .as_ref()
            .map(|info| {
                info.items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| item.to_cart_item(index))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdditionalInfo {
    #[serde(default)]
    pub items: Vec<PaymentItem>,
}

/// A line item as echoed in `additional_info.items`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentItem {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(deserialize_with = "lenient::quantity")]
    pub quantity: u32,
    #[serde(deserialize_with = "lenient::decimal")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub picture_url: Option<String>,
}

impl PaymentItem {
    fn to_cart_item(&self, index: usize) -> CartItem {
        CartItem {
            id: self
                .id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("item-{}", index + 1)),
            name: self.title.clone(),
            price: self.unit_price,
            quantity: self.quantity.max(1),
            image: self.picture_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

mod lenient {
    use super::{Decimal, Deserialize, Deserializer, FromStr};
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Num(serde_json::Number),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Self::Str(s) => s,
                Self::Num(n) => n.to_string(),
            }
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Scalar::deserialize(d)?.into_string())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
    }

    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let raw = Scalar::deserialize(d)?.into_string();
        let raw = raw.trim();
        Decimal::from_str(raw)
            .or_else(|_| Decimal::from_scientific(raw))
            .map_err(|_| D::Error::custom(format!("invalid amount: {raw}")))
    }

    pub fn quantity<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let raw = Scalar::deserialize(d)?.into_string();
        raw.trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid quantity: {raw}")))
    }
}
