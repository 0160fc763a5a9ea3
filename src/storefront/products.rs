use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// What the backend echoes back for a newly created product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedProduct {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
struct ProductDetails {
    #[serde(default)]
    name: Option<String>,
    // DRF renders decimals as strings ("20.00")
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    is_active: Option<bool>,
}

impl CreatedProduct {
    /// `None` unless the response carries a usable identifier: a non-empty
    /// string or a non-zero number.
    pub fn from_response(body: &Value) -> Option<Self> {
        let id = match body.as_object()?.get("id")? {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(id) if id.as_f64().is_some_and(|n| n != 0.0) => id.to_string(),
            _ => return None,
        };
        let details: ProductDetails = serde_json::from_value(body.clone()).unwrap_or_default();
        Some(Self {
            id,
            name: details.name,
            price: details.price,
            is_active: details.is_active,
        })
    }
}
