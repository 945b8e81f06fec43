//! Request schemas. Bodies are parsed and validated here, before any
//! service sees them.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::domain::aggregates::{NewProduct, ProductFilter, ProductPatch};
use crate::domain::value_objects::{Price, Quantity, Username};
use crate::error::ApiError;

/// JSON body checked with `validator`. An empty body reads as `{}`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) { b"{}" } else { &bytes };
        let value: T = serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))?;
        value.validate().map_err(|e| ApiError::Validation(describe(&e)))?;
        Ok(Self(value))
    }
}

/// One sentence per failing field, in field order.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .map(|(field, errs)| match errs.iter().find_map(|e| e.message.as_ref()) {
            Some(message) => message.to_string(),
            None => format!("{field} is invalid"),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, max = 50, message = "username must be 1 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl Credentials {
    pub fn username(&self) -> Result<Username, ApiError> {
        Username::new(self.username.as_str()).map_err(|e| ApiError::Validation(e.to_string()))
    }
}

fn price(amount: Decimal) -> Result<Price, ApiError> {
    Price::new(amount).map_err(|e| ApiError::Validation(e.to_string()))
}

fn quantity(raw: i64) -> Result<Quantity, ApiError> {
    Quantity::try_from(raw).map_err(|e| ApiError::Validation(e.to_string()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSweetRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    pub price: Decimal,
    pub quantity: i64,
    pub image: Option<String>,
}

impl CreateSweetRequest {
    pub fn into_new_product(self) -> Result<NewProduct, ApiError> {
        Ok(NewProduct {
            price: price(self.price)?,
            quantity: quantity(self.quantity)?,
            name: self.name,
            category: self.category,
            image: self.image,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSweetRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub image: Option<String>,
}

impl UpdateSweetRequest {
    pub fn into_patch(self) -> Result<ProductPatch, ApiError> {
        Ok(ProductPatch {
            price: self.price.map(price).transpose()?,
            quantity: self.quantity.map(quantity).transpose()?,
            name: self.name,
            category: self.category,
            image: self.image,
        })
    }
}

/// Body of purchase and restock calls.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StockRequest {
    pub quantity: Option<i64>,
}

impl StockRequest {
    /// `None` for an absent or zero quantity; callers default that to one unit.
    pub fn quantity(&self) -> Result<Option<Quantity>, ApiError> {
        match self.quantity {
            None | Some(0) => Ok(None),
            Some(n) => quantity(n).map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn bound(name: &str, value: Option<String>) -> Result<Option<Decimal>, ApiError> {
    non_empty(value)
        .map(|v| v.trim().parse::<Decimal>().map_err(|_| ApiError::Validation(format!("{name} must be a number"))))
        .transpose()
}

impl SearchParams {
    pub fn into_filter(self) -> Result<ProductFilter, ApiError> {
        Ok(ProductFilter {
            min_price: bound("minPrice", self.min_price)?,
            max_price: bound("maxPrice", self.max_price)?,
            name_contains: non_empty(self.q),
            category: non_empty(self.category),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_request_defaults() {
        assert_eq!(StockRequest::default().quantity().unwrap(), None);
        assert_eq!(StockRequest { quantity: Some(0) }.quantity().unwrap(), None);
        assert_eq!(StockRequest { quantity: Some(3) }.quantity().unwrap(), Some(Quantity::new(3)));
        assert!(StockRequest { quantity: Some(-1) }.quantity().is_err());
        assert!(StockRequest { quantity: Some(i64::MAX) }.quantity().is_err());
    }

    #[test]
    fn search_params_ignore_blanks() {
        let filter = SearchParams { q: Some("".into()), category: Some("Hard".into()), min_price: Some(" ".into()), max_price: Some("2.5".into()) }
            .into_filter()
            .unwrap();
        assert!(filter.name_contains.is_none());
        assert!(filter.min_price.is_none());
        assert_eq!(filter.category.as_deref(), Some("Hard"));
        assert_eq!(filter.max_price, Some(Decimal::new(25, 1)));
        assert!(SearchParams { min_price: Some("cheap".into()), ..Default::default() }.into_filter().is_err());
    }

    #[test]
    fn create_request_rejects_negative_price() {
        let req: CreateSweetRequest = serde_json::from_str(r#"{"name":"Gum","category":"Chewy","price":-1,"quantity":2}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(matches!(req.into_new_product(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_request_requires_fields() {
        assert!(serde_json::from_str::<CreateSweetRequest>(r#"{"name":"Gum"}"#).is_err());
        let blank: CreateSweetRequest = serde_json::from_str(r#"{"name":"","category":"","price":1,"quantity":2}"#).unwrap();
        let errors = blank.validate().unwrap_err();
        assert_eq!(describe(&errors), "category is required; name is required");
    }

    #[test]
    fn credential_errors_read_as_sentences() {
        let creds = Credentials { username: String::new(), password: "pw".into() };
        assert_eq!(describe(&creds.validate().unwrap_err()), "username must be 1 to 50 characters");
    }
}
