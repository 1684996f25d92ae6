//! Request body validation for customers and orders
//!
//! Fields are checked in declaration order and the first violation is
//! reported, with messages of the form `"<field>" <problem>`.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Minimum password length after trimming
pub const MIN_PASSWORD_LEN: usize = 6;

/// Raw customer creation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Customer fields that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCustomer {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Raw order creation request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    pub customer: Option<String>,
    pub product: Option<String>,
    pub quantity: Option<f64>,
    pub price: Option<f64>,
}

/// Order fields that passed validation
///
/// `customer` is only checked for presence here; ID format and existence
/// are checked by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidOrder {
    pub customer: String,
    pub product: String,
    pub quantity: u32,
    pub price: f64,
}

fn required(field: &str) -> Error {
    Error::bad_request(format!("\"{field}\" is required"))
}

/// Trimmed, non-empty string field
fn required_text(field: &str, value: Option<&str>) -> Result<String> {
    let value = value.ok_or_else(|| required(field))?.trim();
    if value.is_empty() {
        return Err(Error::bad_request(format!(
            "\"{field}\" is not allowed to be empty"
        )));
    }
    Ok(value.to_string())
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("Invalid regex pattern")
    });

    re.is_match(email)
}

impl NewCustomer {
    pub fn validate(&self) -> Result<ValidCustomer> {
        let name = required_text("name", self.name.as_deref())?;

        let email = required_text("email", self.email.as_deref())?;
        if !is_valid_email(&email) {
            return Err(Error::bad_request("\"email\" must be a valid email"));
        }

        let password = required_text("password", self.password.as_deref())?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::bad_request(format!(
                "\"password\" length must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        Ok(ValidCustomer {
            name,
            email,
            password,
        })
    }
}

impl NewOrder {
    pub fn validate(&self) -> Result<ValidOrder> {
        let customer = self
            .customer
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| required("customer"))?;

        let product = required_text("product", self.product.as_deref())?;

        let quantity = self.quantity.ok_or_else(|| required("quantity"))?;
        if quantity.fract() != 0.0 || !quantity.is_finite() {
            return Err(Error::bad_request("\"quantity\" must be an integer"));
        }
        if quantity < 1.0 {
            return Err(Error::bad_request(
                "\"quantity\" must be greater than or equal to 1",
            ));
        }
        if quantity > f64::from(u32::MAX) {
            return Err(Error::bad_request(format!(
                "\"quantity\" must be less than or equal to {}",
                u32::MAX
            )));
        }

        let price = self.price.ok_or_else(|| required("price"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(Error::bad_request(
                "\"price\" must be greater than or equal to 0",
            ));
        }

        Ok(ValidOrder {
            customer,
            product,
            quantity: quantity as u32,
            price: round_cents(price),
        })
    }
}

/// Round to two decimal places
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
