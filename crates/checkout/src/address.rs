//! Shipping address model and validation.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Two-letter codes of the fixed US state enumeration (plus DC).
///
/// Address validation checks membership here; anything else is rejected at
/// the shipping step.
pub const US_STATE_CODES: [&str; 51] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM",
    "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA",
    "WV", "WI", "WY",
];

/// Minimum name length.
const MIN_NAME_LEN: usize = 2;
/// Minimum street length.
const MIN_STREET_LEN: usize = 3;
/// Minimum city length.
const MIN_CITY_LEN: usize = 2;
/// Exact zip length.
const ZIP_LEN: usize = 5;

/// A validated shipping address.
///
/// Only constructed through [`AddressForm::validate`] or returned by the
/// wallet express path (where the payment provider has already validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Recipient full name.
    pub name: String,
    /// Street line.
    pub street: String,
    /// Apartment/suite, optional.
    pub street2: Option<String>,
    /// City.
    pub city: String,
    /// Two-letter state code, uppercase.
    pub state: String,
    /// Five-digit zip.
    pub zip: String,
}

impl Address {
    /// Deduplication key for saved addresses: street + zip.
    ///
    /// Two entries with the same street and zip are the same address no
    /// matter how the name or city were typed.
    #[must_use]
    pub fn dedupe_key(&self) -> String {
        format!(
            "{}|{}",
            self.street.trim().to_lowercase(),
            self.zip.trim()
        )
    }
}

/// Raw address form input, as entered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    pub name: String,
    pub street: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressForm {
    /// Validate the form into an [`Address`].
    ///
    /// # Errors
    ///
    /// Returns the first failing field: name/street/city length minimums,
    /// state membership in [`US_STATE_CODES`], five-digit zip.
    pub fn validate(&self) -> Result<Address, FieldError> {
        let name = self.name.trim();
        if name.len() < MIN_NAME_LEN {
            return Err(FieldError::new("name", "please enter the recipient name"));
        }

        let street = self.street.trim();
        if street.len() < MIN_STREET_LEN {
            return Err(FieldError::new("street", "please enter a street address"));
        }

        let city = self.city.trim();
        if city.len() < MIN_CITY_LEN {
            return Err(FieldError::new("city", "please enter a city"));
        }

        let state = self.state.trim().to_uppercase();
        if !US_STATE_CODES.contains(&state.as_str()) {
            return Err(FieldError::new("state", "please select a state"));
        }

        let zip = self.zip.trim();
        if zip.len() != ZIP_LEN || !zip.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::new("zip", "zip code must be 5 digits"));
        }

        Ok(Address {
            name: name.to_owned(),
            street: street.to_owned(),
            street2: self
                .street2
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            city: city.to_owned(),
            state,
            zip: zip.to_owned(),
        })
    }
}
