//! Request identity extraction.
//!
//! Authentication happens upstream; this layer trusts the identity headers it is
//! given. A request with `x-user-id` is an authenticated account, anything else is a
//! guest, optionally carrying a guest cart token. Extraction only reads: the account's
//! customer record is created or linked by the handlers that change state.

use super::AppState;
use crate::core::customer::{self, Principal};
use crate::core::guest::GuestCartToken;
use crate::entities::customer as customer_entity;
use crate::errors::{Error, Result};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};

/// Header carrying the authenticated user's id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's email
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the authenticated user's display name
pub const USER_NAME_HEADER: &str = "x-user-name";
/// Header carrying the guest cart token, in requests and responses
pub const GUEST_CART_HEADER: &str = "x-guest-cart";

/// The shopper behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shopper {
    /// Authenticated shopper and their customer record, if one is linked yet
    Account {
        /// Identity from the upstream headers
        principal: Principal,
        /// Customer linked to the principal
        customer: Option<customer_entity::Model>,
    },
    /// Anonymous shopper and their cart token, if they have one yet
    Guest(Option<GuestCartToken>),
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl FromRequestParts<AppState> for Shopper {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        if let Some(shopper) = parts.extensions.get::<Self>() {
            return Ok(shopper.clone());
        }

        let headers = &parts.headers;
        let shopper = if let Some(user_id) = header_value(headers, USER_ID_HEADER) {
            let email = header_value(headers, USER_EMAIL_HEADER).ok_or_else(|| {
                Error::invalid_input(format!("{USER_EMAIL_HEADER} is required with {USER_ID_HEADER}"))
            })?;
            let principal = Principal {
                user_id: user_id.to_string(),
                email: email.to_string(),
                name: header_value(headers, USER_NAME_HEADER).map(str::to_string),
            };
            let customer = customer::find_account(state.db(), &principal).await?;
            Self::Account {
                principal,
                customer,
            }
        } else {
            let token = header_value(headers, GUEST_CART_HEADER)
                .map(str::parse::<GuestCartToken>)
                .transpose()?;
            Self::Guest(token)
        };

        parts.extensions.insert(shopper.clone());
        Ok(shopper)
    }
}
