//! HTTP implementation of [`CommerceApi`].
//!
//! Thin JSON client over the storefront's API routes. Transport and status
//! handling only; retry/backoff policy belongs to the caller (and the
//! checkout flow deliberately has none - see the crate docs on the charge
//! boundary).

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use url::Url;

use marigold_core::{Email, OrderId};

use crate::address::Address;
use crate::order::Order;
use crate::session::Session;

use super::{
    ApiError, CardFields, ChargeItem, ChargeReceipt, ChargeRequest, CommerceApi, Credentials,
    EmailAvailability, PaymentIntent, PaymentToken, PromoValidation,
};

/// JSON client for the storefront API.
#[derive(Clone)]
pub struct HttpCommerceApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCommerceApi {
    /// Create a client against an API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        auth_token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn post_unit(
        &self,
        path: &str,
        body: &serde_json::Value,
        auth_token: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(token) = auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

impl CommerceApi for HttpCommerceApi {
    async fn check_email_available(&self, email: &Email) -> Result<EmailAvailability, ApiError> {
        self.post_json(
            "/api/check-email",
            &serde_json::json!({ "email": email }),
            None,
        )
        .await
    }

    async fn validate_promo(&self, code: &str) -> Result<PromoValidation, ApiError> {
        self.post_json(
            "/api/validate-promo",
            &serde_json::json!({ "code": code }),
            None,
        )
        .await
    }

    async fn create_payment_intent(
        &self,
        items: &[ChargeItem],
        promo_code: Option<&str>,
    ) -> Result<PaymentIntent, ApiError> {
        self.post_json(
            "/api/payment-intent",
            &serde_json::json!({ "items": items, "promo_code": promo_code }),
            None,
        )
        .await
    }

    async fn tokenize_card(&self, card: &CardFields) -> Result<PaymentToken, ApiError> {
        self.post_json("/api/payment-method", &serde_json::json!(card), None)
            .await
    }

    async fn process_payment(&self, request: &ChargeRequest) -> Result<ChargeReceipt, ApiError> {
        self.post_json("/api/charge", &serde_json::json!(request), None)
            .await
    }

    async fn create_order(&self, order: &Order) -> Result<(), ApiError> {
        self.post_unit("/api/orders", &serde_json::json!(order), None)
            .await
    }

    async fn update_user_addresses(
        &self,
        auth_token: &str,
        addresses: &[Address],
    ) -> Result<(), ApiError> {
        self.post_unit(
            "/api/account/addresses",
            &serde_json::json!({ "addresses": addresses }),
            Some(auth_token),
        )
        .await
    }

    async fn send_order_confirmation(
        &self,
        email: &Email,
        order_id: OrderId,
    ) -> Result<(), ApiError> {
        self.post_unit(
            "/api/order-confirmation",
            &serde_json::json!({ "email": email, "order_id": order_id }),
            None,
        )
        .await
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.post_json("/api/auth/login", &serde_json::json!(credentials), None)
            .await
    }

    async fn register(&self, credentials: &Credentials) -> Result<Session, ApiError> {
        self.post_json("/api/auth/register", &serde_json::json!(credentials), None)
            .await
    }
}
