//! Outbound payment-provider calls.
//!
//! The router is generic over [`PaymentGateway`] so request handlers can be
//! exercised without the network; [`HttpGateway`] is the production
//! implementation speaking to the card provider and PayPal over REST.

use std::future::Future;

use serde::Deserialize;
use serde_json::json;

/// Fixed price of the PayPal coin bundle, in USD.
const COIN_BUNDLE_PRICE: &str = "100.00";

// ─── Gateway trait ───────────────────────────────────────────────────────────

/// A freshly created card payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct CardIntent {
  pub id:            String,
  pub client_secret: String,
}

/// A freshly created PayPal order, along with the OAuth token used to create
/// it so the client can continue the flow.
#[derive(Debug, Clone)]
pub struct PaypalOrder {
  pub access_token: String,
  pub order:        serde_json::Value,
}

/// The payment-provider operations the API needs.
pub trait PaymentGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a card payment intent for `amount_cents` USD cents and return
  /// its client secret.
  fn create_card_intent(
    &self,
    amount_cents: i64,
  ) -> impl Future<Output = Result<CardIntent, Self::Error>> + Send + '_;

  /// Create a PayPal order for the fixed coin bundle.
  fn create_paypal_order(
    &self,
  ) -> impl Future<Output = Result<PaypalOrder, Self::Error>> + Send + '_;
}

// ─── HTTP implementation ─────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
  #[error("provider rejected the request with status {status}: {body}")]
  Rejected { status: u16, body: String },
}

/// Endpoints and credentials for both providers.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub card_api_base:        String,
  pub card_secret_key:      String,
  pub paypal_api_base:      String,
  pub paypal_client_id:     String,
  pub paypal_client_secret: String,
  pub paypal_return_base:   String,
  pub paypal_brand_name:    String,
}

/// [`PaymentGateway`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpGateway {
  client: reqwest::Client,
  config: GatewayConfig,
}

#[derive(Deserialize)]
struct OauthToken {
  access_token: String,
}

/// Reject non-success responses, carrying the provider's body for the log.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
  let status = resp.status();
  if !status.is_success() {
    let body = resp.text().await.unwrap_or_default();
    return Err(GatewayError::Rejected {
      status: status.as_u16(),
      body,
    });
  }
  Ok(resp)
}

impl HttpGateway {
  pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
    let client = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  async fn oauth_token(&self) -> Result<OauthToken, GatewayError> {
    let url = format!(
      "{}/v1/oauth2/token",
      self.config.paypal_api_base.trim_end_matches('/')
    );
    let resp = self
      .client
      .post(url)
      .basic_auth(
        &self.config.paypal_client_id,
        Some(&self.config.paypal_client_secret),
      )
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }
}

impl PaymentGateway for HttpGateway {
  type Error = GatewayError;

  async fn create_card_intent(
    &self,
    amount_cents: i64,
  ) -> Result<CardIntent, GatewayError> {
    let url = format!(
      "{}/v1/payment_intents",
      self.config.card_api_base.trim_end_matches('/')
    );
    let resp = self
      .client
      .post(url)
      .bearer_auth(&self.config.card_secret_key)
      .form(&[
        ("amount", amount_cents.to_string()),
        ("currency", "usd".to_string()),
        ("payment_method_types[]", "card".to_string()),
      ])
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  async fn create_paypal_order(&self) -> Result<PaypalOrder, GatewayError> {
    let token = self.oauth_token().await?;

    let return_base = self.config.paypal_return_base.trim_end_matches('/');
    let body = json!({
      "intent": "CAPTURE",
      "purchase_units": [{
        "items": [{
          "name":        "nanoworks coin bundle",
          "description": "Coin top-up for the nanoworks marketplace",
          "quantity":    1,
          "unit_amount": { "currency_code": "USD", "value": COIN_BUNDLE_PRICE },
        }],
        "amount": {
          "currency_code": "USD",
          "value":         COIN_BUNDLE_PRICE,
          "breakdown": {
            "item_total": { "currency_code": "USD", "value": COIN_BUNDLE_PRICE },
          },
        },
      }],
      "application_context": {
        "return_url":          format!("{return_base}/complete-order"),
        "cancel_url":          format!("{return_base}/cancel-order"),
        "shipping_preference": "NO_SHIPPING",
        "user_action":         "PAY_NOW",
        "brand_name":          self.config.paypal_brand_name,
      },
    });

    let url = format!(
      "{}/v2/checkout/orders",
      self.config.paypal_api_base.trim_end_matches('/')
    );
    let resp = self
      .client
      .post(url)
      .bearer_auth(&token.access_token)
      .json(&body)
      .send()
      .await?;
    let order = check(resp).await?.json().await?;

    Ok(PaypalOrder {
      access_token: token.access_token,
      order,
    })
  }
}
