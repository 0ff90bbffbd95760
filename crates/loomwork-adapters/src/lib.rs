//! SMS and email provider capability interfaces.
//!
//! These are out-of-scope external collaborators — only their interfaces
//! are specified here, plus in-memory fakes useful for tests and for
//! exercising the engine without a real provider wired up.

mod fake;

pub use fake::{FakeEmailAdapter, FakeSmsAdapter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Twilio-equivalent settings for the SMS adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsSettings {
  pub account_sid: String,
  pub auth_token: String,
  pub phone_number: String,
}

/// SendGrid-equivalent settings for the email adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
  pub api_key: String,
  pub from_email: String,
  pub from_name: String,
}

#[derive(Debug, Clone)]
pub struct SmsRequest {
  pub to: String,
  pub body: String,
  pub from: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SmsResponse {
  pub success: bool,
  pub sid: Option<String>,
  pub error: Option<String>,
  pub error_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailAddress {
  pub email: String,
  pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailRequest {
  pub to: String,
  pub subject: String,
  pub body: String,
  pub from: EmailAddress,
}

#[derive(Debug, Clone, Default)]
pub struct EmailResponse {
  pub success: bool,
  pub message_id: Option<String>,
  pub error: Option<String>,
}

/// Capability to send an SMS. Failures are returned as `SmsResponse { success: false, .. }`,
/// not as `Err` — these are non-retryable within a batch; only
/// a thrown error (connection failure, panic-worthy provider outage) should
/// surface as `Err`, which the Executor Core's retry logic handles.
#[async_trait]
pub trait SmsAdapter: Send + Sync {
  async fn send_sms(&self, settings: &SmsSettings, req: SmsRequest) -> anyhow::Result<SmsResponse>;
}

#[async_trait]
pub trait EmailAdapter: Send + Sync {
  async fn send_email(
    &self,
    settings: &EmailSettings,
    req: EmailRequest,
  ) -> anyhow::Result<EmailResponse>;
}
