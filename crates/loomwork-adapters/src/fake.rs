use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
  EmailAdapter, EmailRequest, EmailResponse, EmailSettings, SmsAdapter, SmsRequest, SmsResponse,
  SmsSettings,
};

/// In-memory SMS adapter for tests. Always succeeds unless configured to
/// fail the next N calls, which exercises the executor's retry path.
#[derive(Default)]
pub struct FakeSmsAdapter {
  pub sent: Mutex<Vec<SmsRequest>>,
  pub fail_next_calls: Mutex<u32>,
}

impl FakeSmsAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn fail_next(&self, n: u32) {
    *self.fail_next_calls.lock().await = n;
  }

  pub async fn sent_count(&self) -> usize {
    self.sent.lock().await.len()
  }
}

#[async_trait]
impl SmsAdapter for FakeSmsAdapter {
  async fn send_sms(&self, _settings: &SmsSettings, req: SmsRequest) -> anyhow::Result<SmsResponse> {
    {
      let mut remaining = self.fail_next_calls.lock().await;
      if *remaining > 0 {
        *remaining -= 1;
        anyhow::bail!("simulated provider outage");
      }
    }
    self.sent.lock().await.push(req);
    Ok(SmsResponse {
      success: true,
      sid: Some(format!("SM{:x}", rand_suffix())),
      error: None,
      error_code: None,
    })
  }
}

/// In-memory email adapter for tests.
#[derive(Default)]
pub struct FakeEmailAdapter {
  pub sent: Mutex<Vec<EmailRequest>>,
  pub fail_next_calls: Mutex<u32>,
}

impl FakeEmailAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn fail_next(&self, n: u32) {
    *self.fail_next_calls.lock().await = n;
  }

  pub async fn sent_count(&self) -> usize {
    self.sent.lock().await.len()
  }
}

#[async_trait]
impl EmailAdapter for FakeEmailAdapter {
  async fn send_email(
    &self,
    _settings: &EmailSettings,
    req: EmailRequest,
  ) -> anyhow::Result<EmailResponse> {
    {
      let mut remaining = self.fail_next_calls.lock().await;
      if *remaining > 0 {
        *remaining -= 1;
        anyhow::bail!("simulated provider outage");
      }
    }
    self.sent.lock().await.push(req);
    Ok(EmailResponse {
      success: true,
      message_id: Some(format!("msg-{:x}", rand_suffix())),
      error: None,
    })
  }
}

/// A cheap, dependency-free distinguishing suffix for fake provider ids.
/// Not used for anything security-sensitive.
fn rand_suffix() -> u64 {
  use std::time::{SystemTime, UNIX_EPOCH};
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.subsec_nanos() as u64)
    .unwrap_or(0)
}
