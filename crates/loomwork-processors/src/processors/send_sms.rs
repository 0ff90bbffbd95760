use async_trait::async_trait;
use chrono::Utc;
use loomwork_adapters::{SmsRequest, SmsSettings};
use loomwork_model::{Channel, MessageDirection, MessageStatus, Node, NodeKind};
use loomwork_store::Message;
use tracing::{info, warn};
use uuid::Uuid;

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::{append_sent_message_id, successor};
use crate::step::StepResult;
use crate::template::{placeholder_map, substitute};

/// Short-circuits (skip, no error) if the contact lacks a phone or has
/// `do_not_contact` set. Fails fatally if the SMS settings are unconfigured
/// or the template can't be found. Otherwise sends, persisting a `queued`
/// message before dispatch and a `sent`/failed` update after — a single
/// internal retry absorbs a transient provider error before the failure is
/// recorded as a soft, observational one.
pub struct SendSmsProcessor;

#[async_trait]
impl NodeProcessor for SendSmsProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::SendSms {
      template_id,
      from_number_override,
      ..
    } = &node.kind
    else {
      unreachable!("registry dispatches by node type");
    };

    let next_node_id = successor(&ctx.workflow, &node.node_id, None);

    if ctx.contact.phone.trim().is_empty() || ctx.contact.do_not_contact {
      let reason = if ctx.contact.do_not_contact {
        "skipped: contact has do_not_contact set"
      } else {
        "skipped: contact has no phone number"
      };
      info!(node_id = %node.node_id, contact_id = %ctx.contact.contact_id, reason, "send_sms skipped");
      return Ok(StepResult::advance(next_node_id).with_output_data(serde_json::json!({ "reason": reason })));
    }

    let settings = sms_settings(&ctx.settings)
      .ok_or_else(|| ProcessorError::ProviderNotConfigured("sms settings are not configured".to_string()))?;

    let template = ctx
      .store
      .get_template(template_id)
      .await
      .map_err(|_| ProcessorError::MissingTemplate(template_id.clone()))?;

    let map = placeholder_map(&ctx.contact);
    let body = substitute(&template.body, &map);

    let message_id = Uuid::new_v4().to_string();
    ctx
      .store
      .create_message(&Message {
        message_id: message_id.clone(),
        contact_id: ctx.contact.contact_id.clone(),
        channel: Channel::Sms,
        direction: MessageDirection::Outbound,
        subject: None,
        body: body.clone(),
        status: MessageStatus::Queued,
        provider_id: None,
        provider_error: None,
        source: "workflow".to_string(),
        template_id: Some(template_id.clone()),
        execution_id: Some(ctx.execution.execution_id.clone()),
        created_at: Utc::now(),
      })
      .await?;

    let request = || SmsRequest {
      to: ctx.contact.phone.clone(),
      body: body.clone(),
      from: from_number_override.clone(),
    };

    // Single retry on a transient (thrown) provider error.
    let mut attempt = ctx.sms.send_sms(&settings, request()).await;
    if attempt.is_err() {
      warn!(node_id = %node.node_id, "sms provider call failed, retrying once");
      attempt = ctx.sms.send_sms(&settings, request()).await;
    }

    match attempt {
      Ok(response) if response.success => {
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Sent, response.sid.clone(), None)
          .await?;
        Ok(
          StepResult::advance(next_node_id)
            .with_execution_data(append_sent_message_id(ctx, &message_id))
            .with_output_data(serde_json::json!({ "message_id": message_id, "provider_id": response.sid })),
        )
      }
      Ok(response) => {
        let error = response.error.clone().unwrap_or_else(|| "sms provider declined".to_string());
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Failed, None, Some(error.clone()))
          .await?;
        Ok(StepResult::advance(next_node_id).with_error(format!("sms_failed: {error}")))
      }
      Err(e) => {
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Failed, None, Some(e.to_string()))
          .await?;
        Ok(StepResult::advance(next_node_id).with_error(format!("sms_failed: {e}")))
      }
    }
  }
}

fn sms_settings(settings: &std::collections::HashMap<String, String>) -> Option<SmsSettings> {
  Some(SmsSettings {
    account_sid: settings.get("account_sid")?.clone(),
    auth_token: settings.get("auth_token")?.clone(),
    phone_number: settings.get("phone_number")?.clone(),
  })
}
