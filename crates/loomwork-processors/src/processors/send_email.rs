use async_trait::async_trait;
use chrono::Utc;
use loomwork_adapters::{EmailAddress, EmailRequest, EmailSettings};
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

/// Mirror of [`super::send_sms::SendSmsProcessor`]: short-circuits on
/// missing email/do-not-contact, requires both body and subject to be
/// non-empty after substitution.
pub struct SendEmailProcessor;

#[async_trait]
impl NodeProcessor for SendEmailProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::SendEmail {
      template_id,
      subject_override,
      from_email_override,
    } = &node.kind
    else {
      unreachable!("registry dispatches by node type");
    };

    let next_node_id = successor(&ctx.workflow, &node.node_id, None);

    if ctx.contact.email.trim().is_empty() || ctx.contact.do_not_contact {
      let reason = if ctx.contact.do_not_contact {
        "skipped: contact has do_not_contact set"
      } else {
        "skipped: contact has no email address"
      };
      info!(node_id = %node.node_id, contact_id = %ctx.contact.contact_id, reason, "send_email skipped");
      return Ok(StepResult::advance(next_node_id).with_output_data(serde_json::json!({ "reason": reason })));
    }

    let settings = email_settings(&ctx.settings)
      .ok_or_else(|| ProcessorError::ProviderNotConfigured("email settings are not configured".to_string()))?;

    let template = ctx
      .store
      .get_template(template_id)
      .await
      .map_err(|_| ProcessorError::MissingTemplate(template_id.clone()))?;

    let map = placeholder_map(&ctx.contact);
    let body = substitute(&template.body, &map);
    let subject = substitute(
      subject_override.as_deref().unwrap_or(template.subject.as_deref().unwrap_or("")),
      &map,
    );

    if body.trim().is_empty() || subject.trim().is_empty() {
      return Err(ProcessorError::MissingTemplate(format!(
        "template '{template_id}' resolves to an empty body or subject"
      )));
    }

    let message_id = Uuid::new_v4().to_string();
    ctx
      .store
      .create_message(&Message {
        message_id: message_id.clone(),
        contact_id: ctx.contact.contact_id.clone(),
        channel: Channel::Email,
        direction: MessageDirection::Outbound,
        subject: Some(subject.clone()),
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

    let from = EmailAddress {
      email: from_email_override.clone().unwrap_or_else(|| settings.from_email.clone()),
      name: Some(settings.from_name.clone()),
    };
    let request = || EmailRequest {
      to: ctx.contact.email.clone(),
      subject: subject.clone(),
      body: body.clone(),
      from: EmailAddress {
        email: from.email.clone(),
        name: from.name.clone(),
      },
    };

    let mut attempt = ctx.email.send_email(&settings, request()).await;
    if attempt.is_err() {
      warn!(node_id = %node.node_id, "email provider call failed, retrying once");
      attempt = ctx.email.send_email(&settings, request()).await;
    }

    match attempt {
      Ok(response) if response.success => {
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Sent, response.message_id.clone(), None)
          .await?;
        Ok(
          StepResult::advance(next_node_id)
            .with_execution_data(append_sent_message_id(ctx, &message_id))
            .with_output_data(serde_json::json!({ "message_id": message_id, "provider_id": response.message_id })),
        )
      }
      Ok(response) => {
        let error = response.error.clone().unwrap_or_else(|| "email provider declined".to_string());
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Failed, None, Some(error.clone()))
          .await?;
        Ok(StepResult::advance(next_node_id).with_error(format!("email_failed: {error}")))
      }
      Err(e) => {
        ctx
          .store
          .update_message_status(&message_id, MessageStatus::Failed, None, Some(e.to_string()))
          .await?;
        Ok(StepResult::advance(next_node_id).with_error(format!("email_failed: {e}")))
      }
    }
  }
}

fn email_settings(settings: &std::collections::HashMap<String, String>) -> Option<EmailSettings> {
  Some(EmailSettings {
    api_key: settings.get("api_key")?.clone(),
    from_email: settings.get("from_email")?.clone(),
    from_name: settings.get("from_name").cloned().unwrap_or_default(),
  })
}
