use async_trait::async_trait;
use loomwork_model::{Channel, ChannelFilter, Node, NodeKind};

use crate::context::NodeContext;
use crate::error::ProcessorError;
use crate::processor::NodeProcessor;
use crate::processors::successor;
use crate::step::StepResult;

/// Stops the enrollment iff an inbound message exists for the contact,
/// created at or after `enrollment.enrolled_at`, on the configured channel.
/// Otherwise behaves as pass-through — the node is typically terminal but
/// may carry a successor; tests should not rely on that pass-through edge.
pub struct StopOnReplyProcessor;

#[async_trait]
impl NodeProcessor for StopOnReplyProcessor {
  async fn execute(&self, node: &Node, ctx: &NodeContext) -> Result<StepResult, ProcessorError> {
    let NodeKind::StopOnReply { channel } = &node.kind else {
      unreachable!("registry dispatches by node type");
    };

    let filter_channel = match channel {
      ChannelFilter::Sms => Some(Channel::Sms),
      ChannelFilter::Email => Some(Channel::Email),
      ChannelFilter::Any => None,
    };

    let replied = ctx
      .store
      .has_inbound_message_since(&ctx.contact.contact_id, ctx.enrollment.enrolled_at, filter_channel)
      .await?;

    if replied {
      let channel_name = match channel {
        ChannelFilter::Sms => "sms",
        ChannelFilter::Email => "email",
        ChannelFilter::Any => "a channel",
      };
      return Ok(StepResult::stop(format!("Contact replied via {channel_name}")));
    }

    Ok(StepResult::advance(successor(&ctx.workflow, &node.node_id, None)))
  }
}
