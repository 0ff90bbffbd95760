use serde::{Deserialize, Serialize};

/// Lifecycle status of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
  New,
  Contacted,
  Responded,
  Qualified,
  Disqualified,
}

impl ContactStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ContactStatus::New => "new",
      ContactStatus::Contacted => "contacted",
      ContactStatus::Responded => "responded",
      ContactStatus::Qualified => "qualified",
      ContactStatus::Disqualified => "disqualified",
    }
  }
}

/// Unit for a `time_delay` node's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
  Minutes,
  Hours,
  Days,
}

impl DurationUnit {
  /// Duration of one unit, in seconds.
  pub fn as_seconds(&self) -> i64 {
    match self {
      DurationUnit::Minutes => 60,
      DurationUnit::Hours => 3_600,
      DurationUnit::Days => 86_400,
    }
  }
}

/// Channel filter used by `stop_on_reply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFilter {
  Sms,
  Email,
  Any,
}

/// Communication channel for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
  Sms,
  Email,
}

impl Channel {
  pub fn as_str(&self) -> &'static str {
    match self {
      Channel::Sms => "sms",
      Channel::Email => "email",
    }
  }

  pub fn matches_filter(&self, filter: ChannelFilter) -> bool {
    matches!(
      (self, filter),
      (_, ChannelFilter::Any) | (Channel::Sms, ChannelFilter::Sms) | (Channel::Email, ChannelFilter::Email)
    )
  }
}

/// Direction of a message relative to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
  Outbound,
  Inbound,
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
  Queued,
  Scheduled,
  Sent,
  Failed,
  Delivered,
}

/// Execution mode for a `call_sub_workflow` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubWorkflowMode {
  Sync,
  Async,
}

/// What to do when a `call_sub_workflow` node cannot be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
  Continue,
  Fail,
}

/// The handle an edge leaves a `conditional_split` node on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeHandle {
  Yes,
  No,
}

impl EdgeHandle {
  pub fn as_str(&self) -> &'static str {
    match self {
      EdgeHandle::Yes => "yes",
      EdgeHandle::No => "no",
    }
  }
}

/// How condition groups (or conditions within a group) are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOperator {
  And,
  Or,
}
