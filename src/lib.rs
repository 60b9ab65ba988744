pub mod error;
pub mod config;
pub mod request;
pub mod view;
pub mod render;
pub mod client;
use serde::{Deserialize, Serialize};

pub use client::TaskFormController;
pub use config::ClientConfig;
pub use error::Error;
pub use view::ViewState;

/*

aitask is an async-only client for a single-route AI task api
(POST <base>/ai-task). one controller owns the form, sends one
request at a time, and renders the reply by its task type into a
plain view-state record that any front end can draw.

aitask/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and the command/reply channels
│   ├── error.rs        # Error type
│   ├── config.rs       # Base url, timeout, env/file loading
│   ├── request.rs      # Wire types, body building, reply decoding
│   ├── view.rs         # View state record + text/html output
│   ├── render.rs       # Per-task result rendering
│   ├── client.rs       # Controller actor and its event loop
│   └── main.rs         # Command line front end
└── tests/              # Integration tests against a mock server

*/

/// AITASK API INTERFACE:

// ===== SelectTask =====

pub type SelectTaskReply = Result<ViewState, crate::error::Error>;
pub type SelectTaskReplySender
  = tokio::sync::mpsc::UnboundedSender<SelectTaskReply>;

pub struct SelectTaskArgs
{   pub task: Task
  , pub reply: SelectTaskReplySender
}

// ===== UpdateFields =====

pub type UpdateFieldsReply = Result<ViewState, crate::error::Error>;
pub type UpdateFieldsReplySender
  = tokio::sync::mpsc::UnboundedSender<UpdateFieldsReply>;

pub struct UpdateFieldsArgs
{   pub fields: FormFields
  , pub reply: UpdateFieldsReplySender
}

// ===== Submit =====

pub type SubmitReply = Result<Submission, crate::error::Error>;
pub type SubmitReplySender
  = tokio::sync::mpsc::UnboundedSender<SubmitReply>;

pub struct SubmitArgs
{   pub reply: SubmitReplySender
}

// ===== Ping =====

pub type PingReply = Result<PingStatus, crate::error::Error>;
pub type PingReplySender
  = tokio::sync::mpsc::UnboundedSender<PingReply>;

pub struct PingArgs
{   pub reply: PingReplySender
}

// ===== GetView =====

pub type GetViewReply = Result<ViewState, crate::error::Error>;
pub type GetViewReplySender
  = tokio::sync::mpsc::UnboundedSender<GetViewReply>;

pub struct GetViewArgs
{   pub reply: GetViewReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== FormHand (sender side) =====

pub struct FormHand
{   pub select_task_tx
      : tokio::sync::mpsc::UnboundedSender<SelectTaskArgs>
  , pub update_fields_tx
      : tokio::sync::mpsc::UnboundedSender<UpdateFieldsArgs>
  , pub submit_tx
      : tokio::sync::mpsc::UnboundedSender<SubmitArgs>
  , pub ping_tx
      : tokio::sync::mpsc::UnboundedSender<PingArgs>
  , pub get_view_tx
      : tokio::sync::mpsc::UnboundedSender<GetViewArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== FormFoot (receiver side) =====

pub struct FormFoot
{   pub select_task_rx
      : tokio::sync::mpsc::UnboundedReceiver<SelectTaskArgs>
  , pub update_fields_rx
      : tokio::sync::mpsc::UnboundedReceiver<UpdateFieldsArgs>
  , pub submit_rx
      : tokio::sync::mpsc::UnboundedReceiver<SubmitArgs>
  , pub ping_rx
      : tokio::sync::mpsc::UnboundedReceiver<PingArgs>
  , pub get_view_rx
      : tokio::sync::mpsc::UnboundedReceiver<GetViewArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

/// AITASK STRUCTURES:

/// Backend operation selected by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Task
{   /// Question answering, optionally backed by MCP tools
    #[default]
    Qa
  , /// Platform content generation
    Content
  , /// Image generation
    Image
  , /// Lookup of the most recent stored answer
    LatestAnswer
}

impl Task
{   /// Wire name of the task
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Task::Qa => "qa"
          , Task::Content => "content"
          , Task::Image => "image"
          , Task::LatestAnswer => "latest_answer"
        }
    }

    /// Whether the task needs a non-empty prompt
    pub fn needs_prompt(&self) -> bool
    {   matches!(self, Task::Qa | Task::Content | Task::Image)
    }
}

impl std::fmt::Display for Task
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Task
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s
        {   "qa" => Ok(Task::Qa)
          , "content" => Ok(Task::Content)
          , "image" => Ok(Task::Image)
          , "latest_answer" => Ok(Task::LatestAnswer)
          , other => Err(crate::error::Error::UnknownTask(
              other.to_string()
            ))
        }
    }
}

/// Raw values of every editable input on the form.
/// Strings are kept exactly as typed; trimming happens
/// when the request body is built.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct FormFields
{   /// Base url the single api path is resolved against
    pub api_base: String
  , /// Selected task
    pub task: Task
  , /// Optional user identifier
    pub user_id: String
  , /// Prompt text (qa, content, image)
    pub prompt: String
  , /// Let the backend use MCP tools (qa only)
    pub use_mcp: bool
  , /// Target platform (content only)
    pub platform: String
  , /// Requested size, `<width>x<height>` (image only)
    pub image_size: String
}

/// Result of a connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingStatus
{   Ok
  , HttpError(u16)
  , NetworkError
}

impl std::fmt::Display for PingStatus
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   match self
        {   PingStatus::Ok => write!(f, "OK")
          , PingStatus::HttpError(status) => {
              write!(f, "Error: {}", status)
            }
          , PingStatus::NetworkError => write!(f, "Network error")
        }
    }
}

/// How a submission cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome
{   /// HTTP success; result rendered by task
    Done
  , /// HTTP non-2xx; message follows the detail rule
    Failed
    {   status: u16
      , message: String
    }
  , /// Local validation failed; nothing was sent
    Invalid(String)
  , /// Transport failed before any response arrived
    NetworkError
}

/// Reply to a finished submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission
{   pub outcome: Outcome
  , pub view: ViewState
}
