//! Wire types for the single `/ai-task` route

use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace};

/// Path appended to the base url
pub const TASK_PATH: &str = "/ai-task";

/// Image size sent when the field is left blank
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Detail of the stand-in body used when a reply is not JSON
pub const INVALID_JSON_DETAIL: &str = "Invalid JSON";

/// Message shown when a required prompt is missing
pub const PROMPT_REQUIRED: &str = "prompt is required";

/// Request body for `POST <base>/ai-task`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest
{   pub task: crate::Task
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mcp: Option<bool>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>
}

impl TaskRequest
{   /// Build the body from the current form values.
    /// Fails with a validation error, before anything is sent,
    /// when a prompt-bearing task has an empty prompt.
    pub fn from_fields(fields: &crate::FormFields)
      -> Result<Self, crate::error::Error>
    {   let task = fields.task;
        let user_id = fields.user_id.trim();

        let prompt = if task.needs_prompt()
        {   let p = fields.prompt.trim();
            if p.is_empty()
            {   debug!("Rejecting {} request: empty prompt", task);
                return Err(crate::error::Error::Validation(
                  PROMPT_REQUIRED.to_string()
                ));
            }
            Some(p.to_string())
        } else
        {   None
        };

        let image_size = match task
        {   crate::Task::Image => {
              let size = fields.image_size.trim();
              Some(if size.is_empty()
              {   DEFAULT_IMAGE_SIZE.to_string()
              } else
              {   size.to_string()
              })
            }
          , _ => None
        };

        let request = TaskRequest
        {   task
          , user_id: (!user_id.is_empty())
              .then(|| user_id.to_string())
          , prompt
          , use_mcp: (task == crate::Task::Qa)
              .then_some(fields.use_mcp)
          , platform: (task == crate::Task::Content)
              .then(|| fields.platform.clone())
          , image_size
        };
        trace!("Built request: {:?}", request);
        Ok(request)
    }

    /// Fixed connectivity check body
    pub fn ping() -> Self
    {   TaskRequest
        {   task: crate::Task::Qa
          , user_id: None
          , prompt: Some("ping".to_string())
          , use_mcp: Some(false)
          , platform: None
          , image_size: None
        }
    }
}

/// Full endpoint url: base minus one trailing slash, plus the path
pub fn endpoint(api_base: &str) -> String
{   let base = api_base.strip_suffix('/').unwrap_or(api_base);
    format!("{}{}", base, TASK_PATH)
}

/// Decode a reply body. Anything that is not JSON becomes
/// `{"ok": false, "detail": "Invalid JSON"}`.
pub fn decode_body(bytes: &[u8]) -> Value
{   match serde_json::from_slice::<Value>(bytes)
    {   Ok(value) => value
      , Err(e) => {
          debug!("Reply is not JSON: {}", e);
          invalid_json()
        }
    }
}

/// Stand-in for a reply body that could not be decoded
pub fn invalid_json() -> Value
{   serde_json::json!({
      "ok": false,
      "detail": INVALID_JSON_DETAIL
    })
}

/// One-line message for a failed reply: a string detail as-is,
/// any other present detail as JSON, else `Error <status>`.
pub fn detail_message(body: &Value, status: u16) -> String
{   match body.get("detail")
    {   Some(Value::String(s)) => s.clone()
      , Some(detail) if is_truthy(detail) => detail.to_string()
      , _ => format!("Error {}", status)
    }
}

fn is_truthy(value: &Value) -> bool
{   match value
    {   Value::Null => false
      , Value::Bool(b) => *b
      , Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0)
      , _ => true
    }
}

// ===== Reply payloads =====

/// One cited source of a qa answer
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Source
{   #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>
  , #[serde(deserialize_with = "lenient_text")]
    pub url: Option<String>
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct QaPayload
{   #[serde(deserialize_with = "lenient_text")]
    pub answer: Option<String>
  , #[serde(deserialize_with = "lenient_sources")]
    pub sources: Option<Vec<Source>>
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ContentPayload
{   #[serde(deserialize_with = "lenient_text")]
    pub content: Option<String>
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LatestAnswerPayload
{   #[serde(deserialize_with = "lenient_text")]
    pub prompt: Option<String>
  , #[serde(deserialize_with = "lenient_text")]
    pub answer: Option<String>
  , #[serde(deserialize_with = "lenient_text")]
    pub created_at: Option<String>
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ImagePayload
{   #[serde(deserialize_with = "lenient_text")]
    pub image_url: Option<String>
  , #[serde(deserialize_with = "lenient_text")]
    pub base64: Option<String>
}

/// Strings pass, numbers are shown as written, anything else
/// is treated as absent without failing the other fields.
fn lenient_text<'de, D>(deserializer: D)
  -> Result<Option<String>, D::Error>
where
  D: serde::Deserializer<'de>
{   Ok(match Value::deserialize(deserializer)?
    {   Value::String(s) => Some(s)
      , Value::Number(n) => Some(n.to_string())
      , other => {
          trace!("Ignoring non-text field: {}", other);
          None
        }
    })
}

/// Only a list counts as sources; an entry that is not a
/// source object becomes an empty source.
fn lenient_sources<'de, D>(deserializer: D)
  -> Result<Option<Vec<Source>>, D::Error>
where
  D: serde::Deserializer<'de>
{   Ok(match Value::deserialize(deserializer)?
    {   Value::Array(items) => Some(
          items.into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()
        )
      , other => {
          debug!("Ignoring sources that are not a list: {}", other);
          None
        }
    })
}

/// Decode the `data` member of a reply into a payload shape.
/// A missing or mis-shaped payload yields the all-empty value.
pub fn payload<T>(body: &Value) -> T
where
  T: serde::de::DeserializeOwned + Default
{   match body.get("data")
    {   Some(data) if !data.is_null() => {
          serde_json::from_value(data.clone()).unwrap_or_else(|e| {
            debug!("Unexpected payload shape: {}", e);
            T::default()
          })
        }
      , _ => T::default()
    }
}
