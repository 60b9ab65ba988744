//! Per-task rendering of a successful reply into the view

use std::sync::OnceLock;
use regex::Regex;
use serde_json::Value;
use log::{debug, trace};

use crate::request::{
  payload, ContentPayload, ImagePayload, LatestAnswerPayload, QaPayload
};
use crate::view::{ImagePanel, SourceLink, ViewState};

/// Resolve a possibly relative path against the origin of `base`.
/// Absolute http(s) urls pass through, and so does everything
/// when `base` does not parse.
pub fn absolute_url(base: &str, path: &str) -> String
{   if path.is_empty()
    {   return String::new();
    }
    if has_http_scheme(path)
    {   return path.to_string();
    }
    match url::Url::parse(base)
    {   Ok(url) => {
          let origin = url.origin().ascii_serialization();
          let origin = origin.strip_suffix('/').unwrap_or(&origin);
          if path.starts_with('/')
          {   format!("{}{}", origin, path)
          } else
          {   format!("{}/{}", origin, path)
          }
        }
      , Err(e) => {
          debug!("Base url {:?} does not parse: {}", base, e);
          path.to_string()
        }
    }
}

fn has_http_scheme(path: &str) -> bool
{   let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Parse `<width>x<height>`; `None` leaves sizing unset
pub fn parse_image_size(size: &str) -> Option<(u32, u32)>
{   static SIZE_RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = SIZE_RE
      .get_or_init(|| Regex::new(r"^\s*(\d+)[xX](\d+)\s*$").ok())
      .as_ref()?;
    let caps = re.captures(size)?;
    let width = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let height = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((width, height))
}

/// Fill the task panel for a 2xx reply. Dispatches on the task the
/// reply names, not the one that was asked for; unknown tasks
/// leave only the raw panel.
pub fn render_success(
  view: &mut ViewState
, body: &Value
, api_base: &str
, image_size: &str
)
{   let task = body.get("task").and_then(Value::as_str);
    trace!("Rendering reply for task {:?}", task);

    match task.and_then(|t| t.parse::<crate::Task>().ok())
    {   Some(crate::Task::Qa) => {
          let qa: QaPayload = payload(body);
          view.text_result = Some(non_empty_or(qa.answer, "(no answer)"));
          if let Some(sources) = qa.sources.filter(|s| !s.is_empty())
          {   view.sources = Some(
                sources.iter()
                  .map(|s| SourceLink::new(
                    s.title.as_deref(),
                    s.url.as_deref()
                  ))
                  .collect()
              );
          }
        }
      , Some(crate::Task::Content) => {
          let content: ContentPayload = payload(body);
          view.text_result = Some(
            non_empty_or(content.content, "(no content)")
          );
        }
      , Some(crate::Task::LatestAnswer) => {
          let latest: LatestAnswerPayload = payload(body);
          view.text_result = Some(format!(
            "Prompt: {}\n\nAnswer:\n{}\n\nCreated at: {}",
            latest.prompt.unwrap_or_default(),
            latest.answer.unwrap_or_default(),
            latest.created_at.unwrap_or_default()
          ));
        }
      , Some(crate::Task::Image) => {
          let image: ImagePayload = payload(body);
          view.image = Some(image_panel(image, api_base, image_size));
        }
      , None => {
          debug!("No panel for task {:?}", task);
        }
    }
}

fn image_panel(
  image: ImagePayload
, api_base: &str
, image_size: &str
) -> ImagePanel
{   let full = absolute_url(
      api_base,
      image.image_url.as_deref().unwrap_or("")
    );
    let src = if !full.is_empty()
    {   Some(full.clone())
    } else
    {   image.base64
          .filter(|b| !b.is_empty())
          .map(|b| format!("data:image/png;base64,{}", b))
    };
    ImagePanel
    {   href: if full.is_empty() { "#".to_string() } else { full.clone() }
      , link_text: full
      , src
      , size: parse_image_size(image_size)
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String
{   value.filter(|v| !v.is_empty())
      .unwrap_or_else(|| fallback.to_string())
}
