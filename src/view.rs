//! Declarative view state for the task form
//!
//! The controller never touches a widget. It updates this record and a
//! front end reconciles it: show or hide field groups, paint the status
//! lines, fill the result panels.

use std::fmt;

/// Colour hint of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone
{   #[default]
    Muted
  , Good
  , Bad
}

/// One line of status text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLine
{   pub text: String
  , pub tone: Tone
}

impl StatusLine
{   pub fn new(text: impl Into<String>, tone: Tone) -> Self
    {   StatusLine
        {   text: text.into()
          , tone
        }
    }
}

/// Which field groups of the form are shown
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldGroups
{   pub qa: bool
  , pub image: bool
  , pub content: bool
  , /// Prompt input, shown for every prompt-bearing task
    pub prompt: bool
  , pub prompt_placeholder: &'static str
}

impl FieldGroups
{   /// Visible groups for a task. Pure, so applying it again
    /// for the same task changes nothing.
    pub fn for_task(task: crate::Task) -> Self
    {   FieldGroups
        {   qa: task == crate::Task::Qa
          , image: task == crate::Task::Image
          , content: task == crate::Task::Content
          , prompt: task.needs_prompt()
          , prompt_placeholder: placeholder(task)
        }
    }
}

/// Hint text of the prompt input
pub fn placeholder(task: crate::Task) -> &'static str
{   match task
    {   crate::Task::Qa => "Ask a question…"
      , crate::Task::Image => "Describe the image you want…"
      , crate::Task::Content => "Topic for platform content…"
      , crate::Task::LatestAnswer => ""
    }
}

/// Link to a cited source; always opens in a new browsing
/// context without an opener handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink
{   pub label: String
  , pub href: String
}

impl SourceLink
{   pub const TARGET: &'static str = "_blank";
    pub const REL: &'static str = "noopener";

    pub fn new(title: Option<&str>, url: Option<&str>) -> Self
    {   let href = match url
        {   Some(u) if !u.is_empty() => u.to_string()
          , _ => "#".to_string()
        };
        let title = title.unwrap_or("").replace('<', "&lt;");
        let label = if title.is_empty()
        {   href.replace('<', "&lt;")
        } else
        {   title
        };
        SourceLink
        {   label
          , href
        }
    }

    /// List item markup; the label is already `<`-escaped
    pub fn to_html(&self) -> String
    {   format!(
          "<li><a href=\"{}\" target=\"{}\" rel=\"{}\">{}</a></li>",
          escape_attr(&self.href), Self::TARGET, Self::REL, self.label
        )
    }
}

/// Escape text for a double-quoted attribute value
fn escape_attr(value: &str) -> String
{   let mut out = String::with_capacity(value.len());
    for c in value.chars()
    {   match c
        {   '&' => out.push_str("&amp;")
          , '<' => out.push_str("&lt;")
          , '>' => out.push_str("&gt;")
          , '"' => out.push_str("&quot;")
          , c => out.push(c)
        }
    }
    out
}

/// Image preview and its link
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImagePanel
{   /// Resolved url shown as link text, may be empty
    pub link_text: String
  , /// Link target; `#` when no url
    pub href: String
  , /// Image source; unset when neither url nor base64 came back
    pub src: Option<String>
  , /// Inline width/height in pixels
    pub size: Option<(u32, u32)>
}

/// Everything a front end needs to draw the form
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState
{   pub fields: FieldGroups
  , pub submit_enabled: bool
  , pub status: StatusLine
  , pub ping: StatusLine
  , /// Whole result section
    pub result_visible: bool
  , /// Primary text result area
    pub text_result: Option<String>
  , /// Source list (qa)
    pub sources: Option<Vec<SourceLink>>
  , pub image: Option<ImagePanel>
  , /// Pretty-printed reply for the collapsible raw panel
    pub raw_json: String
}

impl ViewState
{   pub fn new(task: crate::Task) -> Self
    {   ViewState
        {   fields: FieldGroups::for_task(task)
          , submit_enabled: true
          , status: StatusLine::default()
          , ping: StatusLine::default()
          , result_visible: false
          , text_result: None
          , sources: None
          , image: None
          , raw_json: String::new()
        }
    }

    /// Re-apply field visibility for the selected task
    pub fn set_task(&mut self, task: crate::Task)
    {   self.fields = FieldGroups::for_task(task);
    }

    /// Clear every result panel and the cached raw reply
    pub fn reset_result(&mut self)
    {   self.result_visible = false;
        self.text_result = None;
        self.sources = None;
        self.image = None;
        self.raw_json.clear();
    }

    /// Show one line of failure text in both status and result area
    pub fn show_failure(&mut self, message: &str)
    {   self.status = StatusLine::new(message, Tone::Bad);
        self.text_result = Some(message.to_string());
        self.result_visible = true;
    }

    /// Markup of the source list, empty when hidden
    pub fn sources_html(&self) -> String
    {   self.sources
          .as_ref()
          .map(|links| {
            links.iter().map(SourceLink::to_html).collect::<String>()
          })
          .unwrap_or_default()
    }
}

impl fmt::Display for ViewState
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   if !self.ping.text.is_empty()
        {   writeln!(f, "ping: {}", self.ping.text)?;
        }
        if !self.status.text.is_empty()
        {   writeln!(f, "status: {}", self.status.text)?;
        }
        if !self.result_visible
        {   return Ok(());
        }
        if let Some(text) = &self.text_result
        {   writeln!(f)?;
            writeln!(f, "{}", text)?;
        }
        if let Some(links) = &self.sources
        {   writeln!(f)?;
            writeln!(f, "sources:")?;
            for link in links
            {   writeln!(f, "  - {} <{}>", link.label, link.href)?;
            }
        }
        if let Some(image) = &self.image
        {   writeln!(f)?;
            writeln!(f, "image: {}", image.href)?;
            if let Some((w, h)) = image.size
            {   writeln!(f, "size: {}px x {}px", w, h)?;
            }
            if let Some(src) = &image.src
            {   if src.starts_with("data:")
                {   writeln!(f, "inline image data ({} bytes)", src.len())?;
                }
            }
        }
        if !self.raw_json.is_empty()
        {   writeln!(f)?;
            writeln!(f, "raw:")?;
            writeln!(f, "{}", self.raw_json)?;
        }
        Ok(())
    }
}
