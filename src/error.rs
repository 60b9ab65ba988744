use std::fmt;

/// Custom error type for aitask operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Form input rejected before any request was sent
    Validation(String)
  , /// Transport failure (dns, refused, timeout, bad url)
    Network(String)
  , /// Task name not recognised
    UnknownTask(String)
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// A submission is already running
    SubmissionInFlight
  , /// Controller loop is gone
    Disconnected
  , /// Generic error
    Other(String)
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Validation(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Network(msg) => {
              write!(f, "Network error: {}", msg)
            }
          , Error::UnknownTask(name) => {
              write!(f, "Unknown task: {}", name)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::SubmissionInFlight => {
              write!(f, "A submission is already in flight")
            }
          , Error::Disconnected => {
              write!(f, "Controller disconnected")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}
