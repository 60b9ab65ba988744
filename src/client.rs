use tokio::sync::mpsc;
use log::{debug, trace, error, info};
use serde_json::Value;
use crate::FormFoot;
use crate::request::{self, TaskRequest};
use crate::view::{StatusLine, Tone, ViewState};

/// Status text while a submission is in flight
pub const SENDING: &str = "Sending…";
/// Ping text while a ping is in flight
pub const PINGING: &str = "Pinging…";
/// Text shown when the transport fails
pub const NETWORK_ERROR: &str = "Network error";
/// Status text of a successful submission
pub const DONE: &str = "Done";

/// What came back from one HTTP exchange
#[derive(Debug, Clone)]
pub enum Exchange
{   /// A response arrived; body already decoded
    Reply
    {   status: reqwest::StatusCode
      , body: Value
    }
  , /// Nothing arrived
    Transport(crate::error::Error)
}

/// Work finished off the loop, applied back on it
enum Completion
{   Submit
    {   exchange: Exchange
      , api_base: String
      , image_size: String
      , reply: crate::SubmitReplySender
    }
  , Ping
    {   status: crate::PingStatus
      , reply: crate::PingReplySender
    }
}

/// Controller state, owned by the event loop
pub struct ControllerState
{   pub fields: crate::FormFields
  , pub view: ViewState
  , http_client: reqwest::Client
}

impl ControllerState
{   pub fn new(
      config: &crate::config::ClientConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Initializing ControllerState");
        let fields = crate::FormFields
        {   api_base: config.api_base.clone()
          , ..crate::FormFields::default()
        };
        ControllerState
        {   view: ViewState::new(fields.task)
          , fields
          , http_client
        }
    }

    fn select_task(&mut self, task: crate::Task)
    {   debug!("Selecting task {}", task);
        self.fields.task = task;
        self.view.set_task(task);
    }

    fn update_fields(&mut self, fields: crate::FormFields)
    {   trace!("Updating fields: {:?}", fields);
        self.view.set_task(fields.task);
        self.fields = fields;
    }

    /// Start a submission cycle. Returns the request to send, or
    /// the outcome when validation already finished the cycle.
    fn begin_submit(&mut self)
      -> Result<TaskRequest, crate::Outcome>
    {   self.view.reset_result();
        self.view.submit_enabled = false;
        self.view.status = StatusLine::new(SENDING, Tone::Muted);

        match TaskRequest::from_fields(&self.fields)
        {   Ok(request) => Ok(request)
          , Err(e) => {
              let message = e.to_string();
              error!("Submission rejected: {}", message);
              self.view.show_failure(&message);
              self.view.submit_enabled = true;
              Err(crate::Outcome::Invalid(message))
            }
        }
    }

    /// Apply the result of a submission and re-enable submit
    fn finish_submit(
      &mut self
    , exchange: Exchange
    , api_base: &str
    , image_size: &str
    ) -> crate::Outcome
    {   let outcome = match exchange
        {   Exchange::Transport(e) => {
              error!("Submission failed: {}", e);
              self.view.show_failure(NETWORK_ERROR);
              crate::Outcome::NetworkError
            }
          , Exchange::Reply { status, body } => {
              self.view.raw_json = serde_json::to_string_pretty(&body)
                .unwrap_or_else(|_| body.to_string());
              self.view.result_visible = true;

              if status.is_success()
              {   self.view.status = StatusLine::new(DONE, Tone::Good);
                  crate::render::render_success(
                    &mut self.view,
                    &body,
                    api_base,
                    image_size
                  );
                  crate::Outcome::Done
              } else
              {   let message
                    = request::detail_message(&body, status.as_u16());
                  error!("API error {}: {}", status, message);
                  self.view.show_failure(&message);
                  crate::Outcome::Failed
                  {   status: status.as_u16()
                    , message
                  }
              }
            }
        };
        self.view.submit_enabled = true;
        outcome
    }
}

/// POST one body to the task route
pub async fn send_task(
  http_client: &reqwest::Client
, api_base: &str
, body: &TaskRequest
) -> Exchange
{   let url = request::endpoint(api_base);
    debug!("POST {} task={}", url, body.task);

    let response = match http_client
      .post(&url)
      .header("Content-Type", "application/json")
      .json(body)
      .send()
      .await
    {   Ok(response) => response
      , Err(e) => {
          error!("HTTP error: {}", e);
          return Exchange::Transport(
            crate::error::Error::Network(e.to_string())
          );
        }
    };

    let status = response.status();
    trace!("Response status: {}", status);

    let body = match response.bytes().await
    {   Ok(bytes) => request::decode_body(&bytes)
      , Err(e) => {
          error!("Failed to read body: {}", e);
          request::invalid_json()
        }
    };
    Exchange::Reply { status, body }
}

/// Connectivity check against the task route
pub async fn ping(
  http_client: &reqwest::Client
, api_base: &str
) -> crate::PingStatus
{   match send_task(http_client, api_base, &TaskRequest::ping()).await
    {   Exchange::Reply { status, .. } if status.is_success() => {
          crate::PingStatus::Ok
        }
      , Exchange::Reply { status, .. } => {
          crate::PingStatus::HttpError(status.as_u16())
        }
      , Exchange::Transport(_) => crate::PingStatus::NetworkError
    }
}

/// Public controller for the task form - owns the task
pub struct TaskFormController
{   hand: crate::FormHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl TaskFormController
{   /// Create and spawn a new controller
    /// Returns immediately - spawns background task
    pub fn new(
      config: crate::config::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating TaskFormController for {}", config.api_base);
        let http_client = config.http_client()?;

        let (select_task_tx, select_task_rx)
          = mpsc::unbounded_channel();
        let (update_fields_tx, update_fields_rx)
          = mpsc::unbounded_channel();
        let (submit_tx, submit_rx)
          = mpsc::unbounded_channel();
        let (ping_tx, ping_rx)
          = mpsc::unbounded_channel();
        let (get_view_tx, get_view_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::FormHand
        {   select_task_tx
          , update_fields_tx
          , submit_tx
          , ping_tx
          , get_view_tx
          , kill_process_tx
        };

        let foot = crate::FormFoot
        {   select_task_rx
          , update_fields_rx
          , submit_rx
          , ping_rx
          , get_view_rx
          , kill_process_rx
        };

        let state = ControllerState::new(&config, http_client);
        let _task_handle = tokio::spawn(async move {
          run_controller_loop(foot, state).await
        });

        Ok(TaskFormController
        {   hand
          , _task_handle
        })
    }

    /// Change the selected task - returns almost immediately
    pub async fn select_task(
      &self
    , task: crate::Task
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SelectTaskReply>,
        crate::error::Error
      >
    {   debug!("select_task queuing {}", task);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SelectTaskArgs
        {   task
          , reply: reply_tx
        };

        self.hand.select_task_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Replace all form values - returns almost immediately
    pub async fn update_fields(
      &self
    , fields: crate::FormFields
    ) -> Result<
        mpsc::UnboundedReceiver<crate::UpdateFieldsReply>,
        crate::error::Error
      >
    {   debug!("update_fields queuing");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::UpdateFieldsArgs
        {   fields
          , reply: reply_tx
        };

        self.hand.update_fields_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Submit the form - returns almost immediately; the reply
    /// arrives once the whole cycle has finished
    pub async fn submit(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SubmitReply>,
        crate::error::Error
      >
    {   debug!("submit queuing");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::SubmitArgs
        {   reply: reply_tx
        };

        self.hand.submit_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Ping the backend - returns almost immediately
    pub async fn ping(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::PingReply>,
        crate::error::Error
      >
    {   debug!("ping queuing");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::PingArgs
        {   reply: reply_tx
        };

        self.hand.ping_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Snapshot of the current view - returns almost immediately
    pub async fn view(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetViewReply>,
        crate::error::Error
      >
    {   trace!("view queuing");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::GetViewArgs
        {   reply: reply_tx
        };

        self.hand.get_view_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the controller
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down TaskFormController");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Controller shutdown confirmed");
            result
        } else
        {   error!("Controller shutdown not confirmed");
            Err(crate::error::Error::Disconnected)
        }
    }
}

fn disconnected() -> crate::error::Error
{   error!("Controller channel closed");
    crate::error::Error::Disconnected
}

/// Main controller event loop
///
/// tokio::select! only routes commands. Network work is spawned
/// and comes back through the completion channel, so pings and
/// view reads are served while a submission is in flight.
async fn run_controller_loop(
  foot: FormFoot
, mut state: ControllerState
)
{   debug!("Starting controller event loop");
    let FormFoot
    {   mut select_task_rx
      , mut update_fields_rx
      , mut submit_rx
      , mut ping_rx
      , mut get_view_rx
      , mut kill_process_rx
    } = foot;
    let (completion_tx, mut completion_rx)
      = mpsc::unbounded_channel::<Completion>();

    loop
    { tokio::select!
      { Some(cmd) = select_task_rx.recv() => {
          state.select_task(cmd.task);
          let _ = cmd.reply.send(Ok(state.view.clone()));
        }
      , Some(cmd) = update_fields_rx.recv() => {
          state.update_fields(cmd.fields);
          let _ = cmd.reply.send(Ok(state.view.clone()));
        }
      , Some(cmd) = submit_rx.recv() => {
          debug!("Received Submit");
          if !state.view.submit_enabled
          {   debug!("Submit ignored: request in flight");
              let _ = cmd.reply.send(
                Err(crate::error::Error::SubmissionInFlight)
              );
              continue;
          }

          let body = match state.begin_submit()
          {   Ok(body) => body
            , Err(outcome) => {
                let _ = cmd.reply.send(Ok(crate::Submission
                {   outcome
                  , view: state.view.clone()
                }));
                continue;
              }
          };

          let http_client = state.http_client.clone();
          let api_base = state.fields.api_base.clone();
          let image_size = state.fields.image_size.clone();
          let completion_tx = completion_tx.clone();
          tokio::spawn(async move {
            let base = api_base.clone();
            let exchange = tokio::spawn(async move {
                send_task(&http_client, &base, &body).await
              })
              .await
              .unwrap_or_else(|e| Exchange::Transport(
                crate::error::Error::Other(e.to_string())
              ));
            let _ = completion_tx.send(Completion::Submit
            {   exchange
              , api_base
              , image_size
              , reply: cmd.reply
            });
          });
        }
      , Some(cmd) = ping_rx.recv() => {
          debug!("Received Ping");
          state.view.ping = StatusLine::new(PINGING, Tone::Muted);
          let http_client = state.http_client.clone();
          let api_base = state.fields.api_base.clone();
          let completion_tx = completion_tx.clone();
          tokio::spawn(async move {
            let status = ping(&http_client, &api_base).await;
            let _ = completion_tx.send(Completion::Ping
            {   status
              , reply: cmd.reply
            });
          });
        }
      , Some(cmd) = get_view_rx.recv() => {
          let _ = cmd.reply.send(Ok(state.view.clone()));
        }
      , Some(done) = completion_rx.recv() => {
          match done
          {   Completion::Submit { exchange, api_base, image_size, reply } => {
                let outcome = state.finish_submit(
                  exchange,
                  &api_base,
                  &image_size
                );
                info!("Submission finished: {:?}", outcome);
                let _ = reply.send(Ok(crate::Submission
                {   outcome
                  , view: state.view.clone()
                }));
              }
            , Completion::Ping { status, reply } => {
                info!("Ping: {}", status);
                let tone = match status
                {   crate::PingStatus::Ok => Tone::Good
                  , _ => Tone::Bad
                };
                state.view.ping = StatusLine::new(status.to_string(), tone);
                let _ = reply.send(Ok(status));
              }
          }
        }
      , cmd = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          if let Some(cmd) = cmd
          {   let _ = cmd.reply.send(Ok(()));
          }
          info!("Controller shutting down");
          break;
        }
      }
    }
}
