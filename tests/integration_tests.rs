use aitask::view::Tone;
use aitask::{
  ClientConfig, Error, FormFields, Outcome, PingStatus, Submission, Task,
  TaskFormController
};
use serde_json::json;
use tokio_test::assert_ok;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// Controller whose base url points at `base`
fn controller(base: &str) -> TaskFormController
{   init_logging();
    let config = ClientConfig
    {   api_base: base.to_string()
      , ..ClientConfig::default()
    };
    assert_ok!(TaskFormController::new(config))
}

/// Base url of a port nothing listens on
fn closed_base() -> String
{   let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

async fn set_fields(c: &TaskFormController, fields: FormFields)
{   let mut rx = assert_ok!(c.update_fields(fields).await);
    assert_ok!(rx.recv().await.unwrap());
}

async fn submit(c: &TaskFormController) -> Submission
{   let mut rx = assert_ok!(c.submit().await);
    assert_ok!(rx.recv().await.unwrap())
}

fn form(base: &str, task: Task, prompt: &str) -> FormFields
{   FormFields
    {   api_base: base.to_string()
      , task
      , prompt: prompt.to_string()
      , ..FormFields::default()
    }
}

#[tokio::test]
async fn test_controller_initialization()
{   let c = controller("http://localhost:8000");
    let mut rx = assert_ok!(c.view().await);
    let view = assert_ok!(rx.recv().await.unwrap());
    assert!(view.submit_enabled);
    assert!(view.fields.qa && view.fields.prompt);
    assert_eq!(view.fields.prompt_placeholder, "Ask a question…");
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_select_task_is_idempotent()
{   let c = controller("http://localhost:8000");
    let mut rx = assert_ok!(c.select_task(Task::LatestAnswer).await);
    let once = assert_ok!(rx.recv().await.unwrap());
    let mut rx = assert_ok!(c.select_task(Task::LatestAnswer).await);
    let twice = assert_ok!(rx.recv().await.unwrap());
    assert_eq!(once, twice);
    assert!(!twice.fields.prompt);
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_empty_prompt_never_hits_network()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    for task in [Task::Qa, Task::Content, Task::Image]
    {   set_fields(&c, form(&server.uri(), task, "  ")).await;
        let submission = submit(&c).await;
        assert_eq!(
          submission.outcome,
          Outcome::Invalid("prompt is required".to_string())
        );
        assert_eq!(submission.view.status.text, "prompt is required");
        assert_eq!(submission.view.status.tone, Tone::Bad);
        assert_eq!(
          submission.view.text_result.as_deref(),
          Some("prompt is required")
        );
        assert!(submission.view.submit_enabled);
        assert!(submission.view.raw_json.is_empty());
    }
    assert_ok!(c.shutdown().await);
    server.verify().await;
}

#[tokio::test]
async fn test_qa_success_renders_answer_and_sources()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .and(header("content-type", "application/json"))
      .and(body_json(json!({
        "task": "qa",
        "prompt": "What is 2+2?",
        "use_mcp": false
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "task": "qa",
        "data": {
          "answer": "4",
          "sources": [{"title": "Math", "url": "https://x/"}]
        }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&format!("{}/", server.uri()), Task::Qa, "What is 2+2?")).await;
    let submission = submit(&c).await;

    assert_eq!(submission.outcome, Outcome::Done);
    let view = submission.view;
    assert_eq!(view.status.text, "Done");
    assert_eq!(view.status.tone, Tone::Good);
    assert_eq!(view.text_result.as_deref(), Some("4"));
    let sources = view.sources.clone().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].label, "Math");
    assert_eq!(sources[0].href, "https://x/");
    assert!(view.sources_html().contains("rel=\"noopener\""));
    assert!(view.raw_json.contains("\"answer\": \"4\""));
    assert!(view.submit_enabled);
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_image_base64_fallback_and_sizing()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .and(body_json(json!({
        "task": "image",
        "prompt": "a red fox",
        "image_size": "256x128"
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "task": "image",
        "data": {"base64": "iVBOR"}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    let mut fields = form(&server.uri(), Task::Image, "a red fox");
    fields.image_size = "256x128".to_string();
    set_fields(&c, fields).await;
    let submission = submit(&c).await;

    assert_eq!(submission.outcome, Outcome::Done);
    let image = submission.view.image.unwrap();
    assert_eq!(image.src.as_deref(), Some("data:image/png;base64,iVBOR"));
    assert_eq!(image.link_text, "");
    assert_eq!(image.href, "#");
    assert_eq!(image.size, Some((256, 128)));
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_image_url_resolved_against_base()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "task": "image",
        "data": {"image_url": "/static/out.png"}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&format!("{}/api/", server.uri()), Task::Image, "x")).await;
    let submission = submit(&c).await;

    let expected = format!("{}/static/out.png", server.uri());
    let image = submission.view.image.unwrap();
    assert_eq!(image.href, expected);
    assert_eq!(image.src.as_deref(), Some(expected.as_str()));
    assert_eq!(image.size, None);
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_http_500_with_structured_detail()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(500).set_body_json(json!({
        "task": "qa",
        "data": {"answer": "should not render"},
        "detail": {"code": "LIMIT"}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::Qa, "hi")).await;
    let submission = submit(&c).await;

    assert_eq!(
      submission.outcome,
      Outcome::Failed
      {   status: 500
        , message: r#"{"code":"LIMIT"}"#.to_string()
      }
    );
    let view = submission.view;
    assert_eq!(view.status.text, r#"{"code":"LIMIT"}"#);
    assert_eq!(view.text_result.as_deref(), Some(r#"{"code":"LIMIT"}"#));
    assert_eq!(view.sources, None);
    assert_eq!(view.image, None);
    assert!(view.raw_json.contains("LIMIT"));
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_http_error_with_non_json_body()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::LatestAnswer, "")).await;
    let submission = submit(&c).await;

    // non-JSON body becomes {"ok": false, "detail": "Invalid JSON"}
    assert_eq!(submission.view.status.text, "Invalid JSON");
    assert!(submission.view.raw_json.contains("\"ok\": false"));
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_http_error_json_without_detail()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(503).set_body_json(json!({
        "task": "qa",
        "data": {"answer": "should not render"}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::Qa, "hi")).await;
    let submission = submit(&c).await;

    assert_eq!(
      submission.outcome,
      Outcome::Failed
      {   status: 503
        , message: "Error 503".to_string()
      }
    );
    let view = submission.view;
    assert_eq!(view.status.text, "Error 503");
    assert_eq!(view.status.tone, Tone::Bad);
    assert_eq!(view.text_result.as_deref(), Some("Error 503"));
    assert_eq!(view.sources, None);
    assert!(view.raw_json.contains("should not render"));
    assert!(view.submit_enabled);
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_invalid_json_on_success_renders_no_panel()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::Content, "topic")).await;
    let submission = submit(&c).await;

    assert_eq!(submission.outcome, Outcome::Done);
    assert_eq!(submission.view.text_result, None);
    assert!(submission.view.raw_json.contains("Invalid JSON"));
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_latest_answer_renders_by_reply_task()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .and(body_json(json!({"task": "latest_answer", "user_id": "u1"})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "task": "latest_answer",
        "data": {"prompt": "p", "answer": "a", "created_at": "t"}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    let mut fields = form(&server.uri(), Task::LatestAnswer, "ignored");
    fields.user_id = " u1 ".to_string();
    set_fields(&c, fields).await;
    let submission = submit(&c).await;

    assert_eq!(
      submission.view.text_result.as_deref(),
      Some("Prompt: p\n\nAnswer:\na\n\nCreated at: t")
    );
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_transport_failure_reads_network_error()
{   let base = closed_base();
    let c = controller(&base);
    set_fields(&c, form(&base, Task::Qa, "hello")).await;
    let submission = submit(&c).await;

    assert_eq!(submission.outcome, Outcome::NetworkError);
    assert_eq!(submission.view.status.text, "Network error");
    assert_eq!(submission.view.text_result.as_deref(), Some("Network error"));
    assert!(submission.view.raw_json.is_empty());
    assert!(submission.view.submit_enabled);
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_second_submit_rejected_while_in_flight()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({"task": "content", "data": {"content": "post"}}))
          .set_delay(std::time::Duration::from_millis(300))
      )
      .expect(1)
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::Content, "rust")).await;

    let mut first = assert_ok!(c.submit().await);
    let mut second = assert_ok!(c.submit().await);
    assert_eq!(
      second.recv().await.unwrap(),
      Err(Error::SubmissionInFlight)
    );

    // view reads and pings still answer while the submit runs
    let mut rx = assert_ok!(c.view().await);
    let view = assert_ok!(rx.recv().await.unwrap());
    assert!(!view.submit_enabled);
    assert_eq!(view.status.text, "Sending…");
    assert_eq!(view.status.tone, Tone::Muted);

    let submission = assert_ok!(first.recv().await.unwrap());
    assert_eq!(submission.view.text_result.as_deref(), Some("post"));
    assert!(submission.view.submit_enabled);
    assert_ok!(c.shutdown().await);
    server.verify().await;
}

#[tokio::test]
async fn test_ping_statuses()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .and(body_json(json!({"task": "qa", "prompt": "ping", "use_mcp": false})))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task": "qa"})))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    let mut rx = assert_ok!(c.ping().await);
    assert_eq!(rx.recv().await.unwrap(), Ok(PingStatus::Ok));
    let mut rx = assert_ok!(c.view().await);
    let view = assert_ok!(rx.recv().await.unwrap());
    assert_eq!(view.ping.text, "OK");
    assert_eq!(view.ping.tone, Tone::Good);

    set_fields(&c, form(&format!("{}/missing", server.uri()), Task::Qa, "")).await;
    let mut rx = assert_ok!(c.ping().await);
    let status = assert_ok!(rx.recv().await.unwrap());
    assert_eq!(status, PingStatus::HttpError(404));
    assert_eq!(status.to_string(), "Error: 404");

    set_fields(&c, form(&closed_base(), Task::Qa, "")).await;
    let mut rx = assert_ok!(c.ping().await);
    let status = assert_ok!(rx.recv().await.unwrap());
    assert_eq!(status, PingStatus::NetworkError);
    assert_eq!(status.to_string(), "Network error");
    assert_ok!(c.shutdown().await);
}

#[tokio::test]
async fn test_new_submission_resets_previous_result()
{   let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/ai-task"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "task": "qa",
        "data": {"answer": "4", "sources": [{"url": "https://x/"}]}
      })))
      .mount(&server)
      .await;

    let c = controller(&server.uri());
    set_fields(&c, form(&server.uri(), Task::Qa, "q")).await;
    let first = submit(&c).await;
    assert!(first.view.sources.is_some());

    set_fields(&c, form(&server.uri(), Task::Qa, "")).await;
    let second = submit(&c).await;
    assert_eq!(second.view.sources, None);
    assert!(second.view.raw_json.is_empty());
    assert_ok!(c.shutdown().await);
}

#[test]
fn test_task_names()
{   assert_eq!(assert_ok!("latest_answer".parse::<Task>()), Task::LatestAnswer);
    assert_eq!(
      "video".parse::<Task>(),
      Err(Error::UnknownTask("video".to_string()))
    );
}
