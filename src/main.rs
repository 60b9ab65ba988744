use log::{debug, error};
use aitask::{ClientConfig, FormFields, Outcome, Task, TaskFormController};

const USAGE: &str = "usage: aitask ping | aitask <qa|content|image|latest_answer> [prompt...]";

#[tokio::main]
async fn main()
{   let config = match load_config()
    {   Ok(config) => config
      , Err(e) => {
          eprintln!("{}", e);
          std::process::exit(2);
        }
    };

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = config.log_filter()
    {   logger.filter_level(level);
    }
    logger.init();

    let code = match run(config, std::env::args().skip(1).collect()).await
    {   Ok(code) => code
      , Err(e) => {
          error!("{}", e);
          eprintln!("{}", e);
          2
        }
    };
    std::process::exit(code);
}

/// `AITASK_CONFIG` file (if any), then the env overrides on top
fn load_config() -> Result<ClientConfig, aitask::Error>
{   match std::env::var("AITASK_CONFIG")
    {   Ok(path) => ClientConfig::from_file(path)?
          .overlay(|name| std::env::var(name).ok())
      , Err(_) => ClientConfig::from_env()
    }
}

async fn run(
  config: ClientConfig
, args: Vec<String>
) -> Result<i32, aitask::Error>
{   let controller = TaskFormController::new(config.clone())?;

    let Some(command) = args.first()
    else
    {   eprintln!("{}", USAGE);
        return Ok(2);
    };

    let code = if command == "ping"
    {   let mut rx = controller.ping().await?;
        let status = rx.recv().await
          .ok_or(aitask::Error::Disconnected)??;
        println!("{}", status);
        i32::from(status != aitask::PingStatus::Ok)
    } else
    {   let task: Task = command.parse()?;
        let fields = fields_from_env(&config, task, args[1..].join(" "));
        debug!("Submitting {:?}", fields);

        let mut rx = controller.update_fields(fields).await?;
        rx.recv().await.ok_or(aitask::Error::Disconnected)??;

        let mut rx = controller.submit().await?;
        let submission = rx.recv().await
          .ok_or(aitask::Error::Disconnected)??;
        print!("{}", submission.view);
        i32::from(submission.outcome != Outcome::Done)
    };

    controller.shutdown().await?;
    Ok(code)
}

fn fields_from_env(
  config: &ClientConfig
, task: Task
, prompt: String
) -> FormFields
{   let var = |name: &str| std::env::var(name).unwrap_or_default();
    FormFields
    {   api_base: config.api_base.clone()
      , task
      , user_id: var("AITASK_USER_ID")
      , prompt
      , use_mcp: matches!(
          var("AITASK_USE_MCP").trim().to_ascii_lowercase().as_str(),
          "1" | "true" | "yes" | "on"
        )
      , platform: var("AITASK_PLATFORM")
      , image_size: var("AITASK_IMAGE_SIZE")
    }
}
