//! dnac CLI - Command line interface for DNA Center task tracking.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dnac_client::config::AUTH_TOKEN_HEADER;
use dnac_client::{
    Artifact, Client, ClientConfig, CommandRunnerRequest, Completion, TaskQuery, WaitError,
    WaitPolicy,
};
use dnac_core::{FileId, TaskId, TaskRecord, FILE_ID_KEY};

const EXIT_FAILED: u8 = 2;
const EXIT_TIMED_OUT: u8 = 3;
const EXIT_CANCELLED: u8 = 4;

/// dnac CLI - DNA Center task tracking tool
#[derive(Parser)]
#[command(name = "dnac")]
#[command(about = "Track asynchronous DNA Center operations", long_about = None)]
struct Cli {
    /// Controller base URL (overrides DNAC_BASE_URL)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Session token sent as X-Auth-Token (overrides DNAC_AUTH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Per-request timeout in seconds (overrides DNAC_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get task status
    #[command(name = "get-task")]
    GetTask {
        /// Task ID
        id: String,

        /// Progress field that marks completion
        #[arg(long, default_value = FILE_ID_KEY)]
        key: String,
    },

    /// Wait for a task to finish
    #[command(name = "wait-task")]
    WaitTask {
        /// Task ID
        id: String,

        #[command(flatten)]
        wait: WaitArgs,

        /// Download the produced file once the task succeeds
        #[arg(long)]
        download: bool,
    },

    /// Download a file
    #[command(name = "download")]
    Download {
        /// File ID
        file_id: String,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run read-only commands on devices and print their output
    #[command(name = "run-commands")]
    RunCommands {
        /// Device UUID (repeatable)
        #[arg(short, long = "device", required = true)]
        devices: Vec<String>,

        /// Command to run (repeatable)
        #[arg(short, long = "command", required = true)]
        commands: Vec<String>,

        #[command(flatten)]
        wait: WaitArgs,

        /// Write the output to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List tasks
    #[command(name = "list-tasks")]
    ListTasks {
        /// Only tasks of this service type
        #[arg(long)]
        service_type: Option<String>,

        /// Only failed (true) or successful (false) tasks
        #[arg(long)]
        is_error: Option<bool>,

        /// Maximum number of tasks
        #[arg(short, long, default_value = "25")]
        limit: u32,

        /// Progress field that marks completion
        #[arg(long, default_value = FILE_ID_KEY)]
        key: String,
    },
}

#[derive(clap::Args)]
struct WaitArgs {
    /// Maximum status reads
    #[arg(long, default_value = "30")]
    attempts: u32,

    /// Initial delay between reads, in seconds
    #[arg(long, default_value = "2")]
    interval_secs: u64,

    /// Overall deadline in seconds (0 disables it)
    #[arg(long, default_value = "120")]
    deadline_secs: u64,

    /// Progress field that marks completion
    #[arg(long, default_value = FILE_ID_KEY)]
    key: String,
}

impl WaitArgs {
    fn policy(&self) -> WaitPolicy {
        let deadline = (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs));
        let interval = Duration::from_secs(self.interval_secs);
        let defaults = WaitPolicy::default();
        WaitPolicy {
            max_attempts: self.attempts,
            interval,
            max_interval: defaults.max_interval.max(interval),
            ..defaults
        }
        .with_timeout(deadline)
        .with_completion_key(self.key.clone())
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so artifact output on stdout stays clean
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = Client::new(&client_config(&cli))?;

    match cli.command {
        Commands::GetTask { id, key } => {
            get_task(&client, &id, &key).await?;
        }
        Commands::WaitTask { id, wait, download } => {
            return wait_task(&client, &id, &wait, download).await;
        }
        Commands::Download { file_id, output } => {
            download(&client, &file_id, output).await?;
        }
        Commands::RunCommands {
            devices,
            commands,
            wait,
            output,
        } => {
            return run_commands(&client, devices, commands, &wait, output).await;
        }
        Commands::ListTasks {
            service_type,
            is_error,
            limit,
            key,
        } => {
            list_tasks(&client, service_type, is_error, limit, &key).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    if cli.insecure {
        config = config.with_insecure(true);
    }
    if let Some(token) = &cli.token {
        config
            .headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTH_TOKEN_HEADER));
        config = config.with_auth_token(token.clone());
    }
    config
}

/// A token cancelled on Ctrl-C.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling wait");
            trigger.cancel();
        }
    });
    token
}

async fn get_task(
    client: &Client,
    id: &str,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let task_id = TaskId::parse(id)?;
    let task = client.tasks.get_task_by_id(&task_id).await?;

    print_task(&task, key);

    Ok(())
}

async fn wait_task(
    client: &Client,
    id: &str,
    wait: &WaitArgs,
    download: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let task_id = TaskId::parse(id)?;
    let waiter = client.waiter(wait.policy());

    let completion = match waiter.wait(&task_id, &ctrl_c_token()).await {
        Ok(completion) => completion,
        Err(err) => return wait_failed(err, &wait.key),
    };

    println!("Task completed after {} attempt(s):", completion.attempts);
    print_task(&completion.record, &completion.completion_key);

    if download {
        let artifact = fetch_output(client, &completion).await?;
        print_artifact(&artifact)?;
    }

    Ok(ExitCode::SUCCESS)
}

async fn download(
    client: &Client,
    file_id: &str,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_id = FileId::parse(file_id)?;
    let artifact = client.files.download(&file_id).await?;

    match output {
        Some(path) => write_artifact(&artifact, &path).await?,
        None => print_artifact(&artifact)?,
    }

    Ok(())
}

async fn run_commands(
    client: &Client,
    devices: Vec<String>,
    commands: Vec<String>,
    wait: &WaitArgs,
    output: Option<PathBuf>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let request = CommandRunnerRequest::new(commands, devices);
    let task = client.command_runner.run_read_only_commands(&request).await?;
    info!(task_id = %task.task_id, "Waiting for command output");

    let waiter = client.waiter(wait.policy());
    let completion = match waiter.wait(&task.task_id, &ctrl_c_token()).await {
        Ok(completion) => completion,
        Err(err) => return wait_failed(err, &wait.key),
    };

    let artifact = fetch_output(client, &completion).await?;
    match output {
        Some(path) => write_artifact(&artifact, &path).await?,
        None => print_artifact(&artifact)?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn list_tasks(
    client: &Client,
    service_type: Option<String>,
    is_error: Option<bool>,
    limit: u32,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = TaskQuery {
        service_type,
        is_error,
        limit: Some(limit),
        ..Default::default()
    };

    let tasks = client.tasks.get_tasks(&query).await?;

    println!("Tasks ({}):", tasks.len());
    println!("{:<36}  {:<10}  {:<28}  {}", "ID", "STATUS", "SERVICE", "STARTED");
    println!("{}", "-".repeat(96));

    for task in tasks {
        let status = task.lifecycle(key);
        let service = task.service_type.as_deref().unwrap_or("-");
        let started = task.start_time.map(format_timestamp).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36}  {:<10}  {:<28}  {}",
            task.id,
            status.as_str(),
            service,
            started
        );
    }

    Ok(())
}

async fn fetch_output(
    client: &Client,
    completion: &Completion,
) -> Result<Artifact, Box<dyn std::error::Error>> {
    let file_id = completion.file_id()?;
    Ok(client.artifacts().fetch(&file_id).await?)
}

fn wait_failed(err: WaitError, key: &str) -> Result<ExitCode, Box<dyn std::error::Error>> {
    eprintln!("Error: {err}");
    let code = match err {
        WaitError::Failed { ref record, .. } => {
            print_task(record, key);
            EXIT_FAILED
        }
        WaitError::TimedOut {
            ref last,
            ref last_error,
            ..
        } => {
            if let Some(record) = last {
                print_task(record, key);
            }
            if let Some(error) = last_error {
                eprintln!("Last poll error: {error}");
            }
            EXIT_TIMED_OUT
        }
        WaitError::Cancelled { .. } => EXIT_CANCELLED,
        other => return Err(other.into()),
    };
    Ok(ExitCode::from(code))
}

fn print_task(task: &TaskRecord, key: &str) {
    println!("  ID:         {}", task.id);
    println!("  Status:     {}", task.lifecycle(key));
    if let Some(service) = &task.service_type {
        println!("  Service:    {}", service);
    }
    if let Some(progress) = &task.progress {
        println!("  Progress:   {}", progress);
    }
    if let Some(reason) = task.failure_reason() {
        println!("  Failure:    {}", reason);
    }
    if let Some(code) = task.error_code() {
        println!("  Error code: {}", code);
    }
    if let Some(started) = task.start_time {
        println!("  Started:    {}", format_timestamp(started));
    }
    if let Some(ended) = task.end_time {
        println!("  Ended:      {}", format_timestamp(ended));
    }
}

fn print_artifact(artifact: &Artifact) -> Result<(), Box<dyn std::error::Error>> {
    match artifact.json::<serde_json::Value>() {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", artifact.as_text()),
    }
    Ok(())
}

async fn write_artifact(
    artifact: &Artifact,
    path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::fs::write(path, &artifact.bytes).await?;
    info!(
        file_id = %artifact.file_id,
        path = %path.display(),
        bytes = artifact.len(),
        "Wrote file"
    );
    Ok(())
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(args: &[&str]) -> String {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::GetTask { key, .. } | Commands::ListTasks { key, .. } => key,
            Commands::WaitTask { wait, .. } | Commands::RunCommands { wait, .. } => wait.key,
            Commands::Download { .. } => panic!("download has no completion key"),
        }
    }

    #[test]
    fn test_completion_key_defaults_to_file_id() {
        assert_eq!(key_of(&["dnac", "get-task", "t-1"]), FILE_ID_KEY);
        assert_eq!(key_of(&["dnac", "list-tasks"]), FILE_ID_KEY);
    }

    #[test]
    fn test_completion_key_reaches_read_commands() {
        assert_eq!(
            key_of(&["dnac", "get-task", "t-1", "--key", "reportId"]),
            "reportId"
        );
        assert_eq!(key_of(&["dnac", "list-tasks", "--key", "reportId"]), "reportId");
        assert_eq!(
            key_of(&["dnac", "wait-task", "t-1", "--key", "reportId"]),
            "reportId"
        );
    }
}
