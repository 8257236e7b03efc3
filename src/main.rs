//! shellbridge driver binary
//!
//! Opens one session and turns stdin lines into `execute` calls, printing
//! each result as a JSON line. Useful for poking at the engine by hand:
//!
//! ```text
//! $ shellbridge [WORK_DIR]
//! echo hello
//! {"output":"hello","status":"completed","exit_code":0,...}
//! ```
//!
//! Configuration is read from the file named by `SHELLBRIDGE_CONFIG` when
//! set; log verbosity follows `RUST_LOG`.

use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use shellbridge::{ExecuteOptions, Result, SessionConfig, SessionRegistry};

const SESSION_ID: &str = "default";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shellbridge=info")),
        )
        .init();

    let config_path = std::env::var_os("SHELLBRIDGE_CONFIG").map(PathBuf::from);
    let mut config = SessionConfig::load_or_default(config_path.as_deref());

    if let Some(work_dir) = std::env::args_os().nth(1) {
        config.default_work_dir = PathBuf::from(work_dir);
    }

    let registry = SessionRegistry::new(config.clone());
    let opts = ExecuteOptions::default().with_timeout(config.default_timeout());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = registry.execute(SESSION_ID, &line, opts).await?;
        println!("{}", serde_json::to_string(&result)?);
    }

    registry.close_all().await;
    Ok(())
}
