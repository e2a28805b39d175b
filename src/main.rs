use clap::Parser;

use assistantmd::app::bootstrap;
use assistantmd::app::cli::{self, Cli};
use assistantmd::engine::activity_log;

#[tokio::main]
async fn main() {
    let system_root = match bootstrap::required_env("CONTAINER_SYSTEM_ROOT") {
        Ok(root) => root,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    let _guard = activity_log::init(&system_root);

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
