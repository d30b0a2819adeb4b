use tracing_subscriber::EnvFilter;

use grove::presentation::cli::CliApp;

/// ログレベルを指定する環境変数
const LOG_ENV: &str = "GROVE_LOG";

fn main() -> anyhow::Result<()> {
    let app = CliApp::new();

    let default_level = if app.verbose() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    app.run()
}
