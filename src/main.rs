use console_mcp::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env; settings may also come from flags or the config file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    cli::run_cli().await
}
