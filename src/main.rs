use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let code = depfix_cli::run().await;
    std::process::exit(code);
}
