#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = assignments_rust::run().await {
        eprintln!("assignments-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
