#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classquiz_rust::run().await {
        eprintln!("classquiz-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
