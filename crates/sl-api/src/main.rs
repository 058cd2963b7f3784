#[tokio::main]
async fn main() {
    if let Err(err) = sl_api::run().await {
        tracing::error!(error = %err, "sl-api failed");
        eprintln!("sl-api failed: {err}");
        std::process::exit(1);
    }
}
