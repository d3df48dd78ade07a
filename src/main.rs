#[tokio::main]
async fn main() -> std::io::Result<()> {
    live_track::run_with_config().await
}
