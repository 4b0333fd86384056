#[tokio::main]
async fn main() -> std::io::Result<()> {
    horror_cafe::run_with_config().await
}
