use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    oak_mcp::main_entry().await
}
