//! # ZHKH API Gateway
//!
//! ```bash
//! cargo run -p zhkh-gateway
//! ```

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    zhkh_gateway::app::run().await
}
