//! ZHKH payments service
//!
//! Listens on port 5003 unless `SERVICE_PORT` says otherwise.

use zhkh_services::app::{run, ServiceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(ServiceKind::Payments).await
}
