//! ZHKH tasks service
//!
//! Listens on port 5006 unless `SERVICE_PORT` says otherwise.

use zhkh_services::app::{run, ServiceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(ServiceKind::Tasks).await
}
