//! ZHKH accounts service
//!
//! Listens on port 5001 unless `SERVICE_PORT` says otherwise.

use zhkh_services::app::{run, ServiceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run(ServiceKind::Accounts).await
}
