//! Binary entry point.
//!
//! Responsibility:
//! - tokio runtime startup
//! - delegate to app::run() (no logic here)
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    auth_layer::app::run().await
}
