//! jmxstat CLI entry point.

use jmxstat_lib::cli::{self, Cli};
use jmxstat_lib::core::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Execute the command
    cli::execute(cli).await
}
