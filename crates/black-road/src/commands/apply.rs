//! Apply command - deploy and publish updated state

use anyhow::Result;
use camino::Utf8Path;

use super::common::{provision, Mode};

pub async fn run(config_override: Option<&Utf8Path>) -> Result<()> {
    provision(config_override, Mode::Apply).await
}
