// src/container/image.rs

//! Image reference and presence.

use std::fs;

use tracing::info;

use crate::context::RunnerContext;
use crate::errors::{HydraError, Result};
use crate::exec::{CommandRunner, run_checked};
use crate::runner::ExecutionSite;

use super::tool::ContainerTool;

/// `<repository>:<tag>`, with the tag defaulting to `v<version file>`.
pub fn image_ref(ctx: &RunnerContext) -> Result<String> {
    let image = &ctx.config.image;
    let tag = match &image.tag {
        Some(tag) => tag.clone(),
        None => {
            let path = ctx.sct_dir.join(&image.version_file);
            let version = fs::read_to_string(&path).map_err(|e| {
                HydraError::ConfigError(format!(
                    "no [image].tag configured and version file {} is unreadable: {e}",
                    path.display()
                ))
            })?;
            let version = version.trim();
            if version.is_empty() {
                return Err(HydraError::ConfigError(format!(
                    "version file {} is empty",
                    path.display()
                )));
            }
            format!("v{version}")
        }
    };
    Ok(format!("{}:{}", image.repository, tag))
}

/// Pull `image` on the site unless it is already present there.
pub async fn ensure_image(
    site: &ExecutionSite,
    tool: &ContainerTool,
    image: &str,
    runner: &mut dyn CommandRunner,
) -> Result<()> {
    let inspect = site
        .runtime_command(tool)
        .args(["image", "inspect", image]);
    if runner.run(&inspect).await?.is_success() {
        return Ok(());
    }

    info!(image, remote = site.is_remote(), "image not present; pulling");
    let pull = site.runtime_command(tool).args(["pull", image]);
    run_checked(runner, &pull).await?;
    Ok(())
}
