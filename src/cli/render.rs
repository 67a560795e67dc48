//! `cdnify render`

use anyhow::Result;

use crate::cli::RenderArgs;
use crate::config::ProjectConfig;
use crate::render::render_tag;

/// Tag markup for the requested assets, exactly as a template would embed it.
pub fn render_assets(config: &ProjectConfig, args: &RenderArgs) -> Result<String> {
    let mut options = config.render_options();
    if let Some(production) = args.production() {
        options.production = production;
    }

    Ok(render_tag(&options, &args.reference(), &args.attributes())?)
}
