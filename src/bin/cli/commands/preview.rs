use anyhow::{Context, Result};
use chrono::FixedOffset;

use dayone_lib::dayone::preview_entries;

use crate::app::App;
use crate::render::terminal::render_previews;
use crate::{OutputFormat, SourceArgs};

pub async fn run(app: &App, source: &SourceArgs, utc: bool, format: &OutputFormat, use_color: bool) -> Result<()> {
    let source = app.load_source(source).await?;
    let offset = if utc {
        Some(FixedOffset::east_opt(0).context("Invalid UTC offset")?)
    } else {
        None
    };

    let previews = preview_entries(&source.document, &app.config, offset);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&previews)?);
        }
        OutputFormat::Plain => {
            println!("Source: {}", source.label);
            println!("Media: {}\n", source.media.describe());
            println!("{}", render_previews(&previews, use_color));
        }
    }

    Ok(())
}
