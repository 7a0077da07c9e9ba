use anyhow::{Context, Result};
use chrono::FixedOffset;

use dayone_lib::dayone::Importer;

use crate::app::App;
use crate::render::terminal::render_report;
use crate::{ImportArgs, OutputFormat};

pub async fn run(app: &App, args: &ImportArgs, format: &OutputFormat, use_color: bool) -> Result<()> {
    // Flags override the saved settings for this run only
    let mut config = app.config.clone();
    if let Some(folder) = &args.folder {
        config.set("importFolder", folder)?;
    }
    if args.uuid_filenames {
        config.use_uuid_filenames = true;
    }
    if let Some(policy) = &args.on_duplicate {
        config.set("onDuplicate", policy)?;
    }

    let source = app.load_source(&args.source).await?;
    log::info!("Read {} entries from {}", source.document.entries.len(), source.label);

    let mut importer = Importer::new(&app.store, source.media.as_ref(), &config);
    if args.utc {
        importer = importer.with_offset(FixedOffset::east_opt(0).context("Invalid UTC offset")?);
    }

    let report = importer
        .run_with_progress(&source.document, |done, total, uuid| {
            log::debug!("[{}/{}] {}", done, total, uuid);
        })
        .await
        .with_context(|| format!("Failed to prepare {}", config.import_folder))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_report(&report, use_color));
        }
    }

    Ok(())
}
