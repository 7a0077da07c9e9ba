use dayone_lib::dayone::{EntryPreview, ImportReport};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Wrap text in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Render the outcome of an import run
pub fn render_report(report: &ImportReport, use_color: bool) -> String {
    let mut lines = Vec::new();

    let headline_color = if report.failed.is_empty() { Color::GREEN } else { Color::YELLOW };
    lines.push(paint(&report.summary(), headline_color, use_color));

    let media_total = report.media_copied + report.media_existing + report.media_missing + report.media_failed;
    if media_total > 0 {
        lines.push(format!(
            "  Media: {} copied, {} already present, {} missing, {} failed",
            report.media_copied, report.media_existing, report.media_missing, report.media_failed
        ));
    }

    for failed in &report.failed {
        lines.push(format!(
            "  {} {}: {}",
            paint("failed", Color::RED, use_color),
            failed.uuid.as_deref().unwrap_or("unknown"),
            failed.error
        ));
    }

    if let Some(path) = &report.failure_report {
        lines.push(format!("  Failures listed in {}", paint(path, Color::BOLD, use_color)));
    }

    lines.join("\n")
}

/// Render a preview table: one line per entry
pub fn render_previews(previews: &[EntryPreview], use_color: bool) -> String {
    let uuid_width = previews
        .iter()
        .map(|p| p.uuid.as_deref().unwrap_or("unknown").len())
        .max()
        .unwrap_or(4)
        .clamp(4, 36);

    let mut lines = vec![format!("{:<w$} {}", "UUID", "Note", w = uuid_width)];
    lines.push(format!("{} {}", "\u{2500}".repeat(uuid_width), "\u{2500}".repeat(40)));

    for preview in previews {
        let uuid = preview.uuid.as_deref().unwrap_or("unknown");
        let target = match (&preview.path, &preview.error) {
            (Some(path), _) if preview.media_count > 0 => format!(
                "{} {}",
                path,
                paint(&format!("(+{} media)", preview.media_count), Color::DIM, use_color)
            ),
            (Some(path), _) => path.clone(),
            (None, Some(error)) => paint(error, Color::RED, use_color),
            (None, None) => String::new(),
        };
        lines.push(format!("{:<w$} {}", uuid, target, w = uuid_width));
    }

    let failing = previews.iter().filter(|p| p.error.is_some()).count();
    lines.push(String::new());
    lines.push(format!("{} entries, {} would fail", previews.len(), failing));

    lines.join("\n")
}
