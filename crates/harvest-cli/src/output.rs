use std::io::Write;
use std::path::Path;

use harvest_core::{BatchEvent, BatchOutcome};
use harvest_reporting::ReportPaths;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::settings::Settings;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print what is about to be processed and where it goes.
pub fn print_run_header(
    w: &mut dyn Write,
    settings: &Settings,
    pdf_count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let input = settings.input_dir.display().to_string();
    if color.enabled() {
        writeln!(
            w,
            "Found {} PDFs in {}",
            pdf_count.bold(),
            input.bold()
        )?;
    } else {
        writeln!(w, "Found {} PDFs in {}", pdf_count, input)?;
    }
    writeln!(w, "GROBID: {}", settings.grobid_url)?;
    if let Some(dir) = &settings.tei_dir {
        writeln!(w, "Keeping TEI responses in {}", dir.display())?;
    }
    writeln!(w)?;
    Ok(())
}

pub fn progress_bar(total: u64) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} [{bar:40.cyan/dim}] {pos}/{len} {wide_msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ");
    let bar = ProgressBar::new(total);
    bar.set_style(style);
    bar
}

/// One line per finished document, above the bar.
pub fn format_event(event: &BatchEvent, color: ColorMode) -> Option<String> {
    match event {
        BatchEvent::Started { .. } => None,
        BatchEvent::Processed {
            index,
            total,
            filename,
            figure_count,
            link_count,
        } => {
            let detail = format!("{} figures, {} links", figure_count, link_count);
            Some(if color.enabled() {
                format!(
                    "[{}/{}] {} {} ({})",
                    index + 1,
                    total,
                    "OK".green(),
                    filename,
                    detail.dimmed()
                )
            } else {
                format!("[{}/{}] OK {} ({})", index + 1, total, filename, detail)
            })
        }
        BatchEvent::Skipped {
            index,
            total,
            filename,
            status,
        } => Some(if color.enabled() {
            format!(
                "[{}/{}] {} {} (HTTP {})",
                index + 1,
                total,
                "SKIPPED".yellow(),
                filename,
                status
            )
        } else {
            format!("[{}/{}] SKIPPED {} (HTTP {})", index + 1, total, filename, status)
        }),
    }
}

/// Feed a batch event into the progress bar.
pub fn show_event(bar: &ProgressBar, event: &BatchEvent, color: ColorMode) {
    if let BatchEvent::Started { filename, .. } = event {
        bar.set_message(filename.clone());
        return;
    }
    if let Some(line) = format_event(event, color) {
        bar.println(line);
    }
    bar.inc(1);
}

fn print_path(w: &mut dyn Write, label: &str, path: &Path) -> std::io::Result<()> {
    writeln!(w, "  {:<16} {}", label, path.display())
}

/// Final report after the batch and the report files are done.
pub fn print_summary(
    w: &mut dyn Write,
    outcome: &BatchOutcome,
    paths: &ReportPaths,
    color: ColorMode,
) -> std::io::Result<()> {
    let acc = &outcome.accumulator;

    if outcome.cancelled {
        let msg = "Interrupted: reports cover the documents finished before Ctrl+C.";
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }

    if color.enabled() {
        writeln!(w, "{}", "Summary".bold())?;
        writeln!(
            w,
            "  {} processed, {} skipped",
            acc.len().green(),
            outcome.skipped.len().yellow()
        )?;
    } else {
        writeln!(w, "Summary")?;
        writeln!(
            w,
            "  {} processed, {} skipped",
            acc.len(),
            outcome.skipped.len()
        )?;
    }
    writeln!(
        w,
        "  {} figures, {} links",
        acc.total_figures(),
        acc.total_links()
    )?;

    for skipped in &outcome.skipped {
        let line = format!("  skipped {} (HTTP {})", skipped.filename, skipped.status);
        if color.enabled() {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }

    writeln!(w)?;
    writeln!(w, "Reports:")?;
    print_path(w, "summaries", &paths.summaries)?;
    print_path(w, "figure table", &paths.figure_table)?;
    print_path(w, "link table", &paths.link_table)?;
    print_path(w, "word cloud", &paths.word_cloud)?;
    print_path(w, "figure chart", &paths.figure_chart)?;
    Ok(())
}
