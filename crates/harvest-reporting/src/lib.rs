//! Report files for a finished extraction batch: the abstract dump, the
//! figure and link tables, a word cloud of the abstracts and a figure chart.

pub mod chart;
pub mod export;
pub mod fonts;
pub mod stopwords;
pub mod wordcloud;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use harvest_core::BatchAccumulator;

pub use chart::{ChartOptions, bar_layout, render_bar_chart};
pub use export::{summaries_text, write_figure_table, write_link_table};
pub use fonts::{TextMeasure, load_font};
pub use wordcloud::{WordCloudOptions, build_word_cloud, layout_words, word_frequencies};

pub const SUMMARIES_FILE: &str = "summaries.txt";
pub const FIGURE_TABLE_FILE: &str = "figure_data.csv";
pub const LINK_TABLE_FILE: &str = "extracted_links.csv";
pub const WORD_CLOUD_FILE: &str = "word_cloud_output.png";
pub const FIGURE_CHART_FILE: &str = "figure_chart.png";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("cannot load font {path}: {message}")]
    Font { path: PathBuf, message: String },
}

impl ReportError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where each report landed.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub summaries: PathBuf,
    pub figure_table: PathBuf,
    pub link_table: PathBuf,
    pub word_cloud: PathBuf,
    pub figure_chart: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            summaries: dir.join(SUMMARIES_FILE),
            figure_table: dir.join(FIGURE_TABLE_FILE),
            link_table: dir.join(LINK_TABLE_FILE),
            word_cloud: dir.join(WORD_CLOUD_FILE),
            figure_chart: dir.join(FIGURE_CHART_FILE),
        }
    }

    pub fn all(&self) -> [&Path; 5] {
        [
            &self.summaries,
            &self.figure_table,
            &self.link_table,
            &self.word_cloud,
            &self.figure_chart,
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub word_cloud: WordCloudOptions,
    pub chart: ChartOptions,
}

fn create(path: &Path) -> Result<BufWriter<File>, ReportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(ReportError::io(path))
}

/// Write the abstracts, one per line, to `path`.
pub fn write_summaries(path: &Path, acc: &BatchAccumulator) -> Result<(), ReportError> {
    let mut out = create(path)?;
    out.write_all(summaries_text(acc).as_bytes())
        .and_then(|()| out.flush())
        .map_err(ReportError::io(path))
}

fn write_csv(
    path: &Path,
    acc: &BatchAccumulator,
    write: fn(BufWriter<File>, &BatchAccumulator) -> Result<(), csv::Error>,
) -> Result<(), ReportError> {
    write(create(path)?, acc)?;
    Ok(())
}

/// Write all five reports into `output_dir`, creating it if needed.
///
/// Runs for empty batches too: the text file is empty, the tables carry only
/// their headers, and both images are blank canvases.
pub fn write_reports(
    output_dir: &Path,
    acc: &BatchAccumulator,
    options: &ReportOptions,
    font: Option<&FontVec>,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(output_dir).map_err(ReportError::io(output_dir))?;
    let paths = ReportPaths::in_dir(output_dir);

    write_summaries(&paths.summaries, acc)?;
    write_csv(&paths.figure_table, acc, write_figure_table)?;
    write_csv(&paths.link_table, acc, write_link_table)?;

    let cloud = build_word_cloud(acc.abstracts(), &options.word_cloud, font);
    cloud.save(&paths.word_cloud)?;

    let data: Vec<(&str, usize)> = acc.figure_counts().collect();
    let chart = render_bar_chart(&data, &options.chart, font);
    chart.save(&paths.figure_chart)?;

    tracing::info!(
        dir = %output_dir.display(),
        documents = acc.len(),
        links = acc.total_links(),
        "reports written"
    );
    Ok(paths)
}
