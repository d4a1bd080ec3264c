//! Word-frequency cloud over the batch abstracts.
//!
//! Layout follows the usual word-cloud recipe: words are sized by relative
//! frequency, placed largest first at a random free position, and shrunk
//! step by step until they fit. Free space is tracked on a coarse cell grid
//! with a summed-area table so each fit test is O(1) per candidate position.

use std::collections::HashMap;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fonts::TextMeasure;
use crate::stopwords::is_stopword;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[\w']+").unwrap());

/// Ten evenly spaced stops of the viridis colormap.
const VIRIDIS: [[u8; 3]; 10] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [180, 222, 44],
    [253, 231, 37],
];

/// Occupancy grid resolution in pixels.
const CELL: u32 = 4;

#[derive(Debug, Clone)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub max_words: usize,
    /// Size of the most frequent word. `None` derives it from a trial layout
    /// of the two most frequent words.
    pub max_font_size: Option<f32>,
    pub min_font_size: f32,
    pub font_step: f32,
    /// How strongly frequency drives size (0 = rank only, 1 = proportional).
    pub relative_scaling: f32,
    pub margin: u32,
    pub seed: u64,
    pub background: [u8; 3],
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        Self {
            width: 900,
            height: 450,
            max_words: 200,
            max_font_size: None,
            min_font_size: 4.0,
            font_step: 1.0,
            relative_scaling: 0.5,
            margin: 2,
            seed: 42,
            background: [255, 255, 255],
        }
    }
}

/// A word with its final size, position and colour.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub font_size: f32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub color: [u8; 3],
}

struct Tally {
    key: String,
    /// Spellings seen for this lowercase key, in first-seen order.
    forms: Vec<(String, usize)>,
}

impl Tally {
    fn add(&mut self, form: &str, count: usize) {
        match self.forms.iter_mut().find(|(f, _)| f == form) {
            Some((_, n)) => *n += count,
            None => self.forms.push((form.to_string(), count)),
        }
    }

    fn total(&self) -> usize {
        self.forms.iter().map(|(_, n)| n).sum()
    }

    fn display_form(&self) -> &str {
        let mut best = &self.forms[0];
        for form in &self.forms[1..] {
            if form.1 > best.1 {
                best = form;
            }
        }
        &best.0
    }
}

/// Normalized word frequencies (most frequent = 1.0), highest first, at most
/// `max_words` entries.
///
/// Counting is case-insensitive and reported in the most common spelling.
/// Stopwords, purely numeric tokens and a trailing `'s` are dropped, and a
/// plural ending in a single `s` is folded into its singular when both occur.
pub fn word_frequencies(text: &str, max_words: usize) -> Vec<(String, f32)> {
    let mut tallies: Vec<Option<Tally>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in WORD_RE.find_iter(text) {
        let mut word = m.as_str();
        if is_stopword(word) {
            continue;
        }
        if let Some(stem) = word.strip_suffix("'s").or_else(|| word.strip_suffix("'S")) {
            word = stem;
        }
        if word.chars().all(char::is_numeric) {
            continue;
        }
        let key = word.to_lowercase();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            tallies.push(Some(Tally {
                key,
                forms: Vec::new(),
            }));
            tallies.len() - 1
        });
        if let Some(tally) = tallies[slot].as_mut() {
            tally.add(word, 1);
        }
    }

    for slot in 0..tallies.len() {
        let Some(key) = tallies[slot].as_ref().map(|t| t.key.clone()) else {
            continue;
        };
        if !key.ends_with('s') || key.ends_with("ss") {
            continue;
        }
        let Some(&singular) = index.get(&key[..key.len() - 1]) else {
            continue;
        };
        if tallies[singular].is_none() {
            continue;
        }
        if let Some(plural) = tallies[slot].take()
            && let Some(target) = tallies[singular].as_mut()
        {
            for (form, count) in plural.forms {
                let stem = form.strip_suffix(['s', 'S']).unwrap_or(&form);
                target.add(stem, count);
            }
        }
    }

    let mut counted: Vec<(String, usize)> = tallies
        .into_iter()
        .flatten()
        .map(|t| (t.display_form().to_string(), t.total()))
        .collect();
    // Stable: ties keep first-seen order.
    counted.sort_by(|a, b| b.1.cmp(&a.1));
    counted.truncate(max_words);

    let Some(&(_, top)) = counted.first() else {
        return Vec::new();
    };
    counted
        .into_iter()
        .map(|(word, n)| (word, n as f32 / top as f32))
        .collect()
}

struct OccupancyGrid {
    cols: u32,
    rows: u32,
    cells: Vec<bool>,
    /// Summed-area table, (cols + 1) x (rows + 1).
    sums: Vec<u32>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32) -> Self {
        let cols = width / CELL;
        let rows = height / CELL;
        Self {
            cols,
            rows,
            cells: vec![false; (cols * rows) as usize],
            sums: vec![0; ((cols + 1) * (rows + 1)) as usize],
        }
    }

    fn sum_at(&self, col: u32, row: u32) -> u32 {
        self.sums[(row * (self.cols + 1) + col) as usize]
    }

    fn rebuild_sums(&mut self) {
        let stride = self.cols + 1;
        for row in 0..self.rows {
            let mut run = 0;
            for col in 0..self.cols {
                run += u32::from(self.cells[(row * self.cols + col) as usize]);
                let above = self.sums[(row * stride + col + 1) as usize];
                self.sums[((row + 1) * stride + col + 1) as usize] = above + run;
            }
        }
    }

    fn is_free(&self, col: u32, row: u32, w: u32, h: u32) -> bool {
        let total = self.sum_at(col + w, row + h) + self.sum_at(col, row)
            - self.sum_at(col + w, row)
            - self.sum_at(col, row + h);
        total == 0
    }

    /// Pick a uniformly random free top-left corner for a `width` x `height`
    /// pixel box, in pixel coordinates.
    fn sample_free(&self, width: u32, height: u32, rng: &mut fastrand::Rng) -> Option<(u32, u32)> {
        let w = width.div_ceil(CELL);
        let h = height.div_ceil(CELL);
        if w > self.cols || h > self.rows {
            return None;
        }
        let candidates = move || {
            (0..=self.rows - h)
                .flat_map(move |row| (0..=self.cols - w).map(move |col| (col, row)))
                .filter(move |&(col, row)| self.is_free(col, row, w, h))
        };
        let hits = candidates().count();
        if hits == 0 {
            return None;
        }
        candidates()
            .nth(rng.usize(..hits))
            .map(|(col, row)| (col * CELL, row * CELL))
    }

    fn occupy(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let col_end = (x + width).div_ceil(CELL).min(self.cols);
        let row_end = (y + height).div_ceil(CELL).min(self.rows);
        for row in y / CELL..row_end {
            for col in x / CELL..col_end {
                self.cells[(row * self.cols + col) as usize] = true;
            }
        }
        self.rebuild_sums();
    }
}

fn place<M: TextMeasure + ?Sized>(
    frequencies: &[(String, f32)],
    max_font_size: f32,
    options: &WordCloudOptions,
    measure: &M,
) -> Vec<PlacedWord> {
    let mut rng = fastrand::Rng::with_seed(options.seed);
    let mut grid = OccupancyGrid::new(options.width, options.height);
    let mut placed = Vec::new();
    let mut font_size = max_font_size;
    let mut last_freq = 1.0f32;
    let margin = options.margin;

    for (word, freq) in frequencies.iter().take(options.max_words) {
        if *freq <= 0.0 {
            continue;
        }
        let rs = options.relative_scaling;
        if rs != 0.0 {
            font_size = ((rs * (freq / last_freq) + (1.0 - rs)) * font_size).round();
        }

        let mut spot = None;
        while font_size >= options.min_font_size {
            let (w, h) = measure.text_size(word, font_size);
            if let Some((x, y)) = grid.sample_free(w + margin, h + margin, &mut rng) {
                spot = Some((x, y, w, h));
                break;
            }
            font_size -= options.font_step;
        }
        // Once nothing fits at the minimum size, smaller words won't either.
        let Some((x, y, w, h)) = spot else {
            break;
        };

        grid.occupy(x, y, w + margin, h + margin);
        placed.push(PlacedWord {
            text: word.clone(),
            font_size,
            x: x + margin / 2,
            y: y + margin / 2,
            width: w,
            height: h,
            color: VIRIDIS[rng.usize(..VIRIDIS.len())],
        });
        last_freq = *freq;
    }
    placed
}

/// Compute sizes and positions for `frequencies` on the canvas.
pub fn layout_words<M: TextMeasure + ?Sized>(
    frequencies: &[(String, f32)],
    options: &WordCloudOptions,
    measure: &M,
) -> Vec<PlacedWord> {
    let max_font_size = match options.max_font_size {
        Some(size) => size,
        None => {
            let head = &frequencies[..frequencies.len().min(2)];
            let trial = place(head, options.height as f32, options, measure);
            match trial.as_slice() {
                [] => return Vec::new(),
                [only] => only.font_size,
                [a, b, ..] => (2.0 * a.font_size * b.font_size / (a.font_size + b.font_size)).floor(),
            }
        }
    };
    place(frequencies, max_font_size, options, measure)
}

/// Draw placed words onto a blank canvas. Without a font the canvas stays
/// blank.
pub fn render_word_cloud(
    placed: &[PlacedWord],
    options: &WordCloudOptions,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(options.width, options.height, Rgb(options.background));
    let Some(font) = font else {
        return img;
    };
    for word in placed {
        draw_text_mut(
            &mut img,
            Rgb(word.color),
            word.x as i32,
            word.y as i32,
            PxScale::from(word.font_size),
            font,
            &word.text,
        );
    }
    img
}

/// Word cloud of every abstract, space-joined in processing order.
pub fn build_word_cloud(
    abstracts: &[String],
    options: &WordCloudOptions,
    font: Option<&FontVec>,
) -> RgbImage {
    let text = abstracts.join(" ");
    let frequencies = word_frequencies(&text, options.max_words);
    let placed = match font {
        Some(font) => layout_words(&frequencies, options, font),
        None => Vec::new(),
    };
    tracing::debug!(
        distinct = frequencies.len(),
        placed = placed.len(),
        "word cloud laid out"
    );
    render_word_cloud(&placed, options, font)
}
