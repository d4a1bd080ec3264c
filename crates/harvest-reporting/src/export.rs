//! Plain-text and CSV exports of a finished batch.

use std::io::Write;

use harvest_core::BatchAccumulator;

pub const FIGURE_TABLE_HEADER: [&str; 2] = ["Document", "Figure Count"];
pub const LINK_TABLE_HEADER: [&str; 3] = ["document", "section", "url"];

fn csv_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w)
}

/// Abstracts in processing order, separated by single newlines.
pub fn summaries_text(acc: &BatchAccumulator) -> String {
    acc.abstracts().join("\n")
}

/// `Document,Figure Count` table, one row per document.
pub fn write_figure_table<W: Write>(w: W, acc: &BatchAccumulator) -> Result<(), csv::Error> {
    let mut wtr = csv_writer(w);
    wtr.write_record(FIGURE_TABLE_HEADER)?;
    for (filename, count) in acc.figure_counts() {
        wtr.write_record([filename, count.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// `document,section,url` table, one row per extracted link.
pub fn write_link_table<W: Write>(w: W, acc: &BatchAccumulator) -> Result<(), csv::Error> {
    let mut wtr = csv_writer(w);
    wtr.write_record(LINK_TABLE_HEADER)?;
    for link in acc.links() {
        wtr.write_record([
            link.document.as_str(),
            link.section.label(),
            link.url.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::{DocumentResult, ExtractedLink, PaperInfo, Section};

    fn doc(filename: &str, abstract_text: &str, figures: usize, links: &[(Section, &str)]) -> DocumentResult {
        DocumentResult {
            filename: filename.to_string(),
            info: PaperInfo {
                abstract_text: abstract_text.to_string(),
                figure_count: figures,
            },
            links: links
                .iter()
                .map(|(section, url)| ExtractedLink {
                    document: filename.to_string(),
                    section: *section,
                    url: url.to_string(),
                })
                .collect(),
        }
    }

    fn render(f: impl Fn(&mut Vec<u8>) -> Result<(), csv::Error>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_batch_writes_headers_only() {
        let acc = BatchAccumulator::new();
        assert_eq!(summaries_text(&acc), "");
        assert_eq!(
            render(|b| write_figure_table(b, &acc)),
            "Document,Figure Count\n"
        );
        assert_eq!(
            render(|b| write_link_table(b, &acc)),
            "document,section,url\n"
        );
    }

    #[test]
    fn rows_follow_processing_order() {
        let mut acc = BatchAccumulator::new();
        acc.record(doc("z.pdf", "Zed.", 0, &[]));
        acc.record(doc(
            "a.pdf",
            "Ay.",
            4,
            &[
                (Section::Summary, "https://a.org"),
                (Section::References, "www.b.net"),
            ],
        ));

        assert_eq!(summaries_text(&acc), "Zed.\nAy.");
        assert_eq!(
            render(|b| write_figure_table(b, &acc)),
            "Document,Figure Count\nz.pdf,0\na.pdf,4\n"
        );
        assert_eq!(
            render(|b| write_link_table(b, &acc)),
            "document,section,url\na.pdf,summary,https://a.org\na.pdf,references,www.b.net\n"
        );
    }

    #[test]
    fn empty_abstracts_still_take_a_line() {
        let mut acc = BatchAccumulator::new();
        acc.record(doc("a.pdf", "", 0, &[]));
        acc.record(doc("b.pdf", "B.", 0, &[]));
        acc.record(doc("c.pdf", "", 0, &[]));
        assert_eq!(summaries_text(&acc), "\nB.\n");
    }

    #[test]
    fn fields_are_quoted_when_needed() {
        let mut acc = BatchAccumulator::new();
        acc.record(doc(
            "smith, jones.pdf",
            "",
            1,
            &[(Section::Content, "https://x.com/?a=1,2")],
        ));
        assert_eq!(
            render(|b| write_figure_table(b, &acc)),
            "Document,Figure Count\n\"smith, jones.pdf\",1\n"
        );
        assert_eq!(
            render(|b| write_link_table(b, &acc)),
            "document,section,url\n\"smith, jones.pdf\",content,\"https://x.com/?a=1,2\"\n"
        );
    }
}
