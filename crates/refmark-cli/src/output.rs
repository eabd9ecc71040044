use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;

use refmark_core::PageAnnotations;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn marker_count(pages: &[PageAnnotations]) -> usize {
    pages.iter().map(|p| p.annotations.len()).sum()
}

/// Print the extraction summary after the page walk.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    pdf_path: &Path,
    pages: &[PageAnnotations],
    color: ColorMode,
) -> std::io::Result<()> {
    let markers = marker_count(pages);
    writeln!(
        w,
        "Extracted {} citation markers across {} pages from {}",
        markers,
        pages.len(),
        pdf_path.display()
    )?;

    let without_target = pages
        .iter()
        .flat_map(|p| &p.annotations)
        .filter(|a| a.target.is_none())
        .count();
    if without_target > 0 {
        let line = format!("({without_target} markers have no resolvable target)");
        if color.enabled() {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{line}")?;
        }
    }
    Ok(())
}

/// Print the linking summary: how many markers matched a bibliography entry.
pub fn print_link_summary(
    w: &mut dyn Write,
    pdf_path: &Path,
    pages: &[PageAnnotations],
    reference_count: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    print_extraction_summary(w, pdf_path, pages, color)?;

    let matched = pages
        .iter()
        .flat_map(|p| &p.annotations)
        .filter(|a| a.metadata.is_some())
        .count();
    let total = marker_count(pages);

    let line = format!("Linked {matched}/{total} markers against {reference_count} bibliography entries");
    if color.enabled() {
        if matched == total && total > 0 {
            writeln!(w, "{}", line.green())?;
        } else if matched == 0 {
            writeln!(w, "{}", line.yellow())?;
        } else {
            writeln!(w, "{line}")?;
        }
    } else {
        writeln!(w, "{line}")?;
    }
    Ok(())
}
