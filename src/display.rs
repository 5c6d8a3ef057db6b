//! # Terminal reports and plotting styles
//!
//! * [`BandStyle`] / [`band_style`] – Color and marker of each band, for plotting collaborators.
//! * [`analysis_table`] – `comfy-table` rendering of a batch run.
//! * [`candidates_table`] – `comfy-table` rendering of enriched candidates.
//!
//! Tables use the `UTF8_FULL` preset with dynamic column widths; numeric cells are
//! right-aligned.
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::Itertools;

use crate::{
    analysis::light_curve_fit::FullAnalysisResult, candidates::Candidate, observations::Band,
};

/// Plot style of one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandStyle {
    /// Hex RGB color, e.g. `"#008060"`.
    pub color: &'static str,
    /// Matplotlib-style marker code.
    pub marker: char,
}

/// Default style of `band`.
pub fn band_style(band: Band) -> BandStyle {
    let (color, marker) = match band {
        Band::U => ("#56b4e9", 'o'),
        Band::G => ("#008060", '^'),
        Band::R => ("#ff4000", 'v'),
        Band::I => ("#850000", 's'),
        Band::Z => ("#6600cc", '*'),
        Band::Y => ("#000000", 'p'),
    };
    BandStyle { color, marker }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h)).collect::<Vec<_>>());
    table
}

fn right(content: impl ToString) -> Cell {
    Cell::new(content.to_string()).set_alignment(CellAlignment::Right)
}

/// One row per object, in increasing id order.
///
/// Failed objects show the error message in the last column.
pub fn analysis_table(results: &FullAnalysisResult) -> Table {
    let mut table = new_table(&["Object", "N", "Bands", "Period [d]", "Spread", "Status"]);

    for (id, res) in results.iter().sorted_by_key(|(id, _)| **id) {
        let row = match res {
            Ok(a) => vec![
                right(id),
                right(a.n_points()),
                Cell::new(a.periods.bands_used.iter().join("")),
                right(format!("{:.6}", a.period())),
                right(format!("{:.2e}", a.periods.frequency_spread())),
                Cell::new("ok"),
            ],
            Err(e) => vec![
                right(id),
                right("-"),
                Cell::new("-"),
                right("-"),
                right("-"),
                Cell::new(e.to_string()),
            ],
        };
        table.add_row(Row::from(row));
    }
    table
}

/// One row per candidate, in input order.
pub fn candidates_table(candidates: &[Candidate]) -> Table {
    let mut table = new_table(&[
        "Object", "RA [deg]", "Dec [deg]", "N", "Mag", "σ/F̄", "V", "Period [d]",
    ]);

    for c in candidates {
        let s = &c.summary;
        table.add_row(Row::from(vec![
            right(s.object_id),
            right(format!("{:.5}", s.ra)),
            right(format!("{:.5}", s.dec)),
            right(s.n_sources),
            right(s.magnitude().map_or("-".into(), |m| format!("{m:.2}"))),
            right(format!("{:.3}", s.scatter_ratio())),
            right(format!("{:.1}", s.variability)),
            right(c.period.map_or("-".into(), |p| format!("{p:.6}"))),
        ]));
    }
    table
}
