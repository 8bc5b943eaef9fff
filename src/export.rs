use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::types::{LayoutResult, Side};

pub const CSV_HEADER: &str = "side,x_mm,y_mm,w_mm,h_mm,row,col";

/// One exported panel. Coordinates are rounded to whole millimetres.
/// `row`/`col` are derived from the lattice start and pitch and are only a
/// display hint once masking, gap filling or genetic placement ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub side: Side,
    pub x_mm: i64,
    pub y_mm: i64,
    pub w_mm: i64,
    pub h_mm: i64,
    pub row: i64,
    pub col: i64,
}

fn grid_index(offset: f64, pitch: f64) -> i64 {
    if pitch > 0.0 {
        (offset / pitch).round() as i64
    } else {
        0
    }
}

pub fn csv_rows(side: Side, layout: &LayoutResult) -> Vec<CsvRow> {
    let pitch_x = layout.panel_w + layout.gap_x;
    let pitch_y = layout.panel_h + layout.gap_y;
    layout
        .placed_rects
        .iter()
        .map(|r| CsvRow {
            side,
            x_mm: r.x.round() as i64,
            y_mm: r.y.round() as i64,
            w_mm: r.w.round() as i64,
            h_mm: r.h.round() as i64,
            row: grid_index(r.y - layout.start_y, pitch_y),
            col: grid_index(r.x - layout.start_x, pitch_x),
        })
        .collect()
}

pub fn write_csv<W: Write>(mut out: W, rows: &[CsvRow]) -> std::io::Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for r in rows {
        writeln!(
            out,
            "{},{},{},{},{},{},{}",
            r.side, r.x_mm, r.y_mm, r.w_mm, r.h_mm, r.row, r.col
        )?;
    }
    Ok(())
}

/// Writes one side's layout to `path`, creating parent directories.
pub fn export_csv(path: impl AsRef<Path>, side: Side, layout: &LayoutResult) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_csv(file, &csv_rows(side, layout))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::lattice::fill_roof;
    use crate::types::{Alignment, Border, OrientationMode, PanelSpec, RoofPlane};

    fn reference_layout() -> LayoutResult {
        fill_roof(
            &RoofPlane::new(5500.0, 20000.0),
            Border::uniform(300.0),
            &PanelSpec::default(),
            OrientationMode::Portrait,
            Alignment::default(),
        )
    }

    #[test]
    fn test_rows_follow_grid() {
        let rows = csv_rows(Side::Left, &reference_layout());
        assert_eq!(rows.len(), 34);
        assert_eq!(
            rows[0],
            CsvRow {
                side: Side::Left,
                x_mm: 700,
                y_mm: 1000,
                w_mm: 1000,
                h_mm: 1700,
                row: 0,
                col: 0
            }
        );
        assert_eq!((rows[18].row, rows[18].col), (1, 1));
    }

    #[test]
    fn test_off_grid_panel_is_rounded() {
        let layout = reference_layout().with_placed(vec![Rect::new(1249.6, 1899.4, 1000.0, 1700.0)]);
        let rows = csv_rows(Side::Right, &layout);
        assert_eq!((rows[0].x_mm, rows[0].y_mm), (1250, 1899));
        // 549.6 / 1100 and 899.4 / 1800 round to the nearest cell
        assert_eq!((rows[0].col, rows[0].row), (0, 0));
    }

    #[test]
    fn test_write_csv() {
        let layout = reference_layout().with_placed(vec![Rect::new(700.0, 1000.0, 1000.0, 1700.0)]);
        let mut buf = Vec::new();
        write_csv(&mut buf, &csv_rows(Side::Right, &layout)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "side,x_mm,y_mm,w_mm,h_mm,row,col\nR,700,1000,1000,1700,0,0\n");
    }

    #[test]
    fn test_empty_layout_writes_header_only() {
        let layout = reference_layout().with_placed(vec![]);
        let mut buf = Vec::new();
        write_csv(&mut buf, &csv_rows(Side::Left, &layout)).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{CSV_HEADER}\n"));
    }
}
