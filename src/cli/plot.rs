//! SVG bar chart of the aggregate monthly series

use crate::util::date::MonthKey;

use svg::{
    node::element::{Line, Rectangle},
    Document,
};

pub struct Plotter<'d> {
    data: &'d [(MonthKey, i64)],
}

const FWIDTH: f64 = 1000.0;
const FHEIGHT: f64 = 700.0;
const MARGIN: f64 = 20.0;
const STROKE_WIDTH: f64 = 2.0;
const BAR_FILL: &str = "steelblue";

impl<'d> Plotter<'d> {
    pub fn from(data: &'d [(MonthKey, i64)]) -> Self {
        Self { data }
    }

    /// Write the series as one bar per month
    ///
    /// The vertical scale runs from zero to the largest monthly total, so
    /// an all-zero series renders as an empty frame rather than dividing
    /// by zero.
    pub fn render_bar_chart(&self, file: &str) -> std::io::Result<()> {
        let ymax = self
            .data
            .iter()
            .map(|&(_, amount)| amount)
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        let slots = self.data.len().max(1) as f64;
        let slot = FWIDTH / slots;
        let resize_y = |amount: i64| amount as f64 / ymax * FHEIGHT;
        let mut document = Document::new();
        for (i, &(_, amount)) in self.data.iter().enumerate() {
            if amount <= 0 {
                continue;
            }
            let height = resize_y(amount);
            document = document.add(
                Rectangle::new()
                    .set("x", i as f64 * slot + slot * 0.1)
                    .set("y", FHEIGHT - height)
                    .set("width", slot * 0.8)
                    .set("height", height)
                    .set("fill", BAR_FILL),
            );
        }
        let yaxis = Line::new()
            .set("x1", 0.0)
            .set("x2", 0.0)
            .set("y1", 0.0)
            .set("y2", FHEIGHT)
            .set("stroke", "black")
            .set("stroke-width", STROKE_WIDTH);
        let xaxis = Line::new()
            .set("x1", 0.0)
            .set("x2", FWIDTH)
            .set("y1", FHEIGHT)
            .set("y2", FHEIGHT)
            .set("stroke", "black")
            .set("stroke-width", STROKE_WIDTH);
        let document = document.add(yaxis).add(xaxis).set(
            "viewBox",
            (
                -MARGIN,
                -MARGIN,
                FWIDTH + 2.0 * MARGIN,
                FHEIGHT + 2.0 * MARGIN,
            ),
        );
        svg::save(file, &document)
    }
}
