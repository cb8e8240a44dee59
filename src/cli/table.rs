//! Unicode table rendering of the dashboard
//!
//! One row per month of the window, one column per business, plus a Total
//! column. Cells hold the rounded monthly amount and stay blank when the
//! month contributes nothing, so active periods stand out at a glance.

use std::fmt;

use crate::util::date::MonthKey;

/// A rounded monthly series under a column heading
pub type Column = (String, Vec<(MonthKey, i64)>);

pub struct Table<'d> {
    title: String,
    months: &'d [MonthKey],
    columns: &'d [Column],
    total: &'d [(MonthKey, i64)],
}

struct BoxFmt {
    width: usize,
    text: String,
}

struct ColFmt {
    width: usize,
    label: BoxFmt,
    boxes: Vec<BoxFmt>,
}

struct GridFmt {
    labels: ColFmt,
    columns: Vec<ColFmt>,
}

impl<'d> Table<'d> {
    /// Caller guarantees that every column series covers exactly `months`,
    /// in the same order (which `compute_series` does by contract)
    pub fn from(months: &'d [MonthKey], columns: &'d [Column], total: &'d [(MonthKey, i64)]) -> Self {
        Self {
            title: String::new(),
            months,
            columns,
            total,
        }
    }

    pub fn with_title<S>(mut self, title: S) -> Self
    where
        S: ToString,
    {
        self.title = title.to_string();
        self
    }

    fn to_formatter(&self) -> GridFmt {
        let cols = self
            .columns
            .iter()
            .map(|(name, _)| BoxFmt::from(name.clone()))
            .chain(std::iter::once(BoxFmt::from(String::from("Total"))))
            .map(ColFmt::with_label)
            .collect::<Vec<_>>();
        let mut grid = GridFmt::with_columns(cols);
        for (idx, month) in self.months.iter().enumerate() {
            grid.push_line(
                BoxFmt::month(*month),
                self.columns
                    .iter()
                    .map(|(_, series)| BoxFmt::amount(series[idx].1))
                    .chain(std::iter::once(BoxFmt::amount(self.total[idx].1)))
                    .collect::<Vec<_>>(),
            );
        }
        grid
    }
}

impl BoxFmt {
    fn from(text: String) -> Self {
        let width = text.chars().count();
        Self { text, width }
    }

    fn amount(a: i64) -> Self {
        if a != 0 {
            Self::from(format!("{}", a))
        } else {
            Self::from(String::new())
        }
    }

    fn month(m: MonthKey) -> Self {
        Self::from(format!("{}", m))
    }
}

impl ColFmt {
    fn with_label(label: BoxFmt) -> Self {
        Self {
            width: label.width + 3,
            label,
            boxes: Vec::new(),
        }
    }

    fn push(&mut self, b: BoxFmt) {
        self.width = self.width.max(b.width + 3);
        self.boxes.push(b);
    }
}

impl GridFmt {
    fn with_columns(columns: Vec<ColFmt>) -> Self {
        Self {
            labels: ColFmt::with_label(BoxFmt::from(String::new())),
            columns,
        }
    }

    fn push_line(&mut self, label: BoxFmt, boxes: Vec<BoxFmt>) {
        self.labels.push(label);
        for (i, b) in boxes.into_iter().enumerate() {
            self.columns[i].push(b);
        }
    }
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.title.is_empty() {
            writeln!(f, "{}", self.title)?;
        }
        write!(f, "{}", self.to_formatter())
    }
}

impl fmt::Display for GridFmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // upper border
        write!(f, "{}", ULCORNER)?;
        self.labels.hline(f)?;
        for c in &self.columns {
            write!(f, "{}", LOJOIN)?;
            c.hline(f)?;
        }
        writeln!(f, "{}", URCORNER)?;
        // title line
        write!(f, "{}", VLINE)?;
        self.labels.write_label(f)?;
        for c in &self.columns {
            write!(f, "{}", VLINE)?;
            c.write_label(f)?;
        }
        writeln!(f, "{}", VLINE)?;
        // separator
        write!(f, "{}", RTJOIN)?;
        self.labels.hline(f)?;
        for c in &self.columns {
            write!(f, "{}", CROSS)?;
            c.hline(f)?;
        }
        writeln!(f, "{}", LTJOIN)?;

        // main block
        for idx in 0..self.labels.len() {
            write!(f, "{}", VLINE)?;
            self.labels.write_item(f, idx, false)?;
            for c in &self.columns {
                write!(f, "{}", VLINE)?;
                c.write_item(f, idx, true)?;
            }
            writeln!(f, "{}", VLINE)?;
        }
        // lower border
        write!(f, "{}", DLCORNER)?;
        self.labels.hline(f)?;
        for c in &self.columns {
            write!(f, "{}", HIJOIN)?;
            c.hline(f)?;
        }
        writeln!(f, "{}", DRCORNER)?;
        Ok(())
    }
}

impl ColFmt {
    fn write_label(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.label.write(f, self.width, true)
    }

    fn write_item(&self, f: &mut fmt::Formatter, idx: usize, right: bool) -> fmt::Result {
        self.boxes[idx].write(f, self.width, right)
    }

    fn len(&self) -> usize {
        self.boxes.len()
    }

    fn hline(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &HLINE[..(self.width + 2) * 3])
    }
}

const PADDING: &str = "                                                            ";
const HLINE: &str = "────────────────────────────────────────────────────────────";
const VLINE: &str = "│";
const ULCORNER: &str = "┌";
const URCORNER: &str = "┐";
const DLCORNER: &str = "└";
const DRCORNER: &str = "┘";
const LTJOIN: &str = "┤";
const RTJOIN: &str = "├";
const HIJOIN: &str = "┴";
const LOJOIN: &str = "┬";
const CROSS: &str = "┼";

impl BoxFmt {
    fn write(&self, f: &mut fmt::Formatter, width: usize, right: bool) -> fmt::Result {
        if right {
            write!(
                f,
                " {}{} ",
                &PADDING[..width.saturating_sub(self.width)],
                self.text
            )
        } else {
            write!(
                f,
                " {}{} ",
                self.text,
                &PADDING[..width.saturating_sub(self.width)]
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::date::Month::*;

    #[test]
    fn blank_cells_for_zero() {
        let months = vec![MonthKey::new(2025, Jan), MonthKey::new(2025, Feb)];
        let columns = vec![(
            "Acme".to_string(),
            vec![(months[0], 0), (months[1], 80)],
        )];
        let total = vec![(months[0], 0), (months[1], 80)];
        let rendered = format!("{}", Table::from(&months, &columns, &total).with_title("Cash"));
        assert!(rendered.starts_with("Cash\n"));
        assert!(rendered.contains("Acme"));
        assert!(rendered.contains("Total"));
        assert!(rendered.contains("2025-Jan"));
        assert!(rendered.contains("80"));
    }
}
