//! Monthly revenue aggregation
//!
//! Everything here is a pure function of an item snapshot and a list of
//! target months. Two accounting modes are supported: `Cash` counts money
//! in the month it actually changes hands (a yearly subscription pays its
//! full price in its anniversary month), `Normalized` spreads recurring
//! prices evenly over every active month (a yearly price contributes one
//! twelfth per month) and ignores one-time and variable income entirely.
//!
//! Partial months are not prorated: a subscription starting or ending
//! mid-month counts for the whole month. Monthly totals are summed exactly
//! and rounded once, so per-item rounding error never accumulates.

use std::fmt;
use std::str::FromStr;

use crate::util::{
    date::MonthKey,
    item::{Amount, Billing, Cadence, Item},
};

/// Accounting mode of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Revenue in the month money is received
    Cash,
    /// Monthly-recurring-revenue equivalent
    Normalized,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "cash" => Ok(Mode::Cash),
            "mrr" | "normalized" => Ok(Mode::Normalized),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Cash => write!(f, "Cash"),
            Mode::Normalized => write!(f, "MRR"),
        }
    }
}

impl Item {
    /// Whether the item counts as active in `month`
    ///
    /// A recurring item is active in every month that overlaps
    /// `[from, until]`, bounds included, whole months: starting or ending
    /// mid-month covers that entire month. One-time items are active only
    /// in the month of their payment date, variable items only in months
    /// they have an explicit amount for.
    pub fn is_active(&self, month: MonthKey) -> bool {
        match &self.billing {
            Billing::OneTime { on, .. } => on.month_key() == month,
            Billing::Variable { amounts } => amounts.contains_key(&month),
            Billing::Recurring { from, until, .. } => {
                *from <= month.last_day()
                    && until.map_or(true, |u| u >= month.first_day())
            }
        }
    }

    /// The cash payment recognized in `month`, if any
    ///
    /// Monthly cadence pays every active month, yearly cadence pays only in
    /// the anniversary month of the subscription start.
    pub fn cash_in(&self, month: MonthKey) -> Option<Amount> {
        match &self.billing {
            Billing::OneTime { price, on } => {
                (on.month_key() == month).then(|| *price)
            }
            Billing::Variable { amounts } => amounts.get(&month).copied(),
            Billing::Recurring { price, cadence, from, .. } => {
                let pays = self.is_active(month)
                    && match cadence {
                        Cadence::Monthly => true,
                        Cadence::Yearly => month.month() == from.month(),
                    };
                pays.then(|| *price)
            }
        }
    }

    /// Months of `[from, to]` in which a cash payment is recognized
    pub fn cash_months(&self, from: MonthKey, to: MonthKey) -> Vec<MonthKey> {
        from.range_to(to)
            .filter(|&m| self.cash_in(m).is_some())
            .collect()
    }

    /// Monthly-equivalent contribution for normalized accounting, in
    /// currency units
    ///
    /// Applies uniformly to every active month regardless of which month
    /// the cash payment falls in. One-time and variable income never
    /// contribute to a recurring base.
    pub fn normalized_monthly(&self) -> f64 {
        match &self.billing {
            Billing::OneTime { .. } | Billing::Variable { .. } => 0.0,
            Billing::Recurring { price, cadence, .. } => match cadence {
                Cadence::Monthly => price.units(),
                Cadence::Yearly => price.units() / 12.0,
            },
        }
    }
}

/// Monthly totals over a fixed list of target months
///
/// Totals are kept exact (in currency units) while items are added and only
/// rounded when read out, one rounding per month.
#[derive(Debug, Clone)]
pub struct Series {
    points: Vec<(MonthKey, f64)>,
}

impl Series {
    /// All-zero totals over the given months, kept in the given order
    pub fn zeroed(months: &[MonthKey]) -> Self {
        Self {
            points: months.iter().map(|&m| (m, 0.0)).collect(),
        }
    }

    /// Add one item's contribution to every month of the series
    pub fn add(&mut self, item: &Item, mode: Mode) {
        match mode {
            Mode::Cash => {
                for (month, total) in &mut self.points {
                    if let Some(amount) = item.cash_in(*month) {
                        *total += amount.units();
                    }
                }
            }
            Mode::Normalized => {
                let monthly = item.normalized_monthly();
                if monthly == 0.0 {
                    return;
                }
                for (month, total) in &mut self.points {
                    if item.is_active(*month) {
                        *total += monthly;
                    }
                }
            }
        }
    }

    /// Read out the series, each monthly total rounded to the nearest whole
    /// currency unit
    pub fn rounded(&self) -> Vec<(MonthKey, i64)> {
        self.points
            .iter()
            .map(|&(m, total)| (m, total.round() as i64))
            .collect()
    }
}

/// Aggregate a snapshot of items into one rounded total per target month
///
/// Output covers exactly `months`, in the same order. An empty snapshot
/// yields all-zero totals, an empty month list yields an empty series.
pub fn compute_series<'i, I>(items: I, mode: Mode, months: &[MonthKey]) -> Vec<(MonthKey, i64)>
where
    I: IntoIterator<Item = &'i Item>,
{
    let mut series = Series::zeroed(months);
    for item in items {
        series.add(item, mode);
    }
    series.rounded()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::date::{Date, Month::*};
    use std::collections::BTreeMap;

    macro_rules! dt {
        ( $y:tt - $m:tt - $d:tt ) => {
            Date::from($y, $m, $d).unwrap()
        }
    }
    macro_rules! mk {
        ( $y:tt - $m:tt ) => {
            MonthKey::new($y, $m)
        }
    }

    fn sub(cents: isize, cadence: Cadence, from: Date, until: Option<Date>) -> Item {
        Item {
            name: "sub".to_string(),
            billing: Billing::Recurring {
                price: Amount(cents),
                cadence,
                from,
                until,
            },
        }
    }

    fn once(cents: isize, on: Date) -> Item {
        Item {
            name: "once".to_string(),
            billing: Billing::OneTime { price: Amount(cents), on },
        }
    }

    fn var(cells: &[(MonthKey, isize)]) -> Item {
        Item {
            name: "var".to_string(),
            billing: Billing::Variable {
                amounts: cells
                    .iter()
                    .map(|&(m, c)| (m, Amount(c)))
                    .collect::<BTreeMap<_, _>>(),
            },
        }
    }

    fn year_2025() -> Vec<MonthKey> {
        mk!(2025-Jan).range_to(mk!(2025-Dec)).collect()
    }

    fn amounts(series: &[(MonthKey, i64)]) -> Vec<i64> {
        series.iter().map(|&(_, a)| a).collect()
    }

    #[test]
    fn monthly_sub_whole_start_month() {
        // starts mid-May, still counts for all of May
        let item = sub(8000, Cadence::Monthly, dt!(2025-May-10), None);
        let months = year_2025();
        let cash = compute_series([&item], Mode::Cash, &months);
        assert_eq!(amounts(&cash), vec![0, 0, 0, 0, 80, 80, 80, 80, 80, 80, 80, 80]);
        // monthly cadence normalizes to the price itself
        let mrr = compute_series([&item], Mode::Normalized, &months);
        assert_eq!(cash, mrr);
        assert_eq!(amounts(&cash).iter().sum::<i64>(), 8 * 80);
    }

    #[test]
    fn monthly_sub_active_all_year() {
        let item = sub(1500, Cadence::Monthly, dt!(2024-Jun-01), None);
        let months = year_2025();
        for mode in [Mode::Cash, Mode::Normalized] {
            let series = compute_series([&item], mode, &months);
            assert_eq!(amounts(&series), vec![15; 12]);
            assert_eq!(amounts(&series).iter().sum::<i64>(), 12 * 15);
        }
    }

    #[test]
    fn yearly_sub_anniversary() {
        let item = sub(90000, Cadence::Yearly, dt!(2025-Feb-21), None);
        let months = year_2025();
        let cash = compute_series([&item], Mode::Cash, &months);
        assert_eq!(amounts(&cash), vec![0, 900, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // 900 / 12 = 75 in every active month, inactive before the start
        let mrr = compute_series([&item], Mode::Normalized, &months);
        assert_eq!(amounts(&mrr), vec![0, 75, 75, 75, 75, 75, 75, 75, 75, 75, 75, 75]);
    }

    #[test]
    fn yearly_sub_recurs_every_year() {
        let item = sub(90000, Cadence::Yearly, dt!(2024-Feb-21), None);
        // anniversary fires again in 2025 while the item is active
        assert_eq!(
            item.cash_months(mk!(2024-Jan), mk!(2025-Dec)),
            vec![mk!(2024-Feb), mk!(2025-Feb)]
        );
        // started before the window: normalized in all 12 months
        let mrr = compute_series([&item], Mode::Normalized, &year_2025());
        assert_eq!(amounts(&mrr), vec![75; 12]);
    }

    #[test]
    fn one_time_payment() {
        let item = once(45000, dt!(2025-Mar-03));
        let months = year_2025();
        let cash = compute_series([&item], Mode::Cash, &months);
        assert_eq!(amounts(&cash), vec![0, 0, 450, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // one-time payments never enter the recurring base
        let mrr = compute_series([&item], Mode::Normalized, &months);
        assert_eq!(amounts(&mrr), vec![0; 12]);
        assert_eq!(item.cash_months(mk!(2025-Apr), mk!(2025-Dec)), vec![]);
    }

    #[test]
    fn variable_income() {
        let item = var(&[(mk!(2025-Jan), 12050), (mk!(2025-Feb), 9800)]);
        let months = year_2025();
        let cash = compute_series([&item], Mode::Cash, &months);
        assert_eq!(amounts(&cash), vec![121, 98, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mrr = compute_series([&item], Mode::Normalized, &months);
        assert_eq!(amounts(&mrr), vec![0; 12]);
        // absence of a key means inactive, not zero
        assert!(!item.is_active(mk!(2025-Mar)));
        assert!(item.is_active(mk!(2025-Feb)));
    }

    #[test]
    fn cancellation_cutoff() {
        // ends mid-August: August still counts, September onwards does not
        let item = sub(8000, Cadence::Monthly, dt!(2025-Jan-01), Some(dt!(2025-Aug-15)));
        let months = year_2025();
        for mode in [Mode::Cash, Mode::Normalized] {
            let series = compute_series([&item], mode, &months);
            assert_eq!(amounts(&series), vec![80, 80, 80, 80, 80, 80, 80, 80, 0, 0, 0, 0]);
        }
        assert!(item.is_active(mk!(2025-Aug)));
        assert!(!item.is_active(mk!(2025-Sep)));
    }

    #[test]
    fn end_before_start_is_harmless() {
        // malformed on purpose: the engine must yield zero active months,
        // not fail
        let item = sub(8000, Cadence::Monthly, dt!(2025-Jun-01), Some(dt!(2025-Mar-01)));
        let months = year_2025();
        assert_eq!(amounts(&compute_series([&item], Mode::Cash, &months)), vec![0; 12]);
        assert_eq!(item.cash_months(mk!(2025-Jan), mk!(2025-Dec)), vec![]);
    }

    #[test]
    fn totals_rounded_once() {
        // 100 / 12 = 8.33..: summing two items then rounding gives 17,
        // rounding each item first would give 16
        let a = sub(10000, Cadence::Yearly, dt!(2025-Jan-01), None);
        let b = sub(10000, Cadence::Yearly, dt!(2025-Jan-01), None);
        let mrr = compute_series([&a, &b], Mode::Normalized, &[mk!(2025-Jun)]);
        assert_eq!(amounts(&mrr), vec![17]);
    }

    #[test]
    fn mixed_snapshot_cash() {
        let items = vec![
            sub(1500, Cadence::Monthly, dt!(2025-Jan-10), None),
            once(45000, dt!(2025-Mar-03)),
            var(&[(mk!(2025-Mar), 10000)]),
        ];
        let cash = compute_series(&items, Mode::Cash, &year_2025());
        assert_eq!(amounts(&cash), vec![15, 15, 565, 15, 15, 15, 15, 15, 15, 15, 15, 15]);
    }

    #[test]
    fn degenerate_inputs() {
        let months = year_2025();
        // no items: all-zero totals, one per requested month
        let no_items: Vec<Item> = Vec::new();
        let empty = compute_series(&no_items, Mode::Cash, &months);
        assert_eq!(empty.len(), 12);
        assert!(empty.iter().all(|&(_, a)| a == 0));
        // no months: empty output
        let item = sub(1500, Cadence::Monthly, dt!(2025-Jan-01), None);
        assert_eq!(compute_series([&item], Mode::Cash, &[]), vec![]);
    }

    #[test]
    fn series_is_deterministic() {
        let items = vec![
            sub(90000, Cadence::Yearly, dt!(2025-Feb-21), None),
            once(45000, dt!(2025-Mar-03)),
        ];
        let months = year_2025();
        let fst = compute_series(&items, Mode::Normalized, &months);
        let snd = compute_series(&items, Mode::Normalized, &months);
        assert_eq!(fst, snd);
    }

    #[test]
    fn output_follows_input_order() {
        let item = sub(1500, Cadence::Monthly, dt!(2025-Jan-01), None);
        let months = vec![mk!(2025-Dec), mk!(2025-Jan), mk!(2025-Jun)];
        let series = compute_series([&item], Mode::Cash, &months);
        assert_eq!(
            series.iter().map(|&(m, _)| m).collect::<Vec<_>>(),
            months
        );
    }

    #[test]
    fn mode_parse() {
        assert_eq!("cash".parse::<Mode>(), Ok(Mode::Cash));
        assert_eq!("mrr".parse::<Mode>(), Ok(Mode::Normalized));
        assert_eq!("normalized".parse::<Mode>(), Ok(Mode::Normalized));
        assert_eq!("accrual".parse::<Mode>(), Err(()));
    }
}
