//! Definition of businesses and their billable items
//!
//! An `Item` is one revenue source. Its billing kind is a tagged union so
//! that each kind only carries the fields that are meaningful for it: a
//! recurring subscription has a cadence and an optional end date, a one-time
//! payment has nothing but its price, a variable source is entirely
//! described by its per-month amounts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::util::date::{Date, MonthKey};

/// An amount of money, in integer cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(pub isize);

impl Amount {
    /// Value in whole currency units, for display-side rounding
    pub fn units(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn nonzero(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// How often a recurring item bills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Monthly,
    Yearly,
}

impl FromStr for Cadence {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "monthly" => Ok(Cadence::Monthly),
            "yearly" => Ok(Cadence::Yearly),
            _ => Err(()),
        }
    }
}

/// The billing kind of an item, with its kind-specific fields
#[derive(Debug, Clone)]
pub enum Billing {
    /// Bills `price` once per cadence period. `from` is the first active
    /// date and the anniversary anchor for yearly billing; the month
    /// containing `until` is the last active one
    Recurring {
        price: Amount,
        cadence: Cadence,
        from: Date,
        until: Option<Date>,
    },
    /// Bills `price` exactly once, on `on`
    OneTime { price: Amount, on: Date },
    /// Month-by-month amounts; a month absent from the map is inactive,
    /// not zero
    Variable { amounts: BTreeMap<MonthKey, Amount> },
}

/// One revenue source of a business
#[derive(Debug, Clone)]
pub struct Item {
    pub name: String,
    pub billing: Billing,
}

/// A named group of items, as declared in the ledger
#[derive(Debug, Clone)]
pub struct Business {
    pub name: String,
    pub items: Vec<Item>,
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! amt {
        ( $cents:expr => $fmt:expr ) => {
            assert_eq!(format!("{}", Amount($cents)), $fmt);
        }
    }

    #[test]
    fn amount_fmt() {
        amt!(0 => "0.00");
        amt!(5 => "0.05");
        amt!(50 => "0.50");
        amt!(1500 => "15.00");
        amt!(90000 => "900.00");
        amt!(12345 => "123.45");
        amt!(-12345 => "-123.45");
        amt!(-5 => "-0.05");
    }

    #[test]
    fn amount_units() {
        assert_eq!(Amount(1500).units(), 15.0);
        assert_eq!(Amount(12050).units(), 120.5);
        assert_eq!(Amount(0).units(), 0.0);
    }

    #[test]
    fn cadence_parse() {
        assert_eq!("monthly".parse::<Cadence>(), Ok(Cadence::Monthly));
        assert_eq!("yearly".parse::<Cadence>(), Ok(Cadence::Yearly));
        assert_eq!("weekly".parse::<Cadence>(), Err(()));
        assert_eq!("Monthly".parse::<Cadence>(), Err(()));
    }
}
