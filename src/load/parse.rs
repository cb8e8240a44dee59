//! Convert the contents of a ledger file into businesses and their
//! revenue items
//!
//! The grammar guarantees the overall shape; this module performs the
//! checks the grammar cannot express (month names, impossible dates,
//! cadence keywords, duplicate months) and records located diagnostics
//! for everything it rejects.

#![allow(clippy::upper_case_acronyms)]

use pest::Parser;
use pest_derive::*;

/// Wrapper around Pest's `Pair`
type Pair<'i> = pest::iterators::Pair<'i, Rule>;
/// Wrapper around Pest's `Pairs`
type Pairs<'i> = pest::iterators::Pairs<'i, Rule>;

use std::collections::BTreeMap;

use crate::load::error;
use crate::util::{
    date::{Date, Month, MonthKey},
    item::{Amount, Billing, Business, Cadence, Item},
};

/// Pest-generated parser
#[derive(Parser)]
#[grammar = "load/takings.pest"]
pub struct TakingsParser;

// extract contents of wrapper rule
macro_rules! subrule {
    ( $node:expr ) => {{
        let mut items = $node.into_inner().into_iter();
        let fst = items.next().unwrap_or_else(|| panic!("No subrule"));
        if items.next().is_some() {
            panic!("Several subrules");
        }
        fst
    }};
}

// get first and rest of inner
macro_rules! decapitate {
    ( $node:expr ) => {{
        let mut items = $node.into_inner().into_iter();
        let fst = items.next().unwrap_or_else(|| panic!("No head"));
        (fst, items)
    }};
}

// pair to usize contents
macro_rules! parse_usize {
    ( $node:expr ) => {
        $node.as_str().parse::<usize>().unwrap()
    };
}

// pair to amount contents
macro_rules! parse_amount {
    ( $node:expr ) => {
        // safe to .unwrap() because the grammar validated it already
        Amount(($node.as_str().parse::<f64>().unwrap() * 100.0).round() as isize)
    };
}

/// Get the businesses declared in file `path`
///
/// The return value may be non-empty even if some errors (including fatal
/// ones) occured: it contains all businesses and items that parsed
/// correctly.
///
/// Caller should determine the success of this function not through its
/// return value but by querying `errs` (e.g. by checking `errs.is_fatal()`)
pub fn extract<'i>(path: &'i str, errs: &mut error::Record, contents: &'i str) -> Vec<Business> {
    match TakingsParser::parse(Rule::program, contents) {
        Ok(contents) => validate(path, errs, contents),
        Err(e) => {
            errs.make("Parsing failure").from(e.with_path(path));
            Vec::new()
        }
    }
}

/// Check all business blocks
///
/// Item-level failures are recorded and skip only the offending item, so
/// one bad line does not take the whole ledger down with it.
pub fn validate<'i>(path: &'i str, errs: &mut error::Record, pairs: Pairs<'i>) -> Vec<Business> {
    let mut businesses: Vec<Business> = Vec::new();
    for pair in pairs {
        match pair.as_rule() {
            Rule::business => {
                let loc = (path, pair.as_span().clone());
                let business = validate_business(path, errs, pair);
                if businesses.iter().any(|b| b.name == business.name) {
                    errs.make("Duplicate business")
                        .nonfatal()
                        .span(&loc, format!("'{}' is declared twice", business.name))
                        .hint("rename one of the blocks or merge their items");
                }
                businesses.push(business);
            }
            Rule::EOI => break,
            _ => unreachable!(),
        }
    }
    businesses
}

fn validate_business<'i>(path: &'i str, errs: &mut error::Record, pair: Pair<'i>) -> Business {
    let (head, body) = decapitate!(pair);
    assert_eq!(head.as_rule(), Rule::name);
    let name = read_name(head);
    let mut items: Vec<Item> = Vec::new();
    'body: for pair in body {
        let loc = (path, pair.as_span().clone());
        let item = match pair.as_rule() {
            Rule::recurring => validate_recurring(path, errs, pair),
            Rule::one_time => validate_one_time(path, errs, pair),
            Rule::variable => validate_variable(path, errs, pair),
            _ => unreachable!(),
        };
        let item = match item {
            Some(item) => item,
            None => continue 'body,
        };
        if items.iter().any(|i| i.name == item.name) {
            errs.make("Duplicate item")
                .nonfatal()
                .span(&loc, format!("'{}' is declared twice in '{}'", item.name, name))
                .text("Both declarations will be counted")
                .hint("rename one of them if they are distinct revenue sources");
        }
        items.push(item);
    }
    Business { name, items }
}

/// Check a `sub` line
///
/// The grammar fixes the field order, so all that can go wrong is the
/// cadence keyword, the dates themselves, and an end before the start
fn validate_recurring<'i>(path: &'i str, errs: &mut error::Record, pair: Pair<'i>) -> Option<Item> {
    let loc = (path, pair.as_span().clone());
    let mut inner = pair.into_inner().into_iter();
    let name = read_name(inner.next().unwrap());
    let price = parse_amount!(inner.next().unwrap());
    let cadence = validate_cadence(path, errs, inner.next().unwrap())?;
    let from = validate_date(path, errs, inner.next().unwrap())?;
    let until = match inner.next() {
        Some(date) => Some(validate_date(path, errs, date)?),
        None => None,
    };
    if let Some(until) = until {
        if until < from {
            // tolerated: the item simply has no active month
            errs.make("Subscription ends before it starts")
                .nonfatal()
                .span(&loc, format!("in item '{}'", name))
                .text(format!("'until {}' predates 'from {}'", until, from))
                .hint("this item will never contribute revenue");
        }
    }
    Some(Item {
        name,
        billing: Billing::Recurring { price, cadence, from, until },
    })
}

/// Check a `once` line
fn validate_one_time<'i>(path: &'i str, errs: &mut error::Record, pair: Pair<'i>) -> Option<Item> {
    let mut inner = pair.into_inner().into_iter();
    let name = read_name(inner.next().unwrap());
    let price = parse_amount!(inner.next().unwrap());
    let on = validate_date(path, errs, inner.next().unwrap())?;
    Some(Item {
        name,
        billing: Billing::OneTime { price, on },
    })
}

/// Check a `var` block
///
/// Each month may carry at most one amount, duplicates are ambiguous and
/// therefore fatal
fn validate_variable<'i>(path: &'i str, errs: &mut error::Record, pair: Pair<'i>) -> Option<Item> {
    let loc = (path, pair.as_span().clone());
    let mut inner = pair.into_inner().into_iter();
    let name = read_name(inner.next().unwrap());
    let mut amounts = BTreeMap::new();
    for cell in inner {
        assert_eq!(cell.as_rule(), Rule::var_cell);
        let cell_loc = (path, cell.as_span().clone());
        let mut cell = cell.into_inner().into_iter();
        let month = validate_month_key(path, errs, cell.next().unwrap())?;
        let amount = parse_amount!(cell.next().unwrap());
        if amounts.insert(month, amount).is_some() {
            errs.make("Duplicate month")
                .span(&cell_loc, format!("{} already has an amount", month))
                .text("Each month may carry at most one amount")
                .hint("merge the two amounts into a single cell");
            return None;
        }
    }
    if amounts.is_empty() {
        errs.make("Variable item has no amounts")
            .nonfatal()
            .span(&loc, format!("in item '{}'", name))
            .hint("add 'YYYY-Mmm: XXX.XX' cells or remove the item");
    }
    Some(Item {
        name,
        billing: Billing::Variable { amounts },
    })
}

/// Parse a billing cadence keyword
///
/// This is the only place an unrecognized billing configuration can reach:
/// past this check the item kinds are fixed by construction
fn validate_cadence(path: &str, errs: &mut error::Record, pair: Pair) -> Option<Cadence> {
    let loc = (path, pair.as_span().clone());
    match pair.as_str().parse::<Cadence>() {
        Ok(cadence) => Some(cadence),
        Err(()) => {
            errs.make("Invalid cadence")
                .span(&loc, "provided here")
                .text(format!("'{}' is not a valid billing cadence", pair.as_str()))
                .hint("use one of monthly, yearly");
            None
        }
    }
}

/// Parse a `YYYY-Mmm-DD` date
///
/// The grammar only guarantees the shape: the month name and the
/// day-in-month combination both still need checking
fn validate_date(path: &str, errs: &mut error::Record, pair: Pair) -> Option<Date> {
    assert_eq!(pair.as_rule(), Rule::full_date);
    let mut inner = pair.into_inner().into_iter();
    let year = parse_usize!(inner.next().unwrap());
    let month = validate_month_name(path, errs, inner.next().unwrap())?;
    let day_pair = inner.next().unwrap();
    let loc = (path, day_pair.as_span().clone());
    let day = parse_usize!(day_pair);
    match Date::from(year, month, day) {
        Ok(date) => Some(date),
        Err(e) => {
            errs.make("Invalid date")
                .span(&loc, "provided here")
                .text(format!("{}", e))
                .hint("choose a date that exists")
                .hint(e.fix_hint());
            None
        }
    }
}

/// Parse a `YYYY-Mmm` month key
fn validate_month_key(path: &str, errs: &mut error::Record, pair: Pair) -> Option<MonthKey> {
    assert_eq!(pair.as_rule(), Rule::month_key);
    let mut inner = pair.into_inner().into_iter();
    let year = parse_usize!(inner.next().unwrap());
    let month = validate_month_name(path, errs, inner.next().unwrap())?;
    Some(MonthKey::new(year as u16, month))
}

fn validate_month_name(path: &str, errs: &mut error::Record, pair: Pair) -> Option<Month> {
    let loc = (path, pair.as_span().clone());
    match pair.as_str().parse::<Month>() {
        Ok(month) => Some(month),
        Err(()) => {
            errs.make("Invalid month")
                .span(&loc, "provided here")
                .hint("Months are 'Jan', 'Feb', ..., 'Dec'");
            None
        }
    }
}

/// Strip the quotes off a `name` node
///
/// Grammar ensures this cannot fail
fn read_name(pair: Pair) -> String {
    assert_eq!(pair.as_rule(), Rule::name);
    subrule!(pair).as_str().to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::util::date::Month::*;

    fn parsed(contents: &str) -> Vec<Business> {
        let mut errs = error::Record::new();
        let businesses = extract("test.tks", &mut errs, contents);
        assert!(!errs.is_fatal(), "unexpected errors:\n{}", errs);
        businesses
    }

    fn rejected(contents: &str) {
        let mut errs = error::Record::new();
        extract("test.tks", &mut errs, contents);
        assert!(errs.is_fatal(), "expected a fatal error");
    }

    macro_rules! dt {
        ( $y:tt - $m:tt - $d:tt ) => {
            Date::from($y, $m, $d).unwrap()
        }
    }

    #[test]
    fn full_ledger() {
        let businesses = parsed(r#"
// sample ledger
business "Acme Web" {
    sub "Pro plan"   15.00 monthly from 2025-Jan-10;
    sub "Site care" 900.00 yearly  from 2025-Feb-21 until 2026-Feb-20;
    once "Logo design" 450.00 on 2025-Mar-03;
    var "Ad revenue" {
        2025-Jan: 120.50,
        2025-Feb:  98.00,
    };
}
"#);
        assert_eq!(businesses.len(), 1);
        let acme = &businesses[0];
        assert_eq!(acme.name, "Acme Web");
        assert_eq!(acme.items.len(), 4);
        match &acme.items[0].billing {
            Billing::Recurring { price, cadence, from, until } => {
                assert_eq!(*price, Amount(1500));
                assert_eq!(*cadence, Cadence::Monthly);
                assert_eq!(*from, dt!(2025-Jan-10));
                assert_eq!(*until, None);
            }
            other => panic!("expected a subscription, got {:?}", other),
        }
        match &acme.items[1].billing {
            Billing::Recurring { price, cadence, until, .. } => {
                assert_eq!(*price, Amount(90000));
                assert_eq!(*cadence, Cadence::Yearly);
                assert_eq!(*until, Some(dt!(2026-Feb-20)));
            }
            other => panic!("expected a subscription, got {:?}", other),
        }
        match &acme.items[2].billing {
            Billing::OneTime { price, on } => {
                assert_eq!(*price, Amount(45000));
                assert_eq!(*on, dt!(2025-Mar-03));
            }
            other => panic!("expected a one-time payment, got {:?}", other),
        }
        match &acme.items[3].billing {
            Billing::Variable { amounts } => {
                assert_eq!(amounts.len(), 2);
                assert_eq!(amounts[&MonthKey::new(2025, Jan)], Amount(12050));
                assert_eq!(amounts[&MonthKey::new(2025, Feb)], Amount(9800));
            }
            other => panic!("expected a variable item, got {:?}", other),
        }
    }

    #[test]
    fn several_businesses() {
        let businesses = parsed(r#"
business "One" { once "Kickoff" 100.00 on 2025-Jan-01; }
business "Two" { }
"#);
        assert_eq!(businesses.len(), 2);
        assert_eq!(businesses[1].name, "Two");
        assert!(businesses[1].items.is_empty());
    }

    #[test]
    fn empty_ledger() {
        assert!(parsed("").is_empty());
        assert!(parsed("// nothing but a comment\n").is_empty());
    }

    #[test]
    fn invalid_cadence_is_fatal() {
        rejected(r#"business "B" { sub "S" 15.00 weekly from 2025-Jan-10; }"#);
    }

    #[test]
    fn invalid_date_is_fatal() {
        rejected(r#"business "B" { once "P" 15.00 on 2025-Feb-30; }"#);
        rejected(r#"business "B" { once "P" 15.00 on 2025-Foo-10; }"#);
    }

    #[test]
    fn duplicate_var_month_is_fatal() {
        rejected(r#"
business "B" {
    var "V" {
        2025-Jan: 10.00,
        2025-Jan: 20.00,
    };
}
"#);
    }

    #[test]
    fn until_before_from_is_tolerated() {
        let mut errs = error::Record::new();
        let businesses = extract(
            "test.tks",
            &mut errs,
            r#"business "B" { sub "S" 15.00 monthly from 2025-Jun-01 until 2025-Mar-01; }"#,
        );
        // warned about, but kept: the engine yields zero active months
        assert!(!errs.is_fatal());
        assert_eq!(errs.count_warnings(), 1);
        assert_eq!(businesses[0].items.len(), 1);
    }

    #[test]
    fn bad_item_does_not_discard_good_ones() {
        let mut errs = error::Record::new();
        let businesses = extract(
            "test.tks",
            &mut errs,
            r#"
business "B" {
    sub "Good" 15.00 monthly from 2025-Jan-10;
    sub "Bad" 15.00 weekly from 2025-Jan-10;
}
"#,
        );
        assert!(errs.is_fatal());
        assert_eq!(businesses[0].items.len(), 1);
        assert_eq!(businesses[0].items[0].name, "Good");
    }
}
