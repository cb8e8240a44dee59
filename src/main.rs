mod cli;
mod load;
mod util;

use chrono::Datelike;
use clap::{App, Arg};

use cli::{plot::Plotter, table::Table};
use util::{
    date::{Month, MonthKey},
    item::Business,
    series::{compute_series, Mode},
};

fn main() {
    let matches = App::new("takings")
        .version("0.2.0")
        .about("Revenue-tracking dashboard over a plain-text ledger")
        .arg(Arg::with_name("FILE").help("Ledger file to load").index(1))
        .arg(
            Arg::with_name("mode")
                .long("mode")
                .short("m")
                .takes_value(true)
                .possible_values(&["cash", "mrr"])
                .default_value("cash")
                .help("Accounting mode: cash received or MRR-normalized"),
        )
        .arg(
            Arg::with_name("from")
                .long("from")
                .takes_value(true)
                .value_name("YYYY-MM")
                .help("First month of the window, defaults to January of the current year"),
        )
        .arg(
            Arg::with_name("to")
                .long("to")
                .takes_value(true)
                .value_name("YYYY-MM")
                .help("Last month of the window, defaults to December of the current year"),
        )
        .arg(
            Arg::with_name("business")
                .long("business")
                .short("b")
                .takes_value(true)
                .help("Restrict the dashboard to one business"),
        )
        .arg(
            Arg::with_name("plot")
                .long("plot")
                .takes_value(true)
                .value_name("SVG")
                .help("Also render the aggregate series as an SVG bar chart"),
        )
        .get_matches();

    let filename = matches.value_of("FILE").unwrap_or("takings.tks");
    let mode = matches
        .value_of("mode")
        .and_then(|m| m.parse::<Mode>().ok())
        .unwrap_or(Mode::Cash);
    // window defaults to the current local calendar year
    let year = chrono::Local::now().year() as u16;
    let from = month_arg(&matches, "from", MonthKey::new(year, Month::Jan));
    let to = month_arg(&matches, "to", MonthKey::new(year, Month::Dec));

    let mut errs = load::error::Record::new();
    let businesses = load::read_businesses(filename, &mut errs);
    print!("{}", errs);
    let businesses = match businesses {
        Some(businesses) => businesses,
        None => std::process::exit(1),
    };
    let businesses: Vec<Business> = match matches.value_of("business") {
        None => businesses,
        Some(name) => {
            let filtered = businesses
                .into_iter()
                .filter(|b| b.name == name)
                .collect::<Vec<_>>();
            if filtered.is_empty() {
                eprintln!("No business named '{}' in {}", name, filename);
                std::process::exit(1);
            }
            filtered
        }
    };

    let months = from.range_to(to).collect::<Vec<_>>();
    if months.is_empty() {
        eprintln!("Empty window: --from {} is after --to {}", from, to);
        std::process::exit(2);
    }

    let columns = businesses
        .iter()
        .map(|b| (b.name.clone(), compute_series(&b.items, mode, &months)))
        .collect::<Vec<_>>();
    let total = compute_series(businesses.iter().flat_map(|b| &b.items), mode, &months);

    println!(
        "{}",
        Table::from(&months, &columns, &total).with_title(format!("{} revenue by month", mode))
    );
    let window_total: i64 = total.iter().map(|&(_, amount)| amount).sum();
    if let Some(&(month, amount)) = total.last() {
        println!("Window total: {}    Latest ({}): {}", window_total, month, amount);
    }

    if let Some(file) = matches.value_of("plot") {
        match Plotter::from(&total).render_bar_chart(file) {
            Ok(()) => println!("Plot written to {}", file),
            Err(e) => eprintln!("Could not write plot to {}: {}", file, e),
        }
    }
}

/// A `--from`/`--to` argument, accepting `2025-01` as well as `2025-Jan`
fn month_arg(matches: &clap::ArgMatches, name: &str, default: MonthKey) -> MonthKey {
    match matches.value_of(name) {
        None => default,
        Some(s) => match s.parse::<MonthKey>() {
            Ok(month) => month,
            Err(()) => {
                eprintln!("Invalid --{} '{}': expected YYYY-MM", name, s);
                std::process::exit(2);
            }
        },
    }
}
