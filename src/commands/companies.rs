//! `companies` command: list the tracked-company registry.

use std::fmt::Write as _;

use anyhow::Result;
use finsight_core::companies::{Company, TRACKED_COMPANIES, companies_in};

use crate::cli::CompaniesArgs;

pub fn run_companies_command(args: &CompaniesArgs) -> Result<()> {
    let companies: Vec<&Company> = match args.category {
        Some(category) => companies_in(category).collect(),
        None => TRACKED_COMPANIES.iter().collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&companies)?);
    } else {
        print!("{}", render_table(&companies));
    }
    Ok(())
}

fn render_table(companies: &[&Company]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<7} {:<16} {:<11} NAME", "TICKER", "CATEGORY", "CIK");
    for company in companies {
        let _ = writeln!(
            out,
            "{:<7} {:<16} {:<11} {}",
            company.ticker,
            company.category.as_str(),
            company.sec_cik.unwrap_or("-"),
            company.name
        );
    }
    out
}
