//! Filing targets and the locators that turn them into document URLs.
//!
//! # Architecture
//!
//! - [`Quarter`] / [`FilingTarget`] - what to download
//! - [`enumerate_targets`] - expands companies x years x quarters
//! - [`FilingLocator`] - async trait implemented by each URL source
//! - [`EdgarLocator`] - SEC EDGAR submissions index (primary source)
//! - [`IrPageLocator`] - company investor-relations page scrape (fallback)

mod edgar;
mod error;
mod ir_page;
mod locator;

pub use edgar::{EdgarLocator, FilingRef, RecentFilings, archive_url, select_filing};
pub use error::LocateError;
pub use ir_page::{IrPageLocator, find_filing_link};
pub use locator::{FilingLocator, Located, default_locators, locate_first};

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::companies::Company;

/// Reporting period of a filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
    /// Full fiscal year (annual report).
    Fy,
}

/// Every quarter, in calendar order with the annual report last.
pub const ALL_QUARTERS: [Quarter; 5] = [
    Quarter::Q1,
    Quarter::Q2,
    Quarter::Q3,
    Quarter::Q4,
    Quarter::Fy,
];

impl Quarter {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Fy => "FY",
        }
    }

    /// SEC form filed for this period.
    #[must_use]
    pub fn form_type(self) -> &'static str {
        match self {
            Self::Fy => "10-K",
            _ => "10-Q",
        }
    }

    /// Calendar months in which the report for this period is usually filed.
    ///
    /// Empty for [`Quarter::Fy`]: annual reports are matched on year alone.
    #[must_use]
    pub fn filing_months(self) -> &'static [u32] {
        match self {
            Self::Q1 => &[4, 5],
            Self::Q2 => &[7, 8],
            Self::Q3 => &[10, 11],
            Self::Q4 => &[1, 2, 3],
            Self::Fy => &[],
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quarter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Self::Q1),
            "Q2" => Ok(Self::Q2),
            "Q3" => Ok(Self::Q3),
            "Q4" => Ok(Self::Q4),
            "FY" => Ok(Self::Fy),
            other => Err(format!("invalid quarter '{other}' (expected Q1-Q4 or FY)")),
        }
    }
}

impl Serialize for Quarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One filing to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingTarget {
    pub company: &'static Company,
    pub year: i32,
    pub quarter: Quarter,
}

impl FilingTarget {
    #[must_use]
    pub fn new(company: &'static Company, year: i32, quarter: Quarter) -> Self {
        Self {
            company,
            year,
            quarter,
        }
    }

    /// Output file name without extension: `{year}_{quarter}_{ticker}`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.year, self.quarter, self.company.ticker)
    }
}

impl fmt::Display for FilingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.company.ticker, self.year, self.quarter)
    }
}

/// Expands companies x years x quarters into targets.
///
/// Order is company, then year, then quarter, each in the order given.
/// Repeated years or quarters are ignored after their first occurrence.
#[must_use]
pub fn enumerate_targets(
    companies: &[&'static Company],
    years: &[i32],
    quarters: &[Quarter],
) -> Vec<FilingTarget> {
    let years = dedup_in_order(years);
    let quarters = dedup_in_order(quarters);

    let mut targets = Vec::with_capacity(companies.len() * years.len() * quarters.len());
    for &company in companies {
        for &year in &years {
            for &quarter in &quarters {
                targets.push(FilingTarget::new(company, year, quarter));
            }
        }
    }
    targets
}

fn dedup_in_order<T: Copy + PartialEq>(values: &[T]) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    for &value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
