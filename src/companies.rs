//! Registry of tracked companies.
//!
//! The table is static: adding a company means adding a row here. Companies
//! without an SEC CIK (foreign filers that do not use EDGAR) are only
//! reachable through their investor-relations page.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Investment theme a company is tracked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AiApplications,
    AiSupplyChain,
}

impl Category {
    /// Stable identifier used in config, CLI flags and JSON output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AiApplications => "ai_applications",
            Self::AiSupplyChain => "ai_supply_chain",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ai_applications" => Ok(Self::AiApplications),
            "ai_supply_chain" => Ok(Self::AiSupplyChain),
            other => Err(format!(
                "unknown category '{other}' (expected ai_applications or ai_supply_chain)"
            )),
        }
    }
}

/// A tracked company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub name: &'static str,
    pub ticker: &'static str,
    pub category: Category,
    pub ir_url: &'static str,
    /// Zero-padded SEC Central Index Key.
    pub sec_cik: Option<&'static str>,
    pub description: &'static str,
}

const fn company(
    name: &'static str,
    ticker: &'static str,
    category: Category,
    ir_url: &'static str,
    sec_cik: Option<&'static str>,
    description: &'static str,
) -> Company {
    Company {
        name,
        ticker,
        category,
        ir_url,
        sec_cik,
        description,
    }
}

use Category::{AiApplications, AiSupplyChain};

/// All tracked companies, AI applications first.
pub static TRACKED_COMPANIES: [Company; 24] = [
    company(
        "Microsoft",
        "MSFT",
        AiApplications,
        "https://www.microsoft.com/en-us/investor/earnings/",
        Some("0000789019"),
        "Azure cloud, Copilot and OpenAI partnership",
    ),
    company(
        "Alphabet",
        "GOOGL",
        AiApplications,
        "https://abc.xyz/investor/",
        Some("0001652044"),
        "Search, Google Cloud and Gemini models",
    ),
    company(
        "Amazon",
        "AMZN",
        AiApplications,
        "https://ir.aboutamazon.com/quarterly-results/",
        Some("0001018724"),
        "AWS cloud and custom AI silicon",
    ),
    company(
        "Meta",
        "META",
        AiApplications,
        "https://investor.fb.com/financials/",
        Some("0001326801"),
        "Social platforms, Llama models and AI advertising",
    ),
    company(
        "Salesforce",
        "CRM",
        AiApplications,
        "https://investor.salesforce.com/financials/",
        Some("0001108524"),
        "CRM software and Agentforce",
    ),
    company(
        "ServiceNow",
        "NOW",
        AiApplications,
        "https://investors.servicenow.com/financials/",
        Some("0001373715"),
        "Workflow automation platform",
    ),
    company(
        "Palantir",
        "PLTR",
        AiApplications,
        "https://investors.palantir.com/financials/",
        Some("0001321655"),
        "Data analytics and AIP platform",
    ),
    company(
        "Apple",
        "AAPL",
        AiApplications,
        "https://investor.apple.com/investor-relations/",
        Some("0000320193"),
        "Consumer devices and on-device AI",
    ),
    company(
        "AppLovin",
        "APP",
        AiApplications,
        "https://investors.applovin.com/financials/",
        Some("0001751008"),
        "AI-driven mobile advertising",
    ),
    company(
        "Adobe",
        "ADBE",
        AiApplications,
        "https://www.adobe.com/investor-relations/earnings.html",
        Some("0000796343"),
        "Creative software and Firefly generative models",
    ),
    company(
        "Nvidia",
        "NVDA",
        AiSupplyChain,
        "https://investor.nvidia.com/financial-info/",
        Some("0001045810"),
        "GPUs and data center accelerators",
    ),
    company(
        "AMD",
        "AMD",
        AiSupplyChain,
        "https://ir.amd.com/financial-information/",
        Some("0000002488"),
        "CPUs and Instinct accelerators",
    ),
    company(
        "Broadcom",
        "AVGO",
        AiSupplyChain,
        "https://investors.broadcom.com/financials/",
        Some("0001730168"),
        "Custom AI ASICs and networking",
    ),
    company(
        "TSMC",
        "TSM",
        AiSupplyChain,
        "https://investor.tsmc.com/english/quarterly-results",
        Some("0001046179"),
        "Leading-edge foundry",
    ),
    company(
        "SK Hynix",
        "SKH",
        AiSupplyChain,
        "https://www.skhynix.com/eng/ir/earnings.do",
        None,
        "High-bandwidth memory",
    ),
    company(
        "Micron",
        "MU",
        AiSupplyChain,
        "https://investors.micron.com/financials/",
        Some("0000723125"),
        "DRAM, HBM and NAND memory",
    ),
    company(
        "Samsung",
        "SSNLF",
        AiSupplyChain,
        "https://www.samsung.com/global/ir/reports-disclosures/financial-information/",
        None,
        "Memory and foundry",
    ),
    company(
        "Intel",
        "INTC",
        AiSupplyChain,
        "https://www.intc.com/financial-info/",
        Some("0000050863"),
        "CPUs, Gaudi accelerators and foundry",
    ),
    company(
        "Vertiv",
        "VRT",
        AiSupplyChain,
        "https://investors.vertiv.com/financials/",
        Some("0001674101"),
        "Data center power and cooling",
    ),
    company(
        "Eaton",
        "ETN",
        AiSupplyChain,
        "https://www.eaton.com/us/en-us/company/investors/financial-results.html",
        Some("0001551182"),
        "Electrical power management",
    ),
    company(
        "GE Vernova",
        "GEV",
        AiSupplyChain,
        "https://www.gevernova.com/investors/financial-information",
        Some("0001996810"),
        "Power generation and grid equipment",
    ),
    company(
        "Vistra",
        "VST",
        AiSupplyChain,
        "https://investors.vistracorp.com/financials/",
        Some("0001692819"),
        "Power generation for data centers",
    ),
    company(
        "ASML",
        "ASML",
        AiSupplyChain,
        "https://www.asml.com/en/investors/financial-results",
        Some("0000937966"),
        "EUV lithography systems",
    ),
    company(
        "Synopsys",
        "SNPS",
        AiSupplyChain,
        "https://investor.synopsys.com/financials/",
        Some("0000883241"),
        "Chip design software",
    ),
];

/// Looks up a company by ticker, ignoring case.
#[must_use]
pub fn company_by_ticker(ticker: &str) -> Option<&'static Company> {
    let ticker = ticker.trim();
    TRACKED_COMPANIES
        .iter()
        .find(|company| company.ticker.eq_ignore_ascii_case(ticker))
}

/// Companies tracked under `category`, in registry order.
pub fn companies_in(category: Category) -> impl Iterator<Item = &'static Company> {
    TRACKED_COMPANIES
        .iter()
        .filter(move |company| company.category == category)
}
