use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Withdrawal rate above which a year is flagged as unsustainable (the 4% rule).
pub const SAFE_WITHDRAWAL_RATE_PERCENT: f64 = 4.0;

/// Year offsets (0-based) shown in the income preview: years 1, 2, 5 and 10.
pub const PREVIEW_YEAR_OFFSETS: [u32; 4] = [0, 1, 4, 9];

pub const DEFAULT_PROJECTION_YEARS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialParams {
    pub inflation_rate_percent: f64,
    pub initial_balance: f64,
    pub desired_monthly_income: f64,
    pub social_security: f64,
    pub cola_adjustment: f64,
    pub investment_return: f64,
}

impl Default for FinancialParams {
    fn default() -> Self {
        Self {
            inflation_rate_percent: 2.4,
            initial_balance: 100_000.0,
            desired_monthly_income: 3_000.0,
            social_security: 3_627.0,
            cola_adjustment: 2.3,
            investment_return: 8.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FinancialParam {
    InflationRatePercent,
    InitialBalance,
    DesiredMonthlyIncome,
    SocialSecurity,
    ColaAdjustment,
    InvestmentReturn,
}

impl FinancialParam {
    pub const ALL: [FinancialParam; 6] = [
        FinancialParam::InflationRatePercent,
        FinancialParam::InitialBalance,
        FinancialParam::DesiredMonthlyIncome,
        FinancialParam::SocialSecurity,
        FinancialParam::ColaAdjustment,
        FinancialParam::InvestmentReturn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FinancialParam::InflationRatePercent => "inflationRatePercent",
            FinancialParam::InitialBalance => "initialBalance",
            FinancialParam::DesiredMonthlyIncome => "desiredMonthlyIncome",
            FinancialParam::SocialSecurity => "socialSecurity",
            FinancialParam::ColaAdjustment => "colaAdjustment",
            FinancialParam::InvestmentReturn => "investmentReturn",
        }
    }

    pub fn get(self, params: &FinancialParams) -> f64 {
        match self {
            FinancialParam::InflationRatePercent => params.inflation_rate_percent,
            FinancialParam::InitialBalance => params.initial_balance,
            FinancialParam::DesiredMonthlyIncome => params.desired_monthly_income,
            FinancialParam::SocialSecurity => params.social_security,
            FinancialParam::ColaAdjustment => params.cola_adjustment,
            FinancialParam::InvestmentReturn => params.investment_return,
        }
    }
}

impl FromStr for FinancialParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inflationRatePercent" | "inflation-rate-percent" | "inflation" => {
                Ok(FinancialParam::InflationRatePercent)
            }
            "initialBalance" | "initial-balance" => Ok(FinancialParam::InitialBalance),
            "desiredMonthlyIncome" | "desired-monthly-income" => {
                Ok(FinancialParam::DesiredMonthlyIncome)
            }
            "socialSecurity" | "social-security" => Ok(FinancialParam::SocialSecurity),
            "colaAdjustment" | "cola-adjustment" | "cola" => Ok(FinancialParam::ColaAdjustment),
            "investmentReturn" | "investment-return" => Ok(FinancialParam::InvestmentReturn),
            other => Err(format!("unknown financial parameter '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRow {
    pub year: i32,
    pub ss_monthly: f64,
    #[serde(rename = "requiredFrom401kMonthly")]
    pub required_from_401k_monthly: f64,
    pub total_monthly_income: f64,
    pub starting_balance: f64,
    pub yearly_return: f64,
    pub ending_balance: f64,
    pub withdrawal_rate: String,
}

impl ScenarioRow {
    /// Parsed withdrawal rate; `Infinity`/`NaN` renderings parse to their f64 values.
    pub fn withdrawal_rate_value(&self) -> f64 {
        match self.withdrawal_rate.as_str() {
            "Infinity" => f64::INFINITY,
            "-Infinity" => f64::NEG_INFINITY,
            other => other.parse().unwrap_or(f64::NAN),
        }
    }

    pub fn exceeds_safe_withdrawal_rate(&self) -> bool {
        self.withdrawal_rate_value() > SAFE_WITHDRAWAL_RATE_PERCENT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub year: i32,
    #[serde(rename = "Balance")]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IncomePreview {
    Funded {
        #[serde(rename = "yearNumber")]
        year_number: u32,
        row: ScenarioRow,
    },
    Depleted {
        #[serde(rename = "yearNumber")]
        year_number: u32,
        year: i32,
    },
}

impl IncomePreview {
    /// 1-based year number as shown to the user.
    pub fn year_number(&self) -> u32 {
        match self {
            IncomePreview::Funded { year_number, .. } | IncomePreview::Depleted { year_number, .. } => {
                *year_number
            }
        }
    }
}
