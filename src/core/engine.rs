use chrono::Datelike;

use super::format::format_rate;
use super::types::{
    ChartPoint, FinancialParam, FinancialParams, IncomePreview, PREVIEW_YEAR_OFFSETS, ScenarioRow,
};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Carried between projection years. Never shared with the caller.
#[derive(Debug, Clone, Copy)]
struct ProjectionState {
    monthly_ss: f64,
    desired_monthly: f64,
    balance: f64,
    /// Offset of the year whose tentative end balance went negative.
    depleted_at: Option<u32>,
}

impl ProjectionState {
    fn from_params(params: &FinancialParams) -> Self {
        Self {
            monthly_ss: params.social_security,
            desired_monthly: params.desired_monthly_income,
            balance: params.initial_balance,
            depleted_at: None,
        }
    }

    fn required_from_401k(&self) -> f64 {
        self.desired_monthly - self.monthly_ss
    }
}

fn growth_factor(rate_percent: f64) -> f64 {
    1.0 + rate_percent / 100.0
}

/// Calendar year at `offset`, pinned to `i32::MAX` rather than overflowing.
fn year_at(start_year: i32, offset: u32) -> i32 {
    start_year.saturating_add_unsigned(offset)
}

fn tentative_end_balance(row: &ScenarioRow) -> f64 {
    row.starting_balance + row.yearly_return - row.required_from_401k_monthly * MONTHS_PER_YEAR
}

/// Calendar year the projection starts in when the caller has no fixed one.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Projects the account year by year from `start_year` for `years` rows.
///
/// Never fails: degenerate inputs (zero or negative balances, negative rates)
/// flow through IEEE-754 arithmetic, so a zero starting balance yields an
/// `Infinity` withdrawal rate rather than an error.
///
/// Once a year's unclamped end balance goes negative the account is treated as
/// depleted: every later row carries zero balances and a `"0.00"` rate while
/// the Social Security benefit keeps compounding by COLA. The total income of
/// those rows reports only that benefit.
pub fn calculate_scenario(params: &FinancialParams, start_year: i32, years: u32) -> Vec<ScenarioRow> {
    let cola = growth_factor(params.cola_adjustment);
    let inflation = growth_factor(params.inflation_rate_percent);

    let (_, rows) = (0..years).fold(
        (
            ProjectionState::from_params(params),
            Vec::with_capacity(years as usize),
        ),
        |(state, mut rows), offset| {
            let year = year_at(start_year, offset);

            if let Some(depleted_at) = state.depleted_at {
                rows.push(depleted_row(year, state.monthly_ss, cola, offset - depleted_at));
                return (state, rows);
            }

            let required = state.required_from_401k();
            let yearly_from_401k = required * MONTHS_PER_YEAR;
            let yearly_return = state.balance * params.investment_return / 100.0;
            let year_end_balance = state.balance + yearly_return - yearly_from_401k;

            rows.push(ScenarioRow {
                year,
                ss_monthly: state.monthly_ss,
                required_from_401k_monthly: required,
                total_monthly_income: state.monthly_ss + required,
                starting_balance: state.balance,
                yearly_return,
                ending_balance: if year_end_balance > 0.0 {
                    year_end_balance
                } else {
                    0.0
                },
                withdrawal_rate: format_rate(yearly_from_401k / state.balance * 100.0),
            });

            let next = ProjectionState {
                monthly_ss: state.monthly_ss * cola,
                desired_monthly: state.desired_monthly * inflation,
                balance: year_end_balance,
                depleted_at: (year_end_balance < 0.0).then_some(offset),
            };
            (next, rows)
        },
    );

    rows
}

fn depleted_row(year: i32, monthly_ss: f64, cola: f64, years_since_depletion: u32) -> ScenarioRow {
    let ss_monthly = monthly_ss * cola.powi(years_since_depletion as i32);
    ScenarioRow {
        year,
        ss_monthly,
        required_from_401k_monthly: 0.0,
        total_monthly_income: ss_monthly,
        starting_balance: 0.0,
        yearly_return: 0.0,
        ending_balance: 0.0,
        withdrawal_rate: "0.00".to_string(),
    }
}

/// Re-indexes scenario rows into exactly `years` chart points, padding with a
/// zero balance past the end of `rows`. Years are derived from `start_year`,
/// not copied from the rows.
pub fn prepare_chart_data(rows: &[ScenarioRow], start_year: i32, years: u32) -> Vec<ChartPoint> {
    (0..years)
        .map(|offset| ChartPoint {
            year: year_at(start_year, offset),
            balance: rows
                .get(offset as usize)
                .map(|row| row.ending_balance)
                .unwrap_or(0.0),
        })
        .collect()
}

pub fn update_financial_param(
    params: &FinancialParams,
    param: FinancialParam,
    value: f64,
) -> FinancialParams {
    let mut updated = *params;
    match param {
        FinancialParam::InflationRatePercent => updated.inflation_rate_percent = value,
        FinancialParam::InitialBalance => updated.initial_balance = value,
        FinancialParam::DesiredMonthlyIncome => updated.desired_monthly_income = value,
        FinancialParam::SocialSecurity => updated.social_security = value,
        FinancialParam::ColaAdjustment => updated.cola_adjustment = value,
        FinancialParam::InvestmentReturn => updated.investment_return = value,
    }
    updated
}

/// Snapshot of years 1, 2, 5 and 10 for the income preview cards.
pub fn income_preview(rows: &[ScenarioRow], start_year: i32) -> Vec<IncomePreview> {
    PREVIEW_YEAR_OFFSETS
        .iter()
        .map(|&offset| match rows.get(offset as usize) {
            Some(row) => IncomePreview::Funded {
                year_number: offset + 1,
                row: row.clone(),
            },
            None => IncomePreview::Depleted {
                year_number: offset + 1,
                year: year_at(start_year, offset),
            },
        })
        .collect()
}

/// Year in which the account ran dry: the first row whose unclamped end
/// balance went negative. A year that lands exactly on zero is not depletion.
pub fn depletion_year(rows: &[ScenarioRow]) -> Option<i32> {
    rows.iter()
        .find(|row| tentative_end_balance(row) < 0.0)
        .map(|row| row.year)
}
