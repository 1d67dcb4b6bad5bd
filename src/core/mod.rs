mod engine;
mod format;
mod types;

pub use engine::{
    calculate_scenario, current_year, depletion_year, income_preview, prepare_chart_data,
    update_financial_param,
};
pub use format::{format_currency, format_large_currency, format_rate};
pub use types::{
    ChartPoint, DEFAULT_PROJECTION_YEARS, FinancialParam, FinancialParams, IncomePreview,
    PREVIEW_YEAR_OFFSETS, SAFE_WITHDRAWAL_RATE_PERCENT, ScenarioRow,
};
