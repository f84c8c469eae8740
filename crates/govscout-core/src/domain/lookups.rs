use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recipient summary from USAspending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientProfile {
    pub uei: Option<String>,
    pub name: Option<String>,
    pub duns: Option<String>,
    pub recipient_id: Option<String>,
    pub total_transaction_amount: Option<f64>,
    pub total_transactions: Option<u64>,
    pub state: Option<String>,
    pub business_types: Vec<String>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearBudget {
    pub fiscal_year: i32,
    pub agency_budgetary_resources: Option<f64>,
    pub agency_total_obligated: Option<f64>,
    pub total_budgetary_resources: Option<f64>,
}

/// Budgetary resources by fiscal year for one toptier agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyBudget {
    pub toptier_code: String,
    pub fiscal_years: Vec<FiscalYearBudget>,
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToptierAgency {
    pub agency_id: Option<i64>,
    pub toptier_code: Option<String>,
    pub abbreviation: Option<String>,
    pub name: String,
    pub budget_authority_amount: Option<f64>,
    pub obligated_amount: Option<f64>,
}
