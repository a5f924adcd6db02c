use super::record::FeatureRecord;
use super::{logistic, PredictionResult};

const INTERCEPT: f64 = -1.0;
const TENURE_WEIGHT: f64 = -0.03;
const MONTHLY_WEIGHT: f64 = -0.01;
const TOTAL_WEIGHT: f64 = -0.005;
const SENIOR_BONUS: f64 = 0.1;
const MONTH_TO_MONTH_BONUS: f64 = 0.15;
const TWO_YEAR_BONUS: f64 = -0.05;
const NO_SECURITY_BONUS: f64 = 0.08;

/// Additive terms of the closed-form score for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicTerms {
    pub tenure: f64,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub senior: f64,
    pub contract: f64,
    pub online_security: f64,
}

impl HeuristicTerms {
    pub fn from_record(record: &FeatureRecord) -> Self {
        let senior = if record.get("SeniorCitizen").as_f64() == Some(1.0) {
            SENIOR_BONUS
        } else {
            0.0
        };
        let contract = match record.category("Contract") {
            "Month-to-month" => MONTH_TO_MONTH_BONUS,
            "Two year" => TWO_YEAR_BONUS,
            _ => 0.0,
        };
        let online_security = if record.category("OnlineSecurity") == "No" {
            NO_SECURITY_BONUS
        } else {
            0.0
        };

        Self {
            tenure: TENURE_WEIGHT * record.number("tenure"),
            monthly_charges: MONTHLY_WEIGHT * record.number("MonthlyCharges"),
            total_charges: TOTAL_WEIGHT * record.number("TotalCharges"),
            senior,
            contract,
            online_security,
        }
    }

    pub fn z(&self) -> f64 {
        INTERCEPT
            + self.tenure
            + self.monthly_charges
            + self.total_charges
            + self.senior
            + self.contract
            + self.online_security
    }

    /// `tenure`, `Contract` and `OnlineSecurity` ranked by absolute term, listed order on ties.
    pub fn ranked_features(&self) -> Vec<String> {
        let mut ranked = [
            ("tenure", self.tenure.abs()),
            ("Contract", self.contract.abs()),
            ("OnlineSecurity", self.online_security.abs()),
        ];
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.iter().map(|(name, _)| (*name).to_string()).collect()
    }
}

/// Deterministic logistic scorer used whenever no trained artifact is usable.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn score(&self, record: &FeatureRecord) -> PredictionResult {
        let terms = HeuristicTerms::from_record(record);
        PredictionResult::new(logistic(terms.z()), terms.ranked_features())
    }
}
