//! Turns a normalized record into the numeric row a loaded artifact consumes.
//!
//! Two layouts exist. Legacy artifacts ship an explicit ordered feature-name list and get one
//! value per declared name. v2 artifacts declare no list and get the fixed one-hot row below.
//! Encoding never fails: a field that cannot be coerced contributes its zero default.

use super::record::FeatureRecord;

/// How a one-hot column derives its value from the record.
#[derive(Debug, Clone, Copy)]
enum ColumnRule {
    Numeric(&'static str),
    Equals {
        field: &'static str,
        value: &'static str,
    },
    Senior(SeniorFlag),
}

#[derive(Debug, Clone, Copy)]
enum SeniorFlag {
    Positive,
    Negative,
}

const fn eq(field: &'static str, value: &'static str) -> ColumnRule {
    ColumnRule::Equals { field, value }
}

const ONE_HOT_LAYOUT: [(&str, ColumnRule); 32] = [
    ("tenure", ColumnRule::Numeric("tenure")),
    ("MonthlyCharges", ColumnRule::Numeric("MonthlyCharges")),
    ("TotalCharges", ColumnRule::Numeric("TotalCharges")),
    ("gender_Male", eq("gender", "Male")),
    ("SeniorCitizen_1", ColumnRule::Senior(SeniorFlag::Positive)),
    ("SeniorCitizen_No", ColumnRule::Senior(SeniorFlag::Negative)),
    ("SeniorCitizen_Yes", ColumnRule::Senior(SeniorFlag::Positive)),
    ("Partner_Yes", eq("Partner", "Yes")),
    ("Dependents_Yes", eq("Dependents", "Yes")),
    ("PhoneService_Yes", eq("PhoneService", "Yes")),
    (
        "MultipleLines_No phone service",
        eq("MultipleLines", "No phone service"),
    ),
    ("MultipleLines_Yes", eq("MultipleLines", "Yes")),
    (
        "InternetService_Fiber optic",
        eq("InternetService", "Fiber optic"),
    ),
    ("InternetService_No", eq("InternetService", "No")),
    (
        "OnlineSecurity_No internet service",
        eq("OnlineSecurity", "No internet service"),
    ),
    ("OnlineSecurity_Yes", eq("OnlineSecurity", "Yes")),
    (
        "OnlineBackup_No internet service",
        eq("OnlineBackup", "No internet service"),
    ),
    ("OnlineBackup_Yes", eq("OnlineBackup", "Yes")),
    (
        "DeviceProtection_No internet service",
        eq("DeviceProtection", "No internet service"),
    ),
    ("DeviceProtection_Yes", eq("DeviceProtection", "Yes")),
    (
        "TechSupport_No internet service",
        eq("TechSupport", "No internet service"),
    ),
    ("TechSupport_Yes", eq("TechSupport", "Yes")),
    (
        "StreamingTV_No internet service",
        eq("StreamingTV", "No internet service"),
    ),
    ("StreamingTV_Yes", eq("StreamingTV", "Yes")),
    (
        "StreamingMovies_No internet service",
        eq("StreamingMovies", "No internet service"),
    ),
    ("StreamingMovies_Yes", eq("StreamingMovies", "Yes")),
    ("Contract_One year", eq("Contract", "One year")),
    ("Contract_Two year", eq("Contract", "Two year")),
    ("PaperlessBilling_Yes", eq("PaperlessBilling", "Yes")),
    (
        "PaymentMethod_Credit card (automatic)",
        eq("PaymentMethod", "Credit card (automatic)"),
    ),
    (
        "PaymentMethod_Electronic check",
        eq("PaymentMethod", "Electronic check"),
    ),
    ("PaymentMethod_Mailed check", eq("PaymentMethod", "Mailed check")),
];

pub const ONE_HOT_WIDTH: usize = ONE_HOT_LAYOUT.len();

/// A single encoded row with its column names, ready to hand to a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl EncodedRow {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|index| self.values[index])
    }
}

/// Encoding strategy, fixed when the artifact is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorEncoder {
    /// Legacy artifacts: one value per declared feature name, in declared order.
    Ordered { feature_names: Vec<String> },
    /// v2 artifacts: the fixed 32-column one-hot row.
    OneHot,
}

impl VectorEncoder {
    /// `None` selects the one-hot convention.
    pub fn for_feature_names(feature_names: Option<Vec<String>>) -> Self {
        match feature_names {
            Some(feature_names) => Self::Ordered { feature_names },
            None => Self::OneHot,
        }
    }

    pub fn encode(&self, record: &FeatureRecord) -> EncodedRow {
        match self {
            Self::Ordered { feature_names } => EncodedRow {
                columns: feature_names.clone(),
                values: feature_names
                    .iter()
                    .map(|name| record.number(name))
                    .collect(),
            },
            Self::OneHot => encode_one_hot(record),
        }
    }
}

fn encode_one_hot(record: &FeatureRecord) -> EncodedRow {
    let senior = record.get("SeniorCitizen").flag_token();
    let senior_positive = matches!(senior.as_ref(), "1" | "yes");
    let senior_negative = matches!(senior.as_ref(), "0" | "no");

    let mut columns = Vec::with_capacity(ONE_HOT_WIDTH);
    let mut values = Vec::with_capacity(ONE_HOT_WIDTH);
    for (name, rule) in ONE_HOT_LAYOUT.iter() {
        let value = match rule {
            ColumnRule::Numeric(field) => record.number(field),
            ColumnRule::Equals { field, value } => indicator(record.category(field) == *value),
            ColumnRule::Senior(SeniorFlag::Positive) => indicator(senior_positive),
            ColumnRule::Senior(SeniorFlag::Negative) => indicator(senior_negative),
        };
        columns.push((*name).to_string());
        values.push(value);
    }

    EncodedRow { columns, values }
}

fn indicator(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}
