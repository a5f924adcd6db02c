use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;

/// The canonical Telco-style schema, in the order clients send it.
pub const CANONICAL_FIELDS: [&str; 19] = [
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "tenure",
    "PhoneService",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
    "OnlineBackup",
    "DeviceProtection",
    "TechSupport",
    "StreamingTV",
    "StreamingMovies",
    "Contract",
    "PaperlessBilling",
    "PaymentMethod",
    "MonthlyCharges",
    "TotalCharges",
];

const TOTAL_CHARGES: &str = "TotalCharges";

/// A loosely typed input value. Coercion into the shape a consumer needs is total:
/// failures resolve to that consumer's default instead of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Absent,
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
}

static ABSENT: FeatureValue = FeatureValue::Absent;

impl FeatureValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FeatureValue::Null,
            Value::Bool(flag) => FeatureValue::Integer(i64::from(*flag)),
            Value::Number(number) => match number.as_i64() {
                Some(int) => FeatureValue::Integer(int),
                None => number
                    .as_f64()
                    .map(FeatureValue::Float)
                    .unwrap_or(FeatureValue::Null),
            },
            Value::String(text) => FeatureValue::Text(text.clone()),
            Value::Array(_) | Value::Object(_) => FeatureValue::Null,
        }
    }

    /// Numeric view, `None` when the value cannot be read as a finite number.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            FeatureValue::Integer(int) => *int as f64,
            FeatureValue::Float(float) => *float,
            FeatureValue::Text(text) => text.trim().parse::<f64>().ok()?,
            FeatureValue::Absent | FeatureValue::Null => return None,
        };
        number.is_finite().then_some(number)
    }

    pub fn number_or_zero(&self) -> f64 {
        self.as_f64().unwrap_or(0.0)
    }

    /// Categorical view. Only strings carry a category; everything else is the empty
    /// string, which matches no known value.
    pub fn category(&self) -> &str {
        match self {
            FeatureValue::Text(text) => text.as_str(),
            _ => "",
        }
    }

    /// Lower-cased token used for yes/no/0/1 style flags.
    pub fn flag_token(&self) -> Cow<'_, str> {
        match self {
            FeatureValue::Integer(int) => Cow::Owned(int.to_string()),
            FeatureValue::Float(float) if float.is_finite() && float.fract() == 0.0 => {
                Cow::Owned(format!("{}", *float as i64))
            }
            FeatureValue::Text(text) => Cow::Owned(text.trim().to_ascii_lowercase()),
            _ => Cow::Borrowed(""),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FeatureValue::Absent | FeatureValue::Null => true,
            FeatureValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

/// One customer record as received, keyed by field name. Unknown keys are kept so that
/// legacy artifacts declaring extra feature names can still look them up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRecord {
    /// Builds a normalized record from a request body, flat or wrapped in `"features"`.
    /// Anything that is not a JSON object yields a record holding only defaults.
    pub fn from_payload(payload: &Value) -> Self {
        let fields = match payload.get("features") {
            Some(Value::Object(inner)) if !inner.is_empty() => Some(inner),
            _ => payload.as_object(),
        };

        let values = fields
            .map(|map| {
                map.iter()
                    .map(|(key, value)| (key.clone(), FeatureValue::from_json(value)))
                    .collect()
            })
            .unwrap_or_default();

        Self { values }.normalized()
    }

    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, FeatureValue)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
        .normalized()
    }

    /// Blank `TotalCharges` (new customers have no billing history) becomes `0.0`.
    /// Every other field passes through untouched.
    fn normalized(mut self) -> Self {
        let blank = self.get(TOTAL_CHARGES).is_blank();
        if blank {
            self.values
                .insert(TOTAL_CHARGES.to_string(), FeatureValue::Float(0.0));
        }
        self
    }

    pub fn get(&self, name: &str) -> &FeatureValue {
        self.values.get(name).unwrap_or(&ABSENT)
    }

    pub fn number(&self, name: &str) -> f64 {
        self.get(name).number_or_zero()
    }

    pub fn category(&self, name: &str) -> &str {
        self.get(name).category()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
