use super::artifact::{strip_transformer_prefix, ChurnClassifier};
use super::encoder::EncodedRow;
use super::record::CANONICAL_FIELDS;

/// Returned whenever the artifact offers nothing to rank by.
pub const DEFAULT_ATTRIBUTION: [&str; 3] = ["tenure", "Contract", "OnlineSecurity"];

const TOP_N: usize = 3;

/// Approximates the top input fields behind a model prediction from `|weight × value|`,
/// summed per canonical field so one-hot groups compete as a whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplainabilityRanker;

impl ExplainabilityRanker {
    pub fn rank(&self, classifier: &dyn ChurnClassifier, row: &EncodedRow) -> Vec<String> {
        rank_groups(classifier, row).unwrap_or_else(default_attribution)
    }
}

pub(crate) fn default_attribution() -> Vec<String> {
    DEFAULT_ATTRIBUTION.iter().map(|name| name.to_string()).collect()
}

fn rank_groups(classifier: &dyn ChurnClassifier, row: &EncodedRow) -> Option<Vec<String>> {
    let weights = classifier.attribution()?.weights();
    let input = classifier.prepare(row).ok()?;
    let names = classifier.input_columns().unwrap_or(row.columns());
    if weights.len() != input.len() || names.len() != input.len() {
        return None;
    }

    // insertion order doubles as the tie-break
    let mut groups: Vec<(&str, f64)> = Vec::new();
    for ((name, weight), value) in names.iter().zip(weights).zip(&input) {
        let contribution = (weight * value).abs();
        if !contribution.is_finite() {
            return None;
        }
        let group = canonical_group(name);
        match groups.iter_mut().find(|(existing, _)| *existing == group) {
            Some(entry) => entry.1 += contribution,
            None => groups.push((group, contribution)),
        }
    }

    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some(
        groups
            .into_iter()
            .take(TOP_N)
            .map(|(group, _)| group.to_string())
            .collect(),
    )
}

/// Maps an encoded column back to the canonical field it came from:
/// `cat__InternetService_Fiber optic` → `InternetService`. Unknown columns are their own group.
fn canonical_group(column: &str) -> &str {
    let column = strip_transformer_prefix(column);
    CANONICAL_FIELDS
        .iter()
        .copied()
        .filter(|field| {
            column == *field
                || column
                    .strip_prefix(field)
                    .is_some_and(|rest| rest.starts_with('_'))
        })
        .max_by_key(|field| field.len())
        .unwrap_or(column)
}
