use crate::{BridgeError, ErrorCode, ErrorContext};

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        BridgeError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::new(ErrorCode::InvalidConfig, err.to_string())
    }
}

impl BridgeError {
    /// Unknown table, with the registered names as context and a
    /// "Did you mean" hint when one of them is close enough.
    pub fn table_not_found(table: &str, available: Vec<String>) -> Self {
        let hint = find_closest_match(table, &available);
        let mut error = BridgeError::new(
            ErrorCode::TableNotFound,
            format!("table not found: {}", table),
        )
        .with_context(ErrorContext::TableNotFound {
            table: table.to_string(),
            available_tables: available,
        });

        if let Some(closest) = hint {
            error = error.with_hint(format!("Did you mean '{}'?", closest));
        }
        error
    }
}

// Levenshtein-based suggestion
fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
