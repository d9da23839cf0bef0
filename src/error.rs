//! Error types shared by the recipe engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalcError>;

#[derive(Debug, Error)]
pub enum CalcError {
    /// Malformed recipe line or query, carries the offending text verbatim
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Semantically invalid input, carries every offending term comma-joined
    #[error("ValueError: {0}")]
    Value(String),

    #[error("Equation was empty.")]
    EmptyEquation,

    #[error("Multiple stations: {}", .0.join(", "))]
    MultipleStations(Vec<String>),

    #[error("no recipe option {index} for {name} ({count} available)")]
    InvalidChoice {
        name: String,
        index: usize,
        count: usize,
    },

    /// The user asked to leave while a recipe choice was pending
    #[error("query cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),
}

impl CalcError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, CalcError::Syntax(_))
    }

    /// Errors the caller should answer with did-you-mean suggestions
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            CalcError::Value(_) | CalcError::EmptyEquation | CalcError::MultipleStations(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_prefix() {
        let err = CalcError::Syntax("1 rope +".to_string());
        assert_eq!("SyntaxError: 1 rope +", err.to_string());
        assert!(err.is_syntax());

        let err = CalcError::Value("100 stone, anvl".to_string());
        assert_eq!("ValueError: 100 stone, anvl", err.to_string());
        assert!(err.is_value());
    }

    #[test]
    fn multiple_stations_lists_all() {
        let err = CalcError::MultipleStations(vec![
            "fabricator".to_string(),
            "total_resources".to_string(),
        ]);
        assert_eq!(
            "Multiple stations: fabricator, total_resources",
            err.to_string()
        );
    }
}
