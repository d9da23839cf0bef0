//! Grammar and value checks applied before input reaches the engine

use num_traits::Signed;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CalcError, Result};
use crate::models::Equation;
use crate::registry::Registry;

/// Positive integer or positive fraction, no sign
const NUM: &str = r"[1-9][0-9]*(?:/[1-9][0-9]*)?";

/// Lowercase snake/kebab identifier, optionally numeric-prefixed
const VAR: &str = r"(?:[0-9]+[-_])*[a-z0-9/]+(?:[-_][a-z0-9/]+)*";

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^{VAR} : {NUM} {VAR} = {NUM} {VAR}(?: [+-] {NUM} {VAR})*$"
    ))
    .expect("assignment pattern is valid")
});

static CALCULATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^-?{NUM} {VAR}(?: [+-] {NUM} {VAR})*$"))
        .expect("calculation pattern is valid")
});

/// `station : n output = n input (+|- n input)*`
pub fn validate_syntax_assignment(assignment: &str) -> Result<()> {
    if ASSIGNMENT.is_match(assignment) {
        Ok(())
    } else {
        Err(CalcError::Syntax(assignment.to_string()))
    }
}

/// `[-]n name (+|- n name)*`
pub fn validate_syntax_calculation(equation: &str) -> Result<()> {
    if CALCULATION.is_match(equation) {
        Ok(())
    } else {
        Err(CalcError::Syntax(equation.to_string()))
    }
}

/// Every name must be known, and raw materials may only be subtracted.
///
/// All offending terms are collected before failing.
pub fn validate_value_calculation(registry: &Registry, equation: &Equation) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for resource in equation {
        let name = resource.name();

        if !registry.is_known(name) {
            errors.push(name.to_string());
        }

        // Producing a raw material is pointless.
        if registry.is_raw(name) && resource.amount().is_positive() {
            errors.push(resource.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CalcError::Value(errors.join(", ")))
    }
}
