//! Data models for recipe resources and linear equations over them

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};

use crate::error::{CalcError, Result};
use crate::validator;

/// Exact amount of a resource. Only rounded at evaluate or display time.
pub type Amount = BigRational;

pub fn amount(value: i64) -> Amount {
    Amount::from_integer(BigInt::from(value))
}

/// Parse `7`, `-7` or `1/100` into an exact amount
pub fn parse_amount(token: &str) -> Result<Amount> {
    let syntax = || CalcError::Syntax(token.to_string());

    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let (numer, denom) = match digits.split_once('/') {
        Some((n, d)) => (n, Some(d)),
        None => (digits, None),
    };

    let integer = |part: &str| -> Result<BigInt> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(syntax());
        }
        BigInt::from_str(part).map_err(|_| syntax())
    };

    let numer = integer(numer)?;
    let denom = match denom {
        Some(d) => integer(d)?,
        None => BigInt::from(1),
    };
    if denom.is_zero() {
        return Err(syntax());
    }

    let value = Amount::new(numer, denom);
    Ok(if negative { -value } else { value })
}

/// An (amount, name) pair. Immutable: transforms build new values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    amount: Amount,
    name: String,
}

impl Resource {
    pub fn new(amount: Amount, name: impl Into<String>) -> Self {
        Self {
            amount,
            name: name.into(),
        }
    }

    pub fn whole(amount: i64, name: impl Into<String>) -> Self {
        Self::new(self::amount(amount), name)
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_amount(&self, amount: Amount) -> Self {
        Self::new(amount, self.name.clone())
    }

    /// Amount truncated toward zero, used for display only
    pub fn display_amount(&self) -> BigInt {
        self.amount.trunc().to_integer()
    }

    pub fn format_resource(&self, margin: usize) -> String {
        format!("{:>margin$} {}", self.display_amount(), self.name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.name)
    }
}

impl Resource {
    /// `amount name` with any amount literal `parse_amount` accepts
    pub(crate) fn parse_lenient(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(amount), Some(name), None) if is_name(name) => {
                Ok(Resource::new(parse_amount(amount)?, name))
            }
            _ => Err(CalcError::Syntax(s.to_string())),
        }
    }
}

impl FromStr for Resource {
    type Err = CalcError;

    /// A single query term: `[-]n name`
    fn from_str(s: &str) -> Result<Self> {
        validator::validate_syntax_calculation(s)?;
        Resource::parse_lenient(s)
    }
}

fn is_name(token: &str) -> bool {
    !matches!(token, "+" | "-" | "=" | ":")
}

/// An ordered list of resources read as a linear combination.
///
/// Order is only meaningful for display. Every transform returns a new
/// equation, the receiver is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equation {
    resources: Vec<Resource>,
}

impl Equation {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Value equality, not just a name match
    pub fn contains(&self, resource: &Resource) -> bool {
        self.resources.contains(resource)
    }

    pub fn chain(&self, other: &Equation) -> Equation {
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn without(&self, resource: &Resource) -> Equation {
        self.iter().filter(|r| *r != resource).cloned().collect()
    }

    /// Scale every amount exactly, no rounding
    pub fn multiply(&self, factor: &Amount) -> Equation {
        self.iter()
            .map(|r| r.with_amount(r.amount() * factor))
            .collect()
    }

    /// Sum same-named terms and round each sum up to a whole unit.
    ///
    /// Names keep the position of their first occurrence.
    pub fn evaluate(&self) -> Equation {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut sums: Vec<(&str, Amount)> = Vec::new();

        for resource in &self.resources {
            match index.get(resource.name()) {
                Some(&i) => sums[i].1 += resource.amount(),
                None => {
                    index.insert(resource.name(), sums.len());
                    sums.push((resource.name(), resource.amount().clone()));
                }
            }
        }

        sums.into_iter()
            .map(|(name, sum)| Resource::new(sum.ceil(), name))
            .collect()
    }

    /// Amount descending, then name ascending
    pub fn sort_resources(&self) -> Equation {
        let mut resources = self.resources.clone();
        resources.sort_by(|a, b| {
            b.amount()
                .cmp(a.amount())
                .then_with(|| a.name().cmp(b.name()))
        });
        Equation::new(resources)
    }

    /// Sorted lines with amounts right-aligned to a common width
    pub fn format_resources(&self) -> Vec<String> {
        let Some(margin) = self
            .iter()
            .map(|r| r.display_amount().to_string().len())
            .max()
        else {
            return Vec::new();
        };

        self.sort_resources()
            .iter()
            .map(|r| r.format_resource(margin))
            .collect()
    }

    /// Drop or clamp non-positive terms.
    ///
    /// With `clamp_negative` every negative amount is first rewritten to
    /// zero. A term is then kept when `keep_non_positive` is set or its
    /// amount is strictly positive.
    pub fn filter(&self, keep_non_positive: bool, clamp_negative: bool) -> Equation {
        self.iter()
            .map(|r| {
                if clamp_negative && r.amount().is_negative() {
                    r.with_amount(Amount::zero())
                } else {
                    r.clone()
                }
            })
            .filter(|r| keep_non_positive || r.amount().is_positive())
            .collect()
    }

    /// Evaluated amount of `name`, zero when absent
    pub fn quantity(&self, name: &str) -> Amount {
        self.evaluate()
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.amount().clone())
            .unwrap_or_else(Amount::zero)
    }
}

impl FromIterator<Resource> for Equation {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Equation::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Equation {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

impl From<Resource> for Equation {
    fn from(resource: Resource) -> Self {
        Equation::new(vec![resource])
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.resources.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for resource in iter {
            let op = if resource.amount().is_negative() { "-" } else { "+" };
            write!(f, " {op} {} {}", resource.amount().abs(), resource.name())?;
        }
        Ok(())
    }
}

impl FromStr for Equation {
    type Err = CalcError;

    /// Query grammar: `[-]n name ((+|-) n name)*` with positive amounts and
    /// lowercase names
    fn from_str(s: &str) -> Result<Self> {
        validator::validate_syntax_calculation(s)?;
        Equation::parse_lenient(s)
    }
}

impl Equation {
    /// Internal text form, as written by `Display`: `a x (+|-) b y ...`
    /// where amounts may be zero or carry their own sign and names are not
    /// checked beyond being a single token.
    pub(crate) fn parse_lenient(s: &str) -> Result<Self> {
        let syntax = || CalcError::Syntax(s.to_string());
        let parts: Vec<&str> = s.split_whitespace().collect();

        if parts.len() < 2 || (parts.len() - 2) % 3 != 0 {
            return Err(syntax());
        }

        let mut resources = Vec::with_capacity(1 + (parts.len() - 2) / 3);
        if !is_name(parts[1]) {
            return Err(syntax());
        }
        resources.push(Resource::new(parse_amount(parts[0])?, parts[1]));

        for term in parts[2..].chunks(3) {
            let amount = parse_amount(term[1])?;
            if !is_name(term[2]) {
                return Err(syntax());
            }
            let amount = match term[0] {
                "+" => amount,
                "-" => -amount,
                _ => return Err(syntax()),
            };
            resources.push(Resource::new(amount, term[2]));
        }

        Ok(Equation::new(resources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(s: &str) -> Equation {
        Equation::parse_lenient(s).unwrap()
    }

    fn frac(n: i64, d: i64) -> Amount {
        Amount::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn resource_roundtrips_through_text() {
        for text in ["1 anvil_bench", "10 iron_ingot", "-1 anvil_bench", "1/10 wood"] {
            let resource: Resource = text.parse().unwrap();
            assert_eq!(text, resource.to_string());
        }
        assert!("1 anvil bench".parse::<Resource>().is_err());
        assert!("anvil_bench".parse::<Resource>().is_err());
        assert!("0 anvil_bench".parse::<Resource>().is_err());
        assert!("1 Anvil_Bench".parse::<Resource>().is_err());
        assert_eq!(
            Resource::whole(0, "anvil_bench"),
            Resource::parse_lenient("0 anvil_bench").unwrap()
        );
    }

    #[test]
    fn resource_equality_is_structural() {
        let r = Resource::whole(2, "biofuel_extractor");
        assert_eq!(r, "2 biofuel_extractor".parse().unwrap());
        assert_ne!(r, Resource::whole(2, "biofuel_generator"));
        assert_ne!(r, Resource::whole(4, "biofuel_extractor"));
    }

    #[test]
    fn parse_amount_rejects_zero_denominator() {
        assert!(parse_amount("1/0").is_err());
        assert!(parse_amount("x").is_err());
        assert!(parse_amount("").is_err());
        assert_eq!(frac(1, 100), parse_amount("1/100").unwrap());
        assert_eq!(frac(-3, 2), parse_amount("-3/2").unwrap());
    }

    #[test]
    fn equation_parse_and_display() {
        let cases = [
            ("12 fiber", "12 fiber"),
            ("12 fiber + 18 stick", "12 fiber + 18 stick"),
            ("-12 fiber", "-12 fiber"),
            ("-12 fiber - 18 stick", "-12 fiber - 18 stick"),
            ("-12 fiber - -18 stick", "-12 fiber + 18 stick"),
        ];
        for (input, expected) in cases {
            let parsed = eq(input);
            assert_eq!(expected, parsed.to_string());
            assert_eq!(parsed, eq(&parsed.to_string()));
        }
    }

    #[test]
    fn equation_parse_rejects_malformed_text() {
        for bad in [
            "",
            "12",
            "12 fiber +",
            "12 fiber + 18",
            "12 fiber * 18 stick",
            "+ 12 fiber",
            "12 fiber 18 stick",
        ] {
            let err = bad.parse::<Equation>().unwrap_err();
            assert!(err.is_syntax(), "{bad:?} gave {err}");
            assert!(Equation::parse_lenient(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn equation_parse_enforces_query_grammar() {
        for bad in [
            "1 Wood! + 0 STONE",
            "1 a - -3 b",
            "0 wood",
            "1 wood + 0 stone",
            "1 x.y",
            "1/0 wood",
            "1 wood  + 2 stone",
        ] {
            let err = bad.parse::<Equation>().unwrap_err();
            assert_eq!(format!("SyntaxError: {bad}"), err.to_string());
        }

        assert_eq!(
            "-1 anvil_bench + 1/2 rope - 3 kit-item",
            eq("-1 anvil_bench + 1/2 rope - 3 kit-item").to_string()
        );
        assert_eq!(
            eq("-1 anvil_bench + 1/2 rope - 3 kit-item"),
            "-1 anvil_bench + 1/2 rope - 3 kit-item".parse().unwrap()
        );
    }

    #[test]
    fn lenient_form_reads_display_output() {
        let e = eq("1 wood - -3 stone + 0 fiber");
        assert_eq!("1 wood + 3 stone + 0 fiber", e.to_string());
        assert!(e.to_string().parse::<Equation>().is_err());
        assert_eq!(e, Equation::parse_lenient(&e.to_string()).unwrap());
    }

    #[test]
    fn equation_equality_is_ordered() {
        let e = eq("2 fiber + 4 fiber + 2 wood + 2 wood");
        assert_eq!(e, eq("2 fiber + 4 fiber + 2 wood + 2 wood"));
        assert_ne!(e, eq("2 fiber + 4 fiber + 4 wood + 0 wood"));
        assert_ne!(e, eq("2 fiber + 4 fiber + 2 wood"));
        assert_ne!(e, eq("2 wood + 2 wood + 4 fiber + 2 fiber"));
    }

    #[test]
    fn evaluate_groups_and_rounds_up() {
        let cases = [
            ("124/5 wood + 160 stone + 0/24 leather", "25 wood + 160 stone + 0 leather"),
            ("1/3 wood + 0 stone + 1/3 wood", "1 wood + 0 stone"),
            (
                "10 gold_ore + 30 copper_ore + 10 wood + 10 oxite + 20 sulfur + 16 wood",
                "10 gold_ore + 30 copper_ore + 26 wood + 10 oxite + 20 sulfur",
            ),
            ("1 wood - 2 wood - 2 stone - 3/2 sulfur", "-1 wood - 2 stone - 1 sulfur"),
        ];
        for (input, expected) in cases {
            assert_eq!(expected, eq(input).evaluate().to_string());
        }
    }

    #[test]
    fn multiply_is_exact() {
        let e = eq("12 fiber + 18 stick").multiply(&frac(1, 10));
        assert_eq!("6/5 fiber + 9/5 stick", e.to_string());
        assert_eq!(eq("12 fiber + 18 stick"), e.multiply(&amount(10)));
    }

    #[test]
    fn sort_by_amount_then_name() {
        let e1 = eq("10 gold_ore + 30 copper_ore + 26 wood + 10 oxite + 26 sulfur");
        let e2 = "30 copper_ore + 26 sulfur + 26 wood + 10 gold_ore + 10 oxite";
        assert_eq!(e2, e1.sort_resources().to_string());
        assert_eq!(e2, eq(e2).sort_resources().to_string());
    }

    #[test]
    fn format_right_aligns_amounts() {
        let e = eq("10 copper_ingot + 2 iron_ingot + 100 gold_ore + 10 aluminium_ingot");
        assert_eq!(
            vec![
                "100 gold_ore",
                " 10 aluminium_ingot",
                " 10 copper_ingot",
                "  2 iron_ingot",
            ],
            e.format_resources()
        );
        assert!(Equation::default().format_resources().is_empty());
    }

    #[test]
    fn format_truncates_fractions() {
        let e = eq("3/2 wood + 19/2 stone");
        assert_eq!(vec!["9 stone", "1 wood"], e.format_resources());
    }

    #[test]
    fn filter_four_quadrants() {
        let e = eq("-1 stone + 1 wood - 12 wood");
        assert_eq!(eq("1 wood"), e.filter(false, false));
        assert_eq!(e, e.filter(true, false));
        assert_eq!(eq("0 stone + 1 wood + 0 wood"), e.filter(true, true));
        assert_eq!(eq("1 wood"), e.filter(false, true));
    }

    #[test]
    fn quantity_sums_terms() {
        let e = eq("1 fabricator + 2 wood - 1 fabricator");
        assert_eq!(amount(0), e.quantity("fabricator"));
        assert_eq!(amount(2), e.quantity("wood"));
        assert_eq!(amount(0), e.quantity("stone"));
    }

    #[test]
    fn without_removes_equal_values_only() {
        let e = eq("1 wood + 2 wood + 1 wood");
        assert_eq!(eq("2 wood"), e.without(&Resource::whole(1, "wood")));
    }
}
