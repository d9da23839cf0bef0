//! Recipe registry: every known name is raw, resolved or pending

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{CalcError, Result};
use crate::models::{Equation, Resource, amount};
use crate::validator;

/// A single recipe, normalised to produce exactly one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub station: String,
    pub ingredients: Equation,
    /// The assignment line the recipe was read from
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Referenced as an ingredient but never defined
    Raw,
    Resolved(Recipe),
    /// Two or more competing definitions awaiting a choice
    Pending(Vec<String>),
}

/// One station, output and ingredient list parsed out of an assignment line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub station: String,
    pub output: Resource,
    pub ingredients: Equation,
}

impl Assignment {
    pub fn parse(line: &str) -> Result<Self> {
        validator::validate_syntax_assignment(line)?;

        let syntax = || CalcError::Syntax(line.to_string());
        let (station, tail) = line.split_once(" : ").ok_or_else(syntax)?;
        let (left, right) = tail.split_once(" = ").ok_or_else(syntax)?;

        Ok(Self {
            station: station.to_string(),
            output: Resource::parse_lenient(left)?,
            ingredients: Equation::parse_lenient(right)?,
        })
    }

    /// Ingredients for one unit of the output
    pub fn per_unit(&self) -> Equation {
        let divisor = amount(1) / self.output.amount();
        self.ingredients.multiply(&divisor)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
    station_aliases: BTreeMap<String, String>,
    errors: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Station row names that refer to an item under a different name
    pub fn with_station_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.station_aliases = aliases;
        self
    }

    /// Register one `station : n output = ingredients` line.
    ///
    /// The first definition of a name resolves it. A second definition
    /// demotes it to pending with both lines kept in order, and any later
    /// definition is appended to the pending list.
    pub fn assign(&mut self, line: &str) -> Result<()> {
        let assignment = Assignment::parse(line)?;
        let ingredients = assignment.per_unit();
        let name = assignment.output.name().to_string();

        let entry = self.entries.entry(name.clone()).or_insert(Entry::Raw);
        match entry {
            Entry::Resolved(first) => {
                debug!(name = %name, "duplicate recipe, awaiting a choice");
                let lines = vec![std::mem::take(&mut first.line), line.to_string()];
                *entry = Entry::Pending(lines);
            }
            Entry::Pending(lines) => lines.push(line.to_string()),
            Entry::Raw => {
                *entry = Entry::Resolved(Recipe {
                    station: assignment.station,
                    ingredients: ingredients.clone(),
                    line: line.to_string(),
                });
            }
        }

        for resource in &ingredients {
            self.entries
                .entry(resource.name().to_string())
                .or_insert(Entry::Raw);
        }

        Ok(())
    }

    /// Settle a pending name on one of its options
    pub fn choose(&mut self, name: &str, index: usize) -> Result<()> {
        let line = match self.entries.get(name) {
            Some(Entry::Pending(lines)) => {
                lines
                    .get(index)
                    .cloned()
                    .ok_or_else(|| CalcError::InvalidChoice {
                        name: name.to_string(),
                        index,
                        count: lines.len(),
                    })?
            }
            _ => return Err(CalcError::Value(name.to_string())),
        };

        info!(name, choice = %line, "recipe chosen");
        self.entries.remove(name);
        self.assign(&line)
    }

    pub(crate) fn record_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Malformed rows skipped while loading
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        match self.entries.get(name) {
            Some(Entry::Resolved(recipe)) => Some(recipe),
            _ => None,
        }
    }

    /// Recipe line a resolved entry was read from
    pub fn raw_line(&self, name: &str) -> Option<&str> {
        self.recipe(name).map(|r| r.line.as_str())
    }

    pub fn ingredients(&self, name: &str) -> Option<&Equation> {
        self.recipe(name).map(|r| &r.ingredients)
    }

    pub fn station(&self, name: &str) -> Option<&str> {
        self.recipe(name).map(|r| r.station.as_str())
    }

    pub fn options(&self, name: &str) -> Option<&[String]> {
        match self.entries.get(name) {
            Some(Entry::Pending(lines)) => Some(lines),
            _ => None,
        }
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Entry::Resolved(_)))
    }

    pub fn is_pending(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Entry::Pending(_)))
    }

    pub fn is_raw(&self, name: &str) -> bool {
        matches!(self.entries.get(name), Some(Entry::Raw))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Item name a station row stands for
    pub fn station_alias<'a>(&'a self, station: &'a str) -> &'a str {
        self.station_aliases
            .get(station)
            .map(String::as_str)
            .unwrap_or(station)
    }

    /// Item a station stands for: the station itself when it has recipes
    /// of its own, its alias otherwise
    pub fn workstation<'a>(&'a self, station: &'a str) -> &'a str {
        if self.is_resolved(station) || self.is_pending(station) {
            station
        } else {
            self.station_alias(station)
        }
    }

    pub fn resolved_names(&self) -> impl Iterator<Item = &str> {
        self.names_where(|e| matches!(e, Entry::Resolved(_)))
    }

    pub fn pending_names(&self) -> impl Iterator<Item = &str> {
        self.names_where(|e| matches!(e, Entry::Pending(_)))
    }

    pub fn raw_names(&self) -> impl Iterator<Item = &str> {
        self.names_where(|e| matches!(e, Entry::Raw))
    }

    fn names_where(&self, pred: fn(&Entry) -> bool) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |(_, entry)| pred(entry))
            .map(|(name, _)| name.as_str())
    }

    /// Resolved names, then pending names, then raw names
    pub fn keywords(&self) -> Vec<&str> {
        self.resolved_names()
            .chain(self.pending_names())
            .chain(self.raw_names())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(lines: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for line in lines {
            registry.assign(line).unwrap();
        }
        registry
    }

    #[test]
    fn keywords_cover_every_name_once() {
        assert!(Registry::new().keywords().is_empty());

        let registry = registry(&[
            "character : 1 wood_spear = 12 fiber + 18 stick",
            "character : 10 stick = 1 wood",
        ]);

        assert_eq!(vec!["stick", "wood_spear", "fiber", "wood"], registry.keywords());
    }

    #[test]
    fn assignment_is_stored_per_unit() {
        let registry = registry(&[
            "character : 1 wood_spear = 12 fiber + 18 stick",
            "character : 10 stick = 1 wood",
            "machining_bench : 1 steel_screw = 1/100 steel_ingot",
        ]);

        let text = |name| registry.ingredients(name).unwrap().to_string();
        assert_eq!("12 fiber + 18 stick", text("wood_spear"));
        assert_eq!("1/10 wood", text("stick"));
        assert_eq!("1/100 steel_ingot", text("steel_screw"));
        assert_eq!(Some("machining_bench"), registry.station("steel_screw"));
        assert_eq!(
            Some("character : 10 stick = 1 wood"),
            registry.raw_line("stick")
        );
    }

    #[test]
    fn duplicate_recipes_become_pending() {
        let mut registry = registry(&["crafting_bench : 1 rope = 12 fiber"]);
        assert!(registry.is_resolved("rope"));

        registry.assign("crafting_bench : 1 rope = 12 fiber").unwrap();
        assert!(registry.is_pending("rope"));
        assert_eq!(None, registry.recipe("rope"));
        assert_eq!(None, registry.station("rope"));
        assert_eq!(2, registry.options("rope").unwrap().len());

        registry.assign("character : 1 rope = 5 leather").unwrap();
        assert_eq!(
            [
                "crafting_bench : 1 rope = 12 fiber",
                "crafting_bench : 1 rope = 12 fiber",
                "character : 1 rope = 5 leather",
            ],
            registry.options("rope").unwrap()
        );
    }

    #[test]
    fn raw_name_graduates_when_defined() {
        let mut registry = registry(&["crafting_bench : 1 rope = 12 fiber"]);
        assert!(registry.is_raw("fiber"));

        registry.assign("character : 1 fiber = 1 grass").unwrap();
        assert!(registry.is_resolved("fiber"));
        assert!(!registry.is_raw("fiber"));
        assert!(registry.is_raw("grass"));
    }

    #[test]
    fn ingredient_does_not_demote_resolved_name() {
        let registry = registry(&[
            "character : 10 stick = 1 wood",
            "character : 1 wood_spear = 12 fiber + 18 stick",
        ]);
        assert!(registry.is_resolved("stick"));
    }

    #[test]
    fn choose_resolves_pending_entry() {
        let mut registry = registry(&[
            "crafting_bench : 1 rope = 12 fiber",
            "character : 1 rope = 5 leather",
        ]);

        let err = registry.choose("rope", 2).unwrap_err();
        assert!(matches!(err, CalcError::InvalidChoice { count: 2, .. }));
        assert!(registry.is_pending("rope"));

        registry.choose("rope", 1).unwrap();
        assert_eq!(Some("character"), registry.station("rope"));
        assert_eq!("5 leather", registry.ingredients("rope").unwrap().to_string());

        assert!(registry.choose("rope", 0).is_err());
    }

    #[test]
    fn rejects_bad_lines_verbatim() {
        let mut registry = Registry::new();
        let line = "crafting_bench : 1 lightning rod = 10 copper_ingot";
        let err = registry.assign(line).unwrap_err();
        assert_eq!(format!("SyntaxError: {line}"), err.to_string());
        assert!(registry.is_empty());
    }

    #[test]
    fn station_alias_falls_back_to_itself() {
        let aliases = BTreeMap::from([(
            "machining_bench".to_string(),
            "kit_machining_bench".to_string(),
        )]);
        let registry = Registry::new().with_station_aliases(aliases);
        assert_eq!("kit_machining_bench", registry.station_alias("machining_bench"));
        assert_eq!("fabricator", registry.station_alias("fabricator"));
    }

    #[test]
    fn workstation_prefers_a_defined_station() {
        let aliases = BTreeMap::from([
            ("machining_bench".to_string(), "kit_machining_bench".to_string()),
            ("crafting_bench".to_string(), "kit_crafting_bench".to_string()),
        ]);
        let mut registry = Registry::new().with_station_aliases(aliases);
        registry.assign("character : 1 crafting_bench = 60 fiber").unwrap();
        registry.assign("crafting_bench : 1 kit_machining_bench = 10 wood").unwrap();
        registry.assign("character : 1 kit_machining_bench = 12 stone").unwrap();

        assert_eq!("crafting_bench", registry.workstation("crafting_bench"));
        assert_eq!("kit_machining_bench", registry.workstation("machining_bench"));
        assert_eq!("kit_machining_bench", registry.workstation("kit_machining_bench"));
        assert_eq!("character", registry.workstation("character"));
    }
}
