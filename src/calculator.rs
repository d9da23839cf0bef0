//! Recipe resolution engine
//!
//! Expands an equation of craftable items one station tier at a time until
//! only raw materials remain. Tier order comes from the station chain: a
//! workbench that is itself crafted at another workbench sits one tier
//! higher. Recipe graphs are assumed acyclic; a cycle makes expansion run
//! forever.

use std::collections::{HashMap, VecDeque};

use num_traits::{Signed, Zero};
use tracing::{debug, trace, warn};

use crate::error::{CalcError, Result};
use crate::models::{Equation, Resource, amount};
use crate::registry::Registry;
use crate::tree::{EquationTree, NodeId};

/// Pseudo station for raw materials
pub const TOTAL_RESOURCES: &str = "total_resources";

#[derive(Debug, Clone, Copy)]
pub struct Calculator<'a> {
    registry: &'a Registry,
}

impl<'a> Calculator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Length of the station chain starting at `station`, at least 1
    pub fn station_value(&self, station: &str) -> usize {
        let limit = self.registry.len() + 1;
        let mut value = 1;
        let mut current = station;
        while let Some(next) = self.registry.station(current) {
            value += 1;
            current = next;
            if value > limit {
                warn!(station, "station chain loops back on itself");
                break;
            }
        }
        value
    }

    /// Station of the highest tier among `resources`, greatest name on ties
    pub fn order_by_station(&self, resources: &[Resource]) -> Result<String> {
        if let Some(unknown) = resources
            .iter()
            .find(|r| !self.registry.is_resolved(r.name()))
        {
            return Err(CalcError::Value(unknown.name().to_string()));
        }
        self.highest_station(resources)
            .map(str::to_string)
            .ok_or(CalcError::EmptyEquation)
    }

    fn highest_station(&self, resources: &[Resource]) -> Option<&'a str> {
        resources
            .iter()
            .filter_map(|r| self.registry.station(r.name()))
            .map(|station| (self.station_value(station), station))
            .max()
            .map(|(_, station)| station)
    }

    /// Names in `equation` that still need `target`.
    ///
    /// A name needs the target when it is crafted at the target, or when its
    /// recipe (followed all the way down) mentions or is crafted at it. With
    /// `not_first` unset a direct mention at this level only counts for a
    /// pending name.
    pub fn search_variable(
        &self,
        target: &str,
        equation: &Equation,
        not_first: bool,
    ) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut reaches = HashMap::new();

        for part in equation {
            let name = part.name();
            let hit = (name == target && (not_first || self.registry.is_pending(target)))
                || self.crafted_at(name, target)
                || self
                    .registry
                    .ingredients(name)
                    .is_some_and(|expression| self.references(target, expression, &mut reaches));

            if hit && !found.iter().any(|f| f == name) {
                found.push(name.to_string());
            }
        }

        found
    }

    fn crafted_at(&self, name: &str, target: &str) -> bool {
        self.registry
            .station(name)
            .is_some_and(|station| target == station || target == self.registry.station_alias(station))
    }

    /// Whether any part of a recipe expression, followed all the way down,
    /// mentions or is crafted at `target`. `reaches` remembers the answer
    /// per recipe name so shared sub-recipes are walked once.
    fn references(
        &self,
        target: &str,
        equation: &'a Equation,
        reaches: &mut HashMap<&'a str, bool>,
    ) -> bool {
        equation.iter().any(|part| {
            let name = part.name();
            if name == target || self.crafted_at(name, target) {
                return true;
            }
            if let Some(&known) = reaches.get(name) {
                return known;
            }

            reaches.insert(name, false);
            let found = match self.registry.ingredients(name) {
                Some(expression) => self.references(target, expression, reaches),
                None => false,
            };
            reaches.insert(name, found);
            found
        })
    }

    /// Items ready to expand now: craftable, positive, and not needed by any
    /// other positive item. Only the highest tier station's items are kept.
    /// An equation of raw materials comes back unchanged.
    pub fn select_next_tier(&self, equation: &Equation) -> Equation {
        let candidates: Vec<Resource> = equation
            .iter()
            .filter(|r| r.amount().is_positive() && self.registry.is_resolved(r.name()))
            .filter(|r| {
                let others: Equation = equation
                    .iter()
                    .filter(|o| o.name() != r.name() && o.amount().is_positive())
                    .cloned()
                    .collect();
                self.search_variable(r.name(), &others, false).is_empty()
            })
            .cloned()
            .collect();

        let Some(station) = self.highest_station(&candidates) else {
            return equation.clone();
        };

        candidates
            .into_iter()
            .filter(|r| self.registry.station(r.name()) == Some(station))
            .collect()
    }

    /// Replace every craftable resource that is also in `target` with its
    /// scaled recipe
    pub fn substitute(&self, equation: &Equation, target: &Equation) -> Equation {
        let mut resources = Vec::with_capacity(equation.len());
        for resource in equation {
            match self.registry.ingredients(resource.name()) {
                Some(ingredients) if target.contains(resource) => {
                    resources.extend(ingredients.multiply(resource.amount()).iter().cloned());
                }
                _ => resources.push(resource.clone()),
            }
        }
        Equation::new(resources)
    }

    /// Lazily expand `equation`, one station group per step.
    ///
    /// The last item is the flattened total of raw materials.
    pub fn calculate(&self, equation: Equation) -> Calculation<'a> {
        Calculation {
            calculator: *self,
            equation,
            done: false,
        }
    }

    /// Raw material total of `equation`
    pub fn total(&self, equation: Equation) -> Equation {
        self.calculate(equation).last().unwrap_or_default()
    }

    /// Material cost one level down
    pub fn resources_per_station(&self, equation: &Equation) -> Equation {
        self.substitute(equation, equation).evaluate()
    }

    /// The one station every resource in `equation` is crafted at
    pub fn station_of(&self, equation: &Equation) -> Result<String> {
        let stations: Vec<String> = equation
            .iter()
            .map(|r| {
                self.registry
                    .station(r.name())
                    .unwrap_or(TOTAL_RESOURCES)
                    .to_string()
            })
            .collect();

        let first = stations.first().ok_or(CalcError::EmptyEquation)?;
        if stations.iter().any(|s| s != first) {
            return Err(CalcError::MultipleStations(stations));
        }
        Ok(first.clone())
    }

    /// Crafting order: tiers peeled off from the top, then reversed so the
    /// earliest craftable items come first
    pub fn arrange_resources(&self, equation: &Equation) -> Equation {
        let mut arranged: Vec<Resource> = Vec::new();
        let mut remaining = equation.clone();

        while !remaining.is_empty() {
            let mut tier: Vec<Resource> = self.select_next_tier(&remaining).resources().to_vec();
            tier.sort_by(|a, b| b.amount().cmp(a.amount()));
            remaining = remaining
                .iter()
                .filter(|r| !tier.contains(r))
                .cloned()
                .collect();
            arranged.extend(tier);
        }

        arranged.reverse();
        Equation::new(arranged)
    }

    /// Build the crafting tree for `equation`.
    ///
    /// Negative amounts never become nodes. They are carried along the
    /// depth-first walk and offset the next place the same item is needed.
    pub fn calculate_recursive(&self, equation: &Equation) -> EquationTree {
        let equation = self.arrange_resources(equation).evaluate();
        let mut carried: Equation = equation
            .iter()
            .filter(|r| r.amount().is_negative())
            .cloned()
            .collect();
        let positive: Equation = equation
            .iter()
            .filter(|r| r.amount().is_positive())
            .cloned()
            .collect();

        let mut tree = EquationTree::new();
        let mut stack = vec![Frame {
            parent: tree.root(),
            queue: level(&positive, &mut carried),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(resource) = frame.queue.pop_front() else {
                stack.pop();
                continue;
            };

            let station = self.registry.station(resource.name()).map(str::to_string);
            let node = tree.push(frame.parent, resource.clone(), station);

            if self.registry.is_resolved(resource.name()) {
                let single = Equation::from(resource);
                let expansion = self.substitute(&single, &single);
                stack.push(Frame {
                    parent: node,
                    queue: level(&expansion, &mut carried),
                });
            }
        }

        tree
    }

    /// Recipe names in the order the iterative expansion reaches them
    pub fn find_resources(&self, equation: &Equation) -> Vec<String> {
        let mut names = Vec::new();
        let mut equation = equation.clone();

        loop {
            equation = equation.evaluate();
            let selected = self.select_next_tier(&equation);
            names.extend(
                selected
                    .iter()
                    .filter(|r| self.registry.is_resolved(r.name()))
                    .map(|r| r.name().to_string()),
            );
            equation = self.substitute(&equation, &selected);

            if equation == selected {
                break;
            }
        }

        names
    }

    /// Add every workstation the expansion passes through that the equation
    /// does not already mention, until nothing new is needed
    pub fn find_workstations(&self, equation: &Equation) -> Equation {
        let mut equation = equation.evaluate();

        loop {
            let mut stations: Vec<&str> = Vec::new();
            for name in self.find_resources(&equation) {
                let Some(station) = self.registry.station(&name) else {
                    continue;
                };
                let station = self.registry.workstation(station);
                if self.registry.is_resolved(station) && !stations.contains(&station) {
                    stations.push(station);
                }
            }

            let workstations: Vec<Resource> = stations
                .into_iter()
                .filter(|station| equation.quantity(station).is_zero())
                .map(|station| Resource::new(amount(1), station))
                .collect();

            if workstations.is_empty() {
                return equation;
            }

            let added = Equation::new(workstations);
            debug!(%added, "implicit workstations");
            equation = equation.chain(&added).evaluate();
        }
    }
}

struct Frame {
    parent: NodeId,
    queue: VecDeque<Resource>,
}

/// Merge a level with the carried negatives; the positives become children
/// and whatever is still negative keeps travelling
fn level(equation: &Equation, carried: &mut Equation) -> VecDeque<Resource> {
    let merged = equation.chain(carried).evaluate();
    *carried = merged
        .iter()
        .filter(|r| r.amount().is_negative())
        .cloned()
        .collect();
    merged
        .iter()
        .filter(|r| r.amount().is_positive())
        .cloned()
        .collect()
}

/// Iterator returned by [`Calculator::calculate`]
pub struct Calculation<'a> {
    calculator: Calculator<'a>,
    equation: Equation,
    done: bool,
}

impl Iterator for Calculation<'_> {
    type Item = Equation;

    fn next(&mut self) -> Option<Equation> {
        if self.done {
            return None;
        }

        let equation = self.equation.evaluate();
        let positive = equation.filter(false, false);
        let tier = self.calculator.select_next_tier(&positive);
        trace!(equation = %equation, tier = %tier, "expansion step");

        self.equation = self.calculator.substitute(&equation, &tier);
        self.done = !positive
            .iter()
            .any(|r| self.calculator.registry.is_resolved(r.name()));

        Some(tier)
    }
}
