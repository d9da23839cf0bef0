//! Finding pending recipes a query depends on
//!
//! Resolution does not call back into the caller. [`Registry::next_choice`]
//! reports the first pending name a query reaches; the caller picks one of
//! its options with [`Registry::choose`] and asks again until nothing is
//! left to decide.

use std::collections::{HashSet, VecDeque};

use crate::models::Equation;
use crate::registry::Registry;

/// Which edges of the recipe graph a query depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Ingredients only
    #[default]
    Explicit,
    /// Ingredients and the stations recipes are crafted at
    Implicit,
}

/// A pending name and the recipe lines to pick from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub options: Vec<String>,
}

impl Registry {
    /// First pending name reachable from `equation`, breadth first
    pub fn next_choice(&self, equation: &Equation, traversal: Traversal) -> Option<Choice> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = equation.iter().map(|r| r.name()).collect();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }

            if let Some(options) = self.options(name) {
                return Some(Choice {
                    name: name.to_string(),
                    options: options.to_vec(),
                });
            }

            if traversal == Traversal::Implicit {
                if let Some(station) = self.station(name) {
                    queue.push_back(self.workstation(station));
                }
            }

            if let Some(ingredients) = self.ingredients(name) {
                queue.extend(ingredients.iter().map(|r| r.name()));
            }
        }

        None
    }

    /// Settle every pending name `equation` depends on, asking `pick` for
    /// each one. Stops at the first error `pick` returns.
    pub fn resolve_with<E>(
        &mut self,
        equation: &Equation,
        traversal: Traversal,
        mut pick: impl FnMut(&Choice) -> Result<usize, E>,
    ) -> Result<(), E>
    where
        E: From<crate::error::CalcError>,
    {
        while let Some(choice) = self.next_choice(equation, traversal) {
            let index = pick(&choice)?;
            self.choose(&choice.name, index)?;
        }
        Ok(())
    }
}
