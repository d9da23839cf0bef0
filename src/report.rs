//! Plain text and JSON rendering of query results

use crate::calculator::Calculator;
use crate::error::Result;
use crate::models::Equation;
use crate::tree::EquationTree;

/// Renders results with separators of a fixed width
#[derive(Debug, Clone)]
pub struct Report<'a> {
    calculator: Calculator<'a>,
    separator: String,
    banner: String,
}

impl<'a> Report<'a> {
    pub fn new(calculator: Calculator<'a>, width: usize) -> Self {
        Self {
            calculator,
            separator: "-".repeat(width),
            banner: "=".repeat(width),
        }
    }

    fn heading(&self, output: &mut Vec<String>, title: &str) {
        output.push(self.banner.clone());
        output.push(title.to_string());
        output.push(self.banner.clone());
    }

    /// One block per crafting step, in the order the steps are given.
    ///
    /// Each block lists what is crafted above a separator and what that
    /// costs one level down below it. Steps with nothing left to craft are
    /// skipped and a station is only named when it changes.
    pub fn steps(&self, steps: &[Equation]) -> Result<Vec<String>> {
        let mut output = Vec::new();
        let mut previous: Option<String> = None;

        for step in steps {
            let crafted = step.filter(false, false);
            if crafted.is_empty() {
                continue;
            }

            let station = self.calculator.station_of(&crafted)?;
            if previous.as_deref() == Some(station.as_str()) {
                output.push(self.banner.clone());
            } else {
                self.heading(&mut output, &station.replace('_', " ").to_uppercase());
            }
            previous = Some(station);

            output.extend(crafted.format_resources());
            output.push(self.separator.clone());

            let cost = self.calculator.resources_per_station(step).filter(false, false);
            output.extend(cost.format_resources());
        }

        Ok(output)
    }

    /// The query as given above the separator, the raw material total below
    pub fn total_resources(&self, total: &Equation, input: &Equation) -> Vec<String> {
        let mut output = Vec::new();
        self.heading(&mut output, "TOTAL RESOURCES");
        output.extend(input.filter(true, false).format_resources());
        output.push(self.separator.clone());
        output.extend(total.filter(true, true).format_resources());
        output
    }

    /// Indented crafting tree, each node tagged with its station
    pub fn tree(&self, tree: &EquationTree) -> Vec<String> {
        let mut output = Vec::new();
        self.heading(&mut output, "RECURSIVE DATA STRUCTURE");

        for id in tree.walk() {
            let node = tree.node(id);
            let Some(resource) = &node.resource else {
                continue;
            };

            let depth = tree.depth(id);
            // separate the trees of each queried item
            if depth == 0 && output.len() > 3 {
                output.push(self.separator.clone());
            }

            let mut line = format!("{}{resource}", " ".repeat(depth * 2));
            if let Some(station) = &node.station {
                line.push_str(&format!(" [{station}]"));
            }
            output.push(line);
        }

        output
    }
}

/// Pretty printed JSON array of the tree's nodes
pub fn tree_json(tree: &EquationTree) -> Result<Vec<String>> {
    let text = serde_json::to_string_pretty(&tree.to_entries())?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        for line in [
            "character : 1 crafting_bench = 60 fiber + 50 wood + 12 stone + 20 leather",
            "crafting_bench : 1 anvil_bench = 40 iron_ingot + 20 wood + 10 stone",
            "stone_furnace : 1 iron_ingot = 2 iron_ore",
        ] {
            registry.assign(line).unwrap();
        }
        registry
    }

    fn eq(s: &str) -> Equation {
        Equation::parse_lenient(s).unwrap()
    }

    #[test]
    fn steps_name_each_station_once() {
        let registry = registry();
        let report = Report::new(Calculator::new(&registry), 6);

        let steps = [eq("1 crafting_bench"), eq("1 anvil_bench"), eq("1 anvil_bench")];
        let output = report.steps(&steps).unwrap();
        assert_eq!(
            vec![
                "======",
                "CHARACTER",
                "======",
                "1 crafting_bench",
                "------",
                "60 fiber",
                "50 wood",
                "20 leather",
                "12 stone",
                "======",
                "CRAFTING BENCH",
                "======",
                "1 anvil_bench",
                "------",
                "40 iron_ingot",
                "20 wood",
                "10 stone",
                "======",
                "1 anvil_bench",
                "------",
                "40 iron_ingot",
                "20 wood",
                "10 stone",
            ],
            output
        );
    }

    #[test]
    fn steps_skip_fully_owned_items() {
        let registry = registry();
        let report = Report::new(Calculator::new(&registry), 4);
        let output = report.steps(&[eq("0 anvil_bench - 2 crafting_bench")]).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn steps_reject_mixed_stations() {
        let registry = registry();
        let report = Report::new(Calculator::new(&registry), 4);
        let err = report.steps(&[eq("1 anvil_bench + 1 crafting_bench")]).unwrap_err();
        assert_eq!("Multiple stations: crafting_bench, character", err.to_string());
    }

    #[test]
    fn total_keeps_input_and_clamps_total() {
        let registry = registry();
        let report = Report::new(Calculator::new(&registry), 3);
        let output = report.total_resources(
            &eq("60 fiber - 50 wood + 2 stone"),
            &eq("1 crafting_bench - 100 wood"),
        );
        assert_eq!(
            vec![
                "===",
                "TOTAL RESOURCES",
                "===",
                "   1 crafting_bench",
                "-100 wood",
                "---",
                "60 fiber",
                " 2 stone",
                " 0 wood",
            ],
            output
        );
    }

    #[test]
    fn tree_indents_by_depth() {
        let registry = registry();
        let calculator = Calculator::new(&registry);
        let report = Report::new(calculator, 4);

        let tree = calculator.calculate_recursive(&eq("1 anvil_bench + 1 crafting_bench"));
        assert_eq!(
            vec![
                "====",
                "RECURSIVE DATA STRUCTURE",
                "====",
                "1 crafting_bench [character]",
                "  60 fiber",
                "  50 wood",
                "  12 stone",
                "  20 leather",
                "----",
                "1 anvil_bench [crafting_bench]",
                "  40 iron_ingot [stone_furnace]",
                "    80 iron_ore",
                "  20 wood",
                "  10 stone",
            ],
            report.tree(&tree)
        );
    }

    #[test]
    fn json_nests_children() {
        let registry = registry();
        let tree = Calculator::new(&registry).calculate_recursive(&eq("1 iron_ingot"));
        let text = tree_json(&tree).unwrap().join("\n");
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!("iron_ingot", value[0]["name"]);
        assert_eq!(1, value[0]["amount"]);
        assert_eq!(1, value[0]["count"]);
        assert_eq!("stone_furnace", value[0]["station"]);
        assert_eq!("iron_ore", value[0]["children"][0]["name"]);
        assert_eq!(2, value[0]["children"][0]["amount"]);
        assert!(value[0]["children"][0]["station"].is_null());
    }
}
