//! Query pipeline: validate, settle pending recipes, expand, render

use std::io::{BufRead, Write};

use tracing::debug;

use crate::calculator::Calculator;
use crate::config::Settings;
use crate::error::{CalcError, Result};
use crate::models::Equation;
use crate::registry::Registry;
use crate::report::{Report, tree_json};
use crate::resolve::{Choice, Traversal};
use crate::similar::find_similar;
use crate::validator;

/// How results are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Per-station steps followed by the total
    #[default]
    Iterative,
    /// Crafting tree followed by the total
    Recursive,
    /// Crafting tree as JSON
    Json,
}

/// Asks the user to pick one of a pending name's recipes
pub trait ChoicePrompt {
    /// Index into `choice.options`, or `CalcError::Cancelled`
    fn choose(&mut self, choice: &Choice) -> Result<usize>;
}

impl<F> ChoicePrompt for F
where
    F: FnMut(&Choice) -> Result<usize>,
{
    fn choose(&mut self, choice: &Choice) -> Result<usize> {
        self(choice)
    }
}

/// Prompt reading answers line by line
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.split_whitespace().collect::<Vec<_>>().join(" ")))
    }

    /// Next query, `None` on end of input or `exit`/`quit`
    pub fn read_query(&mut self) -> Result<Option<String>> {
        writeln!(self.output)?;
        write!(self.output, "> ")?;
        self.output.flush()?;

        Ok(self
            .read_line()?
            .filter(|line| !matches!(line.as_str(), "exit" | "quit")))
    }

    pub fn print(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> ChoicePrompt for LinePrompt<R, W> {
    fn choose(&mut self, choice: &Choice) -> Result<usize> {
        for (i, option) in choice.options.iter().enumerate() {
            writeln!(self.output, "({i}) {option}")?;
        }

        loop {
            write!(self.output, ":: Which recipe would you like to use? ")?;
            self.output.flush()?;
            let answer = self.read_line()?.ok_or(CalcError::Cancelled)?;
            writeln!(self.output)?;

            if matches!(answer.as_str(), "exit" | "quit") {
                return Err(CalcError::Cancelled);
            }
            match answer.parse::<usize>() {
                Ok(index) if index < choice.options.len() => return Ok(index),
                _ => continue,
            }
        }
    }
}

pub struct Application {
    registry: Registry,
    settings: Settings,
    mode: Mode,
    traversal: Traversal,
    fit_separator: bool,
}

impl Application {
    pub fn new(registry: Registry, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            mode: Mode::default(),
            traversal: Traversal::default(),
            fit_separator: false,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Size separators to the query line instead of the configured width
    pub fn fit_separator(mut self, fit: bool) -> Self {
        self.fit_separator = fit;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn help() -> Vec<String> {
        vec![
            "Usage:".to_string(),
            "  amount name [+/- amount name ...]".to_string(),
        ]
    }

    /// Parse under the query grammar, then check every name against the
    /// registry
    pub fn parse_input(&self, input: &str) -> Result<Equation> {
        let equation: Equation = input.parse()?;
        validator::validate_value_calculation(&self.registry, &equation)?;
        Ok(equation)
    }

    /// Did-you-mean lines for the unknown names in `input`
    pub fn recover(&self, input: &str) -> Vec<String> {
        let Ok(equation) = input.parse::<Equation>() else {
            return Vec::new();
        };
        let similar = find_similar(
            &self.registry,
            &equation,
            self.settings.similarity_cutoff,
            self.settings.max_suggestions,
        );
        if similar.is_empty() {
            return Vec::new();
        }

        let mut output = vec![String::new(), ":: Did you mean?".to_string()];
        for (name, words) in similar {
            output.push(format!("- {name}: {}", words.join(", ")));
        }
        output
    }

    /// Run one query through the whole pipeline
    pub fn process(&mut self, input: &str, prompt: &mut dyn ChoicePrompt) -> Result<Vec<String>> {
        let input = input.split_whitespace().collect::<Vec<_>>().join(" ");
        let equation = self.parse_input(&input)?;

        self.registry
            .resolve_with(&equation, self.traversal, |choice| prompt.choose(choice))?;

        let calculator = Calculator::new(&self.registry);
        let equation = match self.traversal {
            Traversal::Explicit => equation,
            Traversal::Implicit => calculator.find_workstations(&equation),
        };
        debug!(%equation, mode = ?self.mode, "processing query");

        let width = if self.fit_separator {
            input.len() + 2
        } else {
            self.settings.separator_width
        };
        let report = Report::new(calculator, width);

        match self.mode {
            Mode::Iterative => {
                let mut steps: Vec<Equation> = calculator.calculate(equation.clone()).collect();
                let total = steps.pop().unwrap_or_default();
                steps.reverse();

                let mut output = report.steps(&steps)?;
                output.extend(report.total_resources(&total, &equation));
                Ok(output)
            }
            Mode::Recursive => {
                let total = calculator.total(equation.clone());
                let tree = calculator.calculate_recursive(&equation);

                let mut output = report.tree(&tree);
                output.extend(report.total_resources(&total, &equation));
                Ok(output)
            }
            Mode::Json => tree_json(&calculator.calculate_recursive(&equation)),
        }
    }

    /// Like [`Application::process`], but syntax and value errors become
    /// output: usage help or did-you-mean suggestions after the message.
    pub fn respond(&mut self, input: &str, prompt: &mut dyn ChoicePrompt) -> Result<Vec<String>> {
        match self.process(input, prompt) {
            Ok(output) => Ok(output),
            Err(err) if err.is_syntax() => {
                let mut output = vec![err.to_string()];
                output.extend(Self::help());
                Ok(output)
            }
            Err(err) if err.is_value() => {
                let mut output = vec![err.to_string()];
                output.extend(self.recover(input));
                Ok(output)
            }
            Err(err) => Err(err),
        }
    }

    /// Interactive loop until end of input, `exit`/`quit`, or a cancelled
    /// recipe choice
    pub fn run<R: BufRead, W: Write>(&mut self, prompt: &mut LinePrompt<R, W>) -> Result<()> {
        prompt.print(&Self::help())?;

        while let Some(query) = prompt.read_query()? {
            let output = match self.respond(&query, prompt) {
                Err(CalcError::Cancelled) => break,
                other => other?,
            };
            prompt.print(&output)?;
        }

        Ok(())
    }
}
