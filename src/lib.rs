//! Crafting recipe calculator
//!
//! Expands a request such as `1 machining_bench - 10 epoxy` into the
//! crafting steps of each station and the raw materials needed in total.

pub mod app;
pub mod calculator;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod similar;
pub mod tree;
pub mod validator;

pub use calculator::{Calculation, Calculator, TOTAL_RESOURCES};
pub use error::{CalcError, Result};
pub use models::{Amount, Equation, Resource};
pub use registry::{Entry, Recipe, Registry};
pub use tree::{EquationTree, NodeId, TreeEntry};
