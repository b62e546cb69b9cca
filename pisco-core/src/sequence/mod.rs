//! Recipe model and sequencer

pub mod recipe;
pub mod runner;
pub mod step;

pub use recipe::{Recipe, RecipeError};
pub use runner::{RunReport, Sequencer};
pub use step::Step;
