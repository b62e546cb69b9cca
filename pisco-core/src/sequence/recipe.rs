//! Recipe definition and validation

use core::fmt;

use heapless::{String, Vec};
use pisco_hal::MotionParams;

use super::step::Step;
use crate::config::{SensorGate, MAX_GATES, MAX_LABEL_LEN, MAX_STEPS};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A drink recipe: gates plus the ordered steps that use them
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Recipe {
    /// Display label
    pub label: String<MAX_LABEL_LEN>,
    /// Motion parameters in effect when the run starts
    #[cfg_attr(feature = "serde", serde(default))]
    pub motion: MotionParams,
    /// Named sensor gates
    #[cfg_attr(feature = "serde", serde(default))]
    pub gates: Vec<SensorGate, MAX_GATES>,
    /// Steps in execution order
    pub steps: Vec<Step, MAX_STEPS>,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            label: String::new(),
            motion: MotionParams::default(),
            gates: Vec::new(),
            steps: Vec::new(),
        }
    }
}

/// Recipe validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecipeError {
    /// No steps
    Empty,
    /// Gate at this index reuses an earlier gate's name
    DuplicateGate(usize),
    /// Step at this index waits on a gate that does not exist
    UnknownGate(usize),
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::Empty => write!(f, "recipe has no steps"),
            RecipeError::DuplicateGate(i) => write!(f, "gate {} has a duplicate name", i),
            RecipeError::UnknownGate(i) => write!(f, "step {} waits on an unknown gate", i),
        }
    }
}

impl Recipe {
    /// Find a gate by name
    pub fn find_gate(&self, name: &str) -> Option<&SensorGate> {
        self.gates.iter().find(|g| g.name.as_str() == name)
    }

    /// Check gate references before anything is commanded
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.steps.is_empty() {
            return Err(RecipeError::Empty);
        }

        for (i, gate) in self.gates.iter().enumerate() {
            if self.gates[..i].iter().any(|g| g.name == gate.name) {
                return Err(RecipeError::DuplicateGate(i));
            }
        }

        for (i, step) in self.steps.iter().enumerate() {
            if let Step::WaitSensor { gate } = step {
                if self.find_gate(gate).is_none() {
                    return Err(RecipeError::UnknownGate(i));
                }
            }
        }

        Ok(())
    }

    /// Number of gated waits in the recipe
    pub fn wait_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::WaitSensor { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> String<MAX_LABEL_LEN> {
        String::try_from(s).unwrap()
    }

    fn recipe_with(gates: &[&str], waits: &[&str]) -> Recipe {
        let mut recipe = Recipe::default();
        for g in gates {
            recipe
                .gates
                .push(SensorGate {
                    name: name(g),
                    ..SensorGate::default()
                })
                .unwrap();
        }
        recipe.steps.push(Step::Pause { seconds: 1.0 }).unwrap();
        for w in waits {
            recipe
                .steps
                .push(Step::WaitSensor { gate: name(w) })
                .unwrap();
        }
        recipe
    }

    #[test]
    fn test_valid_recipe() {
        let recipe = recipe_with(&["mixer_lid", "ice"], &["ice", "mixer_lid"]);
        assert_eq!(recipe.validate(), Ok(()));
        assert_eq!(recipe.wait_count(), 2);
        assert_eq!(recipe.find_gate("ice").map(|g| g.name.as_str()), Some("ice"));
    }

    #[test]
    fn test_empty_recipe() {
        assert_eq!(Recipe::default().validate(), Err(RecipeError::Empty));
    }

    #[test]
    fn test_duplicate_gate() {
        let recipe = recipe_with(&["ice", "ice"], &[]);
        assert_eq!(recipe.validate(), Err(RecipeError::DuplicateGate(1)));
    }

    #[test]
    fn test_unknown_gate() {
        let recipe = recipe_with(&["ice"], &["ice", "lid"]);
        assert_eq!(recipe.validate(), Err(RecipeError::UnknownGate(2)));
    }
}
