//! Planner configuration.
//!
//! Consolidates the per-posture utility weights and the deadline budget.
//! Values are supplied by the external strategy selector; the defaults
//! reproduce the tuned tournament constants.

use serde::{Deserialize, Serialize};

use crate::enums::Posture;
use crate::error::ConfigError;

/// Utility weights and saturation parameters for one posture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureProfile {
    /// Friendly health required per unit of hostile health before saturation.
    pub combat_ratio: f64,
    /// Discount weight for targets far from our fleet centroid (0 disables).
    pub mass_proximity_discount: f64,
    /// Cycles of travel after which utility reaches zero.
    pub horizon_turns: f64,
    /// Utility multiplier at the arena centre, fading to 1.0 at the edge.
    pub mid_map_multiplier: f64,
    /// Base utility of an undocked hostile unit.
    pub undocked_hostile_utility: f64,
    /// Base utility of a docked hostile unit.
    pub docked_hostile_utility: f64,
    /// Base utility of a resource node we can dock at.
    pub node_utility: f64,
    /// Whether idle adjacent units are grouped into clusters.
    pub cluster_formation: bool,
}

/// Get the default profile for a posture.
pub fn default_profile(posture: Posture) -> PostureProfile {
    match posture {
        Posture::Normal => PostureProfile {
            combat_ratio: 1.0,
            mass_proximity_discount: 0.0,
            horizon_turns: 20.0,
            mid_map_multiplier: 1.4,
            undocked_hostile_utility: 9.0,
            docked_hostile_utility: 6.5,
            node_utility: 4.8,
            cluster_formation: false,
        },
        Posture::MultiOpponent => PostureProfile {
            combat_ratio: 1.0,
            mass_proximity_discount: 0.25,
            horizon_turns: 15.0,
            mid_map_multiplier: 0.5,
            undocked_hostile_utility: 11.0,
            docked_hostile_utility: 5.0,
            node_utility: 5.7,
            cluster_formation: false,
        },
        Posture::Rush => PostureProfile {
            combat_ratio: 1.0,
            mass_proximity_discount: 0.0,
            horizon_turns: 35.0,
            mid_map_multiplier: 1.4,
            undocked_hostile_utility: 5.0,
            docked_hostile_utility: 15.0,
            node_utility: 1.0,
            cluster_formation: true,
        },
    }
}

/// Fractions of the per-cycle wall-clock budget at which work degrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// Total wall-clock budget per cycle, in milliseconds.
    pub budget_ms: u64,
    /// Expensive scans stop for remaining units past this fraction.
    pub soft_fraction: f64,
    /// The assignment loop stops past this fraction.
    pub hard_fraction: f64,
    /// Fallback commands degrade to holds past this fraction.
    pub fallback_fraction: f64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            budget_ms: 2000,
            soft_fraction: 0.7,
            hard_fraction: 0.9,
            fallback_fraction: 0.95,
        }
    }
}

/// Full planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub normal: PostureProfile,
    pub multi_opponent: PostureProfile,
    pub rush: PostureProfile,
    /// Flat utility of an uncommitted arena anchor while deserting.
    pub anchor_utility: f64,
    /// Scales node utility (ignored in the multi-opponent posture).
    pub planet_multiplier: f64,
    /// Scales docked-hostile utility.
    pub aggression_multiplier: f64,
    /// Health margin for the re-engagement guard.
    pub reengage_tolerance: f64,
    /// Close-quarters manoeuvres before target assignment.
    pub skirmish: bool,
    pub deadlines: DeadlineConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            normal: default_profile(Posture::Normal),
            multi_opponent: default_profile(Posture::MultiOpponent),
            rush: default_profile(Posture::Rush),
            anchor_utility: 20.0,
            planet_multiplier: 1.0,
            aggression_multiplier: 1.0,
            reengage_tolerance: 0.0,
            skirmish: true,
            deadlines: DeadlineConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PlannerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn profile(&self, posture: Posture) -> &PostureProfile {
        match posture {
            Posture::Normal => &self.normal,
            Posture::MultiOpponent => &self.multi_opponent,
            Posture::Rush => &self.rush,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in [
            ("normal", &self.normal),
            ("multi_opponent", &self.multi_opponent),
            ("rush", &self.rush),
        ] {
            if !(profile.horizon_turns > 0.0) {
                return Err(ConfigError::InvalidHorizon {
                    posture: name.to_string(),
                    horizon: profile.horizon_turns,
                });
            }
            if !(profile.combat_ratio > 0.0) {
                return Err(ConfigError::InvalidCombatRatio {
                    posture: name.to_string(),
                    ratio: profile.combat_ratio,
                });
            }
        }

        let d = &self.deadlines;
        let ordered = 0.0 <= d.soft_fraction
            && d.soft_fraction <= d.hard_fraction
            && d.hard_fraction <= d.fallback_fraction
            && d.fallback_fraction <= 1.0;
        if !ordered {
            return Err(ConfigError::InvalidDeadlines {
                soft: d.soft_fraction,
                hard: d.hard_fraction,
                fallback: d.fallback_fraction,
            });
        }
        Ok(())
    }
}
