//! Tunable evaluation weights.

use serde::{Deserialize, Serialize};

/// Multipliers for the three score-difference regimes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub far_behind: f64,
    pub even: f64,
    pub far_ahead: f64,
}

impl Default for TierWeights {
    fn default() -> Self {
        TierWeights {
            far_behind: 1.0,
            even: 1.0,
            far_ahead: 1.0,
        }
    }
}

/// Every constant the static evaluator uses.
///
/// Missing fields in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    /// Value of an able seeker.
    pub seeker_base: f64,
    /// Value of a banned or knocked out seeker.
    pub seeker_incapacitated: f64,
    /// Numerator of the seeker-to-snitch closeness reward.
    pub snitch_proximity: f64,
    /// Factor applied to the closeness reward when it turns into a penalty.
    pub snitch_behind_penalty: f64,
    /// Raw distance up to which the real path length is used.
    pub snitch_path_range: i32,
    /// Closeness multiplier per overtime stage.
    pub overtime_snitch_scale: [f64; 4],
    /// Numerator of the seeker-to-centre reward when there is no snitch.
    pub seeker_center: f64,
    pub quaffle_possession: f64,
    pub quaffle_proximity: f64,
    /// Weight of the holder's best scoring chance.
    pub goal_chance: f64,
    /// Weight of a teammate's scoring chance for handlers not holding.
    pub goal_potential: f64,
    /// Regime multipliers of `goal_chance` for the holder.
    pub holding_tiers: TierWeights,
    /// Regime multipliers of `goal_potential` for teammates of the holder.
    pub support_tiers: TierWeights,
    pub bludger_beater: f64,
    pub bludger_danger: f64,
    pub ban_unit: f64,
    /// Bans above this count trigger the disqualification penalty.
    pub ban_threshold: u32,
    pub ban_disqualification: f64,
    /// Fraction of the ban penalty waived per ban after a goal this round.
    pub goal_ban_rebate: f64,
    /// Score difference separating the even tier from the far tiers.
    pub win_threshold: i64,
    pub score_far_behind: f64,
    pub score_linear: f64,
    pub far_ahead_bonus: f64,
    /// Value of a finished match, before the score difference.
    pub terminal_value: f64,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            seeker_base: 100.0,
            seeker_incapacitated: 0.0,
            snitch_proximity: 60.0,
            snitch_behind_penalty: 1.5,
            snitch_path_range: 2,
            overtime_snitch_scale: [1.0, 1.25, 1.5, 2.0],
            seeker_center: 5.0,
            quaffle_possession: 15.0,
            quaffle_proximity: 6.0,
            goal_chance: 20.0,
            goal_potential: 8.0,
            holding_tiers: TierWeights {
                far_behind: 1.4,
                even: 1.0,
                far_ahead: 0.7,
            },
            support_tiers: TierWeights {
                far_behind: 1.1,
                even: 1.0,
                far_ahead: 0.4,
            },
            bludger_beater: 3.0,
            bludger_danger: 2.0,
            ban_unit: 30.0,
            ban_threshold: 2,
            ban_disqualification: 5000.0,
            goal_ban_rebate: 0.25,
            win_threshold: 30,
            score_far_behind: 15.0,
            score_linear: 10.0,
            far_ahead_bonus: 200.0,
            terminal_value: 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let w: EvalWeights = serde_json::from_str(r#"{"ban_unit": 45.0}"#).unwrap();
        assert_eq!(w.ban_unit, 45.0);
        assert_eq!(w.seeker_base, EvalWeights::default().seeker_base);
    }

    #[test]
    fn tiers_are_configured_per_branch() {
        let w: EvalWeights =
            serde_json::from_str(r#"{"support_tiers": {"far_ahead": 0.1}}"#).unwrap();
        assert_eq!(w.support_tiers.far_ahead, 0.1);
        assert_eq!(w.support_tiers.even, 1.0);
        assert_eq!(w.holding_tiers, EvalWeights::default().holding_tiers);
    }

    #[test]
    fn defaults_roundtrip_through_json() {
        let w = EvalWeights::default();
        let json = serde_json::to_string(&w).unwrap();
        let back: EvalWeights = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
