//! Named audio cues emitted by droids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal asking the audio collaborator to react for one droid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cue {
    /// Droid starts rising out of the floor.
    Appearing,
    /// Droid starts charging a shot.
    Charging,
    /// Droid fires a projectile.
    Shooting,
    /// Droid was hit and starts exploding.
    EnemyHit,
}

impl Cue {
    /// Wire name of the cue.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Appearing => "appearing",
            Self::Charging => "charging",
            Self::Shooting => "shooting",
            Self::EnemyHit => "enemy-hit",
        }
    }

    /// Looks a cue up by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|cue| cue.name() == name)
    }

    /// All cues.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Appearing, Self::Charging, Self::Shooting, Self::EnemyHit]
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_names_round_trip() {
        for cue in Cue::all() {
            assert_eq!(Cue::from_name(cue.name()), Some(cue));
        }
        assert_eq!(Cue::EnemyHit.to_string(), "enemy-hit");
        assert_eq!(Cue::from_name("game-over"), None);
    }
}
