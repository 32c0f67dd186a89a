/// Tuning for extra loop connections and bonus scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub name: &'static str,
    /// Fraction of `cols * rows` drawn as candidate cells to open.
    pub extra_connection_density: f64,
    /// Probability that a drawn wall candidate is opened.
    pub extra_connection_chance: f64,
    pub bonus_multiplier: f64,
}

pub const EASY: DifficultyProfile = DifficultyProfile {
    name: "easy",
    extra_connection_density: 0.08,
    extra_connection_chance: 0.6,
    bonus_multiplier: 1.0,
};

pub const NORMAL: DifficultyProfile = DifficultyProfile {
    name: "normal",
    extra_connection_density: 0.05,
    extra_connection_chance: 0.4,
    bonus_multiplier: 1.5,
};

pub const HARD: DifficultyProfile = DifficultyProfile {
    name: "hard",
    extra_connection_density: 0.02,
    extra_connection_chance: 0.25,
    bonus_multiplier: 2.0,
};

pub const CRUEL: DifficultyProfile = DifficultyProfile {
    name: "cruel",
    extra_connection_density: 0.0,
    extra_connection_chance: 0.0,
    bonus_multiplier: 3.0,
};

pub const PROFILES: [DifficultyProfile; 4] = [EASY, NORMAL, HARD, CRUEL];

impl DifficultyProfile {
    /// Look a profile up by name, falling back to `normal`.
    pub fn from_name(name: &str) -> DifficultyProfile {
        let wanted = name.trim();
        PROFILES
            .iter()
            .copied()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .unwrap_or(NORMAL)
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        NORMAL
    }
}
