//! MCTS configuration parameters.

/// Parameters controlling one search episode.
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// Number of simulations per search.
    pub num_simulations: usize,

    /// Dirichlet noise alpha for root exploration.
    /// Higher values = more uniform noise, lower = more concentrated.
    pub dirichlet_alpha: f32,

    /// Fraction of each root prior replaced with Dirichlet noise.
    /// 0 disables root noise entirely.
    pub exploration_fraction: f32,

    /// PUCT exploration constant base.
    /// Part of the formula: c = pb_c_init + log((N + pb_c_base + 1) / pb_c_base)
    pub pb_c_base: f32,

    /// PUCT exploration constant init.
    pub pb_c_init: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 800,
            dirichlet_alpha: 0.3,
            exploration_fraction: 0.25,
            pb_c_base: 19652.0,
            pb_c_init: 1.25,
        }
    }
}

impl MctsConfig {
    /// Config with the given simulation count and default constants.
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    /// Config for deterministic evaluation play: no exploration noise.
    pub fn for_evaluation(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            exploration_fraction: 0.0,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.num_simulations, 800);
        assert!((config.dirichlet_alpha - 0.3).abs() < 1e-5);
        assert!((config.exploration_fraction - 0.25).abs() < 1e-5);
        assert!((config.pb_c_base - 19652.0).abs() < 1e-5);
        assert!((config.pb_c_init - 1.25).abs() < 1e-5);
    }

    #[test]
    fn test_for_evaluation_disables_noise() {
        let config = MctsConfig::for_evaluation(100);
        assert_eq!(config.num_simulations, 100);
        assert_eq!(config.exploration_fraction, 0.0);
    }
}
