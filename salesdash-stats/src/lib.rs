pub mod defaults;
pub mod math;

pub use math::{
    centered_moving_average, growth_pct, linear_fit, mean, min_max_normalize,
    population_std_dev, z_scores, LinearFit,
};
