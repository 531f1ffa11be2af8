mod stability_analysis;
pub use stability_analysis::{is_stable, stability_test, stability_test_with, StabilityResult};
