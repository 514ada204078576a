mod fixtures;
mod goodness_of_fit;
mod util;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use goodness_of_fit::goodness_of_fit;
#[allow(unused_imports)]
pub use util::test_rng;
