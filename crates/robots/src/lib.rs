pub mod cache;
pub mod decision;
pub mod fetch;
pub mod groups;
pub mod matcher;
pub mod parser;

pub use cache::{InMemoryRobotsCache, RobotsCache};
pub use decision::{build_rule_set, decide};
pub use fetch::{RobotsFetchError, RobotsFetchResult, fetch_robots};
pub use groups::select_group;
pub use parser::{ParsedGroup, ParsedRobots, parse};
