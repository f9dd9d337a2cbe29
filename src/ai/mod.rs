pub mod bounded;
pub mod evaluation;
pub mod search;

pub use bounded::{BoundedSearch, SearchOutcome};
pub use evaluation::{INF, MATE, evaluate, is_mate_score};
pub use search::{
    FirstLegalPicker, MinimaxSearcher, MovePicker, RandomPicker, SearchStats, picker_for,
};
