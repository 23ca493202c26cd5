pub mod randomness;
pub mod selection;
pub mod types;

pub use randomness::{derive_request_id, random_value_from_bytes};
pub use selection::{find_winner_index, winning_ticket};
pub use types::{CoordinatorExecuteMsg, RandomnessReceiverMsg, RoundStatus};
