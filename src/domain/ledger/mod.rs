pub mod position;
pub mod types;

pub use position::{holdings_from_log, net_shares_from_log};
pub use types::{Holding, NewTransaction, Transaction, User, UserId};
