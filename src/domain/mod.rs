mod account;
mod integrity;
mod journal;
mod ledger;
mod money;

pub use account::*;
pub use integrity::*;
pub use journal::*;
pub use ledger::*;
pub use money::*;
