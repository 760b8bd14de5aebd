mod identity;
mod ledger;
mod loan;
mod money;
mod savings;
mod vault;

pub use identity::*;
pub use ledger::*;
pub use loan::*;
pub use money::*;
pub use savings::*;
pub use vault::*;
