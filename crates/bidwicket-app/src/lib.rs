// Library root: the interactive session around the core auction ledger.

pub mod logging;
pub mod protocol;
pub mod session;
