pub mod chain;
pub mod clone;
pub mod deploy;
pub mod instances;
pub mod launch;
