pub mod account;
pub mod identity;
pub mod session;

#[cfg(test)]
pub(crate) mod mocks;
