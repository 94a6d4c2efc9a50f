//! Business logic services

mod account;
mod session;

pub use account::{AccountService, ImageUpload};
pub use session::{IssuedTokens, LoginOutcome, SessionService};
