//! Built-in directives and components
//!
//! Each submodule exposes a `definition()` describing how the framework
//! grafts it; [`builtin_definitions`] and [`builtin_providers`] bundle the
//! whole set for a one-call bootstrap.

pub mod chrono;
pub mod counter;
pub mod credit_card;
pub mod phone_number;
pub mod user_profile;

use crate::registry::{Definition, Provider};
use crate::services::{CreditCardVerifier, Formatter};

pub fn builtin_definitions() -> Vec<Definition> {
    vec![
        phone_number::definition(),
        credit_card::definition(),
        chrono::definition(),
        counter::definition(),
        user_profile::definition(),
    ]
}

pub fn builtin_providers() -> Vec<Provider> {
    vec![
        Provider::new("formatter", || Formatter::new("global")),
        Provider::new("verifier", CreditCardVerifier::new),
    ]
}
