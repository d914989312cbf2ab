//! Graft - a miniature client-side binding framework over an in-memory DOM

pub mod detector;
pub mod directive;
pub mod directives;
pub mod dom;
pub mod error;
pub mod expr;
pub mod framework;
pub mod html;
pub mod injector;
pub mod reactive;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod services;
pub mod template;
pub mod value;

pub use detector::ChangeDetector;
pub use directive::{Directive, DirectiveContext, WatchSink};
pub use dom::{Document, NodeId};
pub use error::{FixSuggestion, GraftError};
pub use expr::{Expr, Scope};
pub use framework::App;
pub use reactive::Prop;
pub use registry::{AppModule, ConstructorArgs, Definition, Dep, Provider};
pub use scheduler::{Scheduler, TimerId};
pub use selector::Selector;
pub use services::{CreditCardVerifier, Formatter};
pub use template::{EventBinding, IdGenerator};
