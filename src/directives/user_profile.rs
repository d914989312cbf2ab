//! User profile card component

use serde_json::Value;
use tracing::info;

use crate::directive::{Directive, DirectiveContext};
use crate::error::GraftError;
use crate::registry::Definition;
use crate::value;

const TEMPLATE: &str = "\
<h3 (click)=\"onClickH3\">{{ firstName }} {{ lastName }}</h3>\
<strong>{{ job }}</strong> \
<button (click)=\"onClickButton\" (dblclick)=\"onDblClickButton\">Rename</button>";

#[derive(Default)]
pub struct UserProfile {
    first_name: String,
    last_name: String,
    job: String,
}

impl Directive for UserProfile {
    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "firstName" => Some(Value::String(self.first_name.clone())),
            "lastName" => Some(Value::String(self.last_name.clone())),
            "job" => Some(Value::String(self.job.clone())),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, v: Value) -> bool {
        let Some(text) = value::as_string(&v) else {
            return matches!(name, "firstName" | "lastName" | "job");
        };
        match name {
            "firstName" => self.first_name = text,
            "lastName" => self.last_name = text,
            "job" => self.job = text,
            _ => return false,
        }
        true
    }

    fn call(
        &mut self,
        method: &str,
        _args: &[Value],
        _ctx: &mut DirectiveContext<'_>,
    ) -> Result<bool, GraftError> {
        match method {
            "onClickH3" => {
                info!(first_name = %self.first_name, "profile heading clicked");
                Ok(true)
            }
            "onClickButton" => {
                self.first_name = "Roger".to_string();
                Ok(true)
            }
            "onDblClickButton" => {
                self.first_name = "Magali".to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn definition() -> Definition {
    Definition::new("user-profile", "user-profile", vec![], |_| {
        Ok(Box::<UserProfile>::default())
    })
    .template(TEMPLATE)
    .input("first-name", "firstName")
    .input("last-name", "lastName")
    .input("job", "job")
}
