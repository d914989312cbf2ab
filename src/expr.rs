//! Closed expression grammar
//!
//! A small grammar interpreted by a dedicated evaluator: boolean/number/
//! string literals, flat array literals, and dotted property paths. Nothing
//! here executes code.
//!
//! Two consumers:
//! - bracketed attribute inputs (`[step]="2"`, `[names]="['a', 'b']"`),
//!   restricted to literals
//! - host-listener parameter extraction (`event.target.value`), paths
//!   evaluated against the dispatch scope

use serde_json::Value;

use crate::error::GraftError;

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Value),
    Path(Vec<String>),
}

/// Name lookup for path roots during evaluation.
///
/// `event` resolves to the dispatched event payload; any other root is an
/// instance property of the directive being invoked.
pub trait Scope {
    fn lookup(&self, root: &str) -> Option<Value>;
}

impl Expr {
    /// Parse one expression, requiring it to span the whole input.
    pub fn parse(input: &str) -> Result<Self, GraftError> {
        let mut parser = Parser::new(input);
        let expr = parser.parse_expr()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(parser.fail("trailing characters after expression"));
        }
        Ok(expr)
    }

    /// Parse an expression and require a literal (bracketed-attribute rule).
    pub fn parse_literal(input: &str) -> Result<Value, GraftError> {
        match Self::parse(input)? {
            Expr::Lit(value) => Ok(value),
            Expr::Path(_) => Err(GraftError::ExprParse {
                expr: input.to_string(),
                position: 0,
                details: "bracketed attributes accept literals only".to_string(),
            }),
        }
    }

    /// Evaluate against a scope.
    pub fn eval(&self, scope: &dyn Scope) -> Result<Value, GraftError> {
        match self {
            Expr::Lit(value) => Ok(value.clone()),
            Expr::Path(segments) => {
                let no_match = || GraftError::ExprPathNoMatch {
                    path: segments.join("."),
                };
                let mut current = scope.lookup(&segments[0]).ok_or_else(no_match)?;
                for segment in &segments[1..] {
                    current = current.get(segment).cloned().ok_or_else(no_match)?;
                }
                Ok(current)
            }
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn fail(&self, details: &str) -> GraftError {
        GraftError::ExprParse {
            expr: self.input.to_string(),
            position: self.pos,
            details: details.to_string(),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, GraftError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.fail("empty expression")),
            Some('[') => self.parse_array().map(Expr::Lit),
            Some('\'' | '"') => self.parse_string().map(|s| Expr::Lit(Value::String(s))),
            Some(c) if c.is_ascii_digit() || c == '-' => self.parse_number().map(Expr::Lit),
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => self.parse_path_or_keyword(),
            Some(c) => Err(self.fail(&format!("unexpected '{c}'"))),
        }
    }

    fn parse_array(&mut self) -> Result<Value, GraftError> {
        self.pos += 1; // consume '['
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.fail("unterminated array literal")),
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                _ => {
                    match self.parse_expr()? {
                        Expr::Lit(value) => items.push(value),
                        Expr::Path(_) => {
                            return Err(self.fail("array literals may only contain literals"))
                        }
                    }
                    self.skip_whitespace();
                    if self.peek() == Some(',') {
                        self.pos += 1;
                    } else if self.peek() != Some(']') {
                        return Err(self.fail("expected ',' or ']' in array literal"));
                    }
                }
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, GraftError> {
        let quote = self.peek().expect("caller checked");
        self.pos += 1;
        match self.input[self.pos..].find(quote) {
            Some(len) => {
                let out = self.input[self.pos..self.pos + len].to_string();
                self.pos += len + 1;
                Ok(out)
            }
            None => Err(self.fail("unterminated string literal")),
        }
    }

    fn parse_number(&mut self) -> Result<Value, GraftError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        if seen_dot {
            let parsed: f64 = text
                .parse()
                .map_err(|_| self.fail("invalid number literal"))?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| self.fail("number literal is not finite"))
        } else {
            let parsed: i64 = text
                .parse()
                .map_err(|_| self.fail("invalid number literal"))?;
            Ok(Value::Number(parsed.into()))
        }
    }

    fn parse_path_or_keyword(&mut self) -> Result<Expr, GraftError> {
        let mut segments = Vec::new();
        loop {
            let start = self.pos;
            while let Some(c) = self.peek() {
                if !(c.is_alphanumeric() || c == '_' || c == '$') {
                    break;
                }
                self.pos += c.len_utf8();
            }
            if self.pos == start {
                return Err(self.fail("expected a name segment"));
            }
            segments.push(self.input[start..self.pos].to_string());
            if self.peek() == Some('.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if segments.len() == 1 {
            match segments[0].as_str() {
                "true" => return Ok(Expr::Lit(Value::Bool(true))),
                "false" => return Ok(Expr::Lit(Value::Bool(false))),
                "null" => return Ok(Expr::Lit(Value::Null)),
                _ => {}
            }
        }
        Ok(Expr::Path(segments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MapScope(Value);

    impl Scope for MapScope {
        fn lookup(&self, root: &str) -> Option<Value> {
            self.0.get(root).cloned()
        }
    }

    #[test]
    fn literal_booleans_and_numbers() {
        assert_eq!(Expr::parse_literal("true").unwrap(), json!(true));
        assert_eq!(Expr::parse_literal("false").unwrap(), json!(false));
        assert_eq!(Expr::parse_literal("35").unwrap(), json!(35));
        assert_eq!(Expr::parse_literal("-2.5").unwrap(), json!(-2.5));
    }

    #[test]
    fn literal_strings_and_arrays() {
        assert_eq!(Expr::parse_literal("'Lior'").unwrap(), json!("Lior"));
        assert_eq!(
            Expr::parse_literal("['Lior', 'Magali']").unwrap(),
            json!(["Lior", "Magali"])
        );
        assert_eq!(Expr::parse_literal("[]").unwrap(), json!([]));
    }

    #[test]
    fn path_is_not_a_literal() {
        assert!(Expr::parse_literal("count").is_err());
    }

    #[test]
    fn path_eval_against_scope() {
        let scope = MapScope(json!({
            "event": { "target": { "value": "4111", "name": "card" } }
        }));
        let expr = Expr::parse("event.target.value").unwrap();
        assert_eq!(expr.eval(&scope).unwrap(), json!("4111"));
    }

    #[test]
    fn path_eval_missing_segment_fails() {
        let scope = MapScope(json!({ "event": {} }));
        let expr = Expr::parse("event.target.value").unwrap();
        let err = expr.eval(&scope).unwrap_err();
        assert!(err.to_string().contains("event.target.value"));
    }

    #[test]
    fn parse_rejects_trailing_junk() {
        assert!(Expr::parse("1 + 2").is_err());
        assert!(Expr::parse("foo()").is_err());
        assert!(Expr::parse("[1,").is_err());
        assert!(Expr::parse("'open").is_err());
    }
}
