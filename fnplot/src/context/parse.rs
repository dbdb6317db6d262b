//! Parser for infix math expressions
//!
//! The grammar is the usual calculator notation:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | implicit)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | ident | ident '(' args ')' | '(' expr ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so `-x^2` is
//! `-(x^2)` and `2^3^2` is `2^9`.  Juxtaposition is multiplication when the
//! right-hand side starts with a name or a parenthesis (`2x`, `3(x + 1)`,
//! `(x - 1)(x + 1)`).
//!
//! Names are variables, except for the constants `pi` / `PI` and `e` / `E`.
//! A name followed by `(` is a function call; see [`FUNCTIONS`] for the
//! supported functions.
//!
//! ```
//! # use fnplot::context::Tree;
//! use fnplot::eval::{Bindings, Compiled, Evaluator};
//! let t = Tree::parse("2x^2 - sin(x)").unwrap();
//! let mut eval = Evaluator::new(Compiled::<f64>::from_tree(&t).unwrap());
//! let mut vars = Bindings::new();
//! vars.set("x", 0.0);
//! assert_eq!(eval.eval(&vars).unwrap(), 0.0);
//! ```
use crate::{Error, context::Tree};

/// Functions known to the parser, as `(name, argument count)`
///
/// `log` accepts either one argument (natural log) or two (`log(x, base)`).
pub const FUNCTIONS: &[(&str, usize)] = &[
    ("abs", 1),
    ("sqrt", 1),
    ("square", 1),
    ("exp", 1),
    ("ln", 1),
    ("log", 1),
    ("log10", 1),
    ("log2", 1),
    ("sin", 1),
    ("cos", 1),
    ("tan", 1),
    ("asin", 1),
    ("acos", 1),
    ("atan", 1),
    ("floor", 1),
    ("ceil", 1),
    ("sign", 1),
    ("min", 2),
    ("max", 2),
    ("pow", 2),
];

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Punct(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// Splits the input into `(token, byte offset)` pairs
fn tokenize(s: &str) -> Result<Vec<(Token, usize)>, Error> {
    let bytes = s.as_bytes();
    let mut out = vec![];
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == b'.' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.')
            {
                i += 1;
            }
            // Exponent, only if digits actually follow (so `2e` is `2 * e`)
            if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
                let mut j = i + 1;
                if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text = &s[start..i];
            let v = text.parse::<f64>().map_err(|_| Error::UnexpectedToken {
                token: text.to_owned(),
                offset: start,
            })?;
            out.push((Token::Number(v), start));
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
            {
                i += 1;
            }
            out.push((Token::Ident(s[start..i].to_owned()), start));
        } else if b"+-*/^(),".contains(&c) {
            out.push((Token::Punct(c as char), i));
            i += 1;
        } else {
            let ch = s[i..].chars().next().unwrap_or('?');
            return Err(Error::UnexpectedToken {
                token: ch.to_string(),
                offset: i,
            });
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Result<(Token, usize), Error> {
        let out = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        out.ok_or(Error::UnexpectedEnd)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), Error> {
        match self.next()? {
            (Token::Punct(p), _) if p == c => Ok(()),
            (t, offset) => Err(Error::UnexpectedToken {
                token: t.to_string(),
                offset,
            }),
        }
    }

    fn expr(&mut self) -> Result<Tree, Error> {
        let mut lhs = self.term()?;
        loop {
            if self.eat('+') {
                lhs = lhs + self.term()?;
            } else if self.eat('-') {
                lhs = lhs - self.term()?;
            } else {
                break Ok(lhs);
            }
        }
    }

    fn term(&mut self) -> Result<Tree, Error> {
        let mut lhs = self.unary()?;
        loop {
            if self.eat('*') {
                lhs = lhs * self.unary()?;
            } else if self.eat('/') {
                lhs = lhs / self.unary()?;
            } else if matches!(
                self.peek(),
                Some(Token::Ident(..) | Token::Punct('('))
            ) {
                lhs = lhs * self.power()?;
            } else {
                break Ok(lhs);
            }
        }
    }

    fn unary(&mut self) -> Result<Tree, Error> {
        if self.eat('-') {
            Ok(-self.unary()?)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<Tree, Error> {
        let base = self.primary()?;
        if self.eat('^') {
            let exp = self.unary()?;
            Ok(base.pow(exp))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<Tree, Error> {
        match self.next()? {
            (Token::Number(v), _) => Ok(Tree::constant(v)),
            (Token::Punct('('), _) => {
                let out = self.expr()?;
                self.expect(')')?;
                Ok(out)
            }
            (Token::Ident(name), _) if self.eat('(') => {
                let mut args = vec![];
                if !self.eat(')') {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(')') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                call(&name, args)
            }
            (Token::Ident(name), _) => Ok(match name.as_str() {
                "pi" | "PI" => Tree::constant(std::f64::consts::PI),
                "e" | "E" => Tree::constant(std::f64::consts::E),
                _ => Tree::var(&name),
            }),
            (t, offset) => Err(Error::UnexpectedToken {
                token: t.to_string(),
                offset,
            }),
        }
    }
}

/// Builds a function call node, checking arity
fn call(name: &str, args: Vec<Tree>) -> Result<Tree, Error> {
    let Some((_, expected)) = FUNCTIONS.iter().find(|(n, _)| *n == name)
    else {
        return Err(Error::UnknownFunction(name.to_owned()));
    };
    if name == "log" && args.len() == 2 {
        return Ok(args[0].ln() / args[1].ln());
    }
    if args.len() != *expected {
        return Err(Error::BadArity {
            name: name.to_owned(),
            expected: *expected,
            got: args.len(),
        });
    }
    let a = &args[0];
    Ok(match name {
        "abs" => a.abs(),
        "sqrt" => a.sqrt(),
        "square" => a.square(),
        "exp" => a.exp(),
        "ln" | "log" => a.ln(),
        "log10" => a.log10(),
        "log2" => a.log2(),
        "sin" => a.sin(),
        "cos" => a.cos(),
        "tan" => a.tan(),
        "asin" => a.asin(),
        "acos" => a.acos(),
        "atan" => a.atan(),
        "floor" => a.floor(),
        "ceil" => a.ceil(),
        "sign" => a.sign(),
        "min" => a.min(args[1].clone()),
        "max" => a.max(args[1].clone()),
        "pow" => a.pow(args[1].clone()),
        _ => return Err(Error::UnknownFunction(name.to_owned())),
    })
}

/// Parses an expression from text into a [`Tree`]
pub fn parse(s: &str) -> Result<Tree, Error> {
    let tokens = tokenize(s)?;
    let mut p = Parser { tokens, pos: 0 };
    let out = p.expr()?;
    match p.tokens.get(p.pos) {
        None => Ok(out),
        Some((t, offset)) => Err(Error::UnexpectedToken {
            token: t.to_string(),
            offset: *offset,
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eval::{Bindings, Compiled, Evaluator};
    use approx::assert_relative_eq;

    fn eval_with(s: &str, vars: &[(&str, f64)]) -> f64 {
        let t = parse(s).unwrap();
        let mut eval = Evaluator::new(Compiled::<f64>::from_tree(&t).unwrap());
        let mut b = Bindings::new();
        for (k, v) in vars {
            b.set(k, *v);
        }
        eval.eval(&b).unwrap()
    }

    fn eval(s: &str, x: f64) -> f64 {
        eval_with(s, &[("x", x)])
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval("-x^2", 3.0), -9.0);
        assert_eq!(eval("2^-1", 0.0), 0.5);
        assert_eq!(eval("8 / 4 / 2", 0.0), 1.0);
        assert_eq!(eval("1 - 2 - 3", 0.0), -4.0);
    }

    #[test]
    fn implicit_mul() {
        assert_eq!(eval("2x", 3.0), 6.0);
        assert_eq!(eval("2x^2", 3.0), 18.0);
        assert_eq!(eval("3(x + 1)", 1.0), 6.0);
        assert_eq!(eval("(x - 1)(x + 1)", 3.0), 8.0);
        assert_eq!(eval("2 pi", 0.0), 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn numbers() {
        assert_eq!(eval("1e3", 0.0), 1000.0);
        assert_eq!(eval("2.5E-1", 0.0), 0.25);
        assert_eq!(eval(".5", 0.0), 0.5);
        assert_eq!(eval("2e", 0.0), 2.0 * std::f64::consts::E);
    }

    #[test]
    fn functions() {
        assert_eq!(eval("sqrt(x)", 16.0), 4.0);
        assert_eq!(eval("max(x, 2)", 1.0), 2.0);
        assert_eq!(eval("min(x, 2)", 1.0), 1.0);
        assert_eq!(eval("pow(x, 3)", 2.0), 8.0);
        assert_eq!(eval("abs(x)", -2.0), 2.0);
        assert_eq!(eval("sign(x)", 0.0), 0.0);
        assert_relative_eq!(eval("log(x, 2)", 8.0), 3.0);
        assert_relative_eq!(eval("log10(x)", 1000.0), 3.0);
        assert_eq!(eval("floor(x)", 1.5), 1.0);
        assert_eq!(eval("ceil(x)", 1.5), 2.0);
    }

    #[test]
    fn variables() {
        let vars = [("m", 2.0), ("x", 3.0), ("x0", 1.0), ("y0", 5.0)];
        assert_eq!(eval_with("m * (x - x0) + y0", &vars), 9.0);
    }

    #[test]
    fn errors() {
        assert_eq!(parse(""), Err(Error::UnexpectedEnd));
        assert_eq!(parse("1 +"), Err(Error::UnexpectedEnd));
        assert_eq!(
            parse("foo(x)"),
            Err(Error::UnknownFunction("foo".to_owned()))
        );
        assert_eq!(
            parse("sin(x, y)"),
            Err(Error::BadArity {
                name: "sin".to_owned(),
                expected: 1,
                got: 2
            })
        );
        assert_eq!(
            parse("x $ 2"),
            Err(Error::UnexpectedToken {
                token: "$".to_owned(),
                offset: 2
            })
        );
        assert_eq!(parse("(x + 1"), Err(Error::UnexpectedEnd));
        assert_eq!(
            parse("x)"),
            Err(Error::UnexpectedToken {
                token: ")".to_owned(),
                offset: 1
            })
        );
    }
}
