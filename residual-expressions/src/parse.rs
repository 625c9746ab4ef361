use crate::{Expression, ParseError};
use proc_macro2::Ident;
use syn::parse::{Parse, ParseStream};
use syn::{parenthesized, Token};

/// Syntax tree of a pattern, before names are bound to expressions.
///
/// Grammar, loosest binding first:
/// * `a | b` alternation (left-associative)
/// * `a & b`, `a - b` intersection and difference (left-associative)
/// * `a b` concatenation
/// * `~a` complement
/// * `a*`, `a+`, `a?` repetition
/// * `0` (fail), `e` (accept), `_` (any element), names and parenthesized patterns
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pattern {
    Fail,
    Accept,
    Any,
    Name(Ident),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
    Optional(Box<Pattern>),
    Complement(Box<Pattern>),
    Concat(Box<Pattern>, Box<Pattern>),
    Alternate(Box<Pattern>, Box<Pattern>),
    Intersect(Box<Pattern>, Box<Pattern>),
    Difference(Box<Pattern>, Box<Pattern>),
}

impl Parse for Pattern {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        parse_alternate(input)
    }
}

fn parse_alternate(input: ParseStream) -> syn::Result<Pattern> {
    let mut left = parse_intersect(input)?;
    while input.peek(Token![|]) {
        input.parse::<Token![|]>()?;
        let right = parse_intersect(input)?;
        left = Pattern::Alternate(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_intersect(input: ParseStream) -> syn::Result<Pattern> {
    let mut left = parse_concat(input)?;
    loop {
        if input.peek(Token![&]) {
            input.parse::<Token![&]>()?;
            let right = parse_concat(input)?;
            left = Pattern::Intersect(Box::new(left), Box::new(right));
        } else if input.peek(Token![-]) {
            input.parse::<Token![-]>()?;
            let right = parse_concat(input)?;
            left = Pattern::Difference(Box::new(left), Box::new(right));
        } else {
            return Ok(left);
        }
    }
}

fn starts_operand(input: ParseStream) -> bool {
    input.peek(syn::token::Paren)
        || input.peek(syn::Ident)
        || input.peek(syn::LitInt)
        || input.peek(Token![_])
        || input.peek(Token![~])
}

fn parse_concat(input: ParseStream) -> syn::Result<Pattern> {
    let mut left = parse_prefix(input)?;
    while starts_operand(input) {
        let right = parse_prefix(input)?;
        left = Pattern::Concat(Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_prefix(input: ParseStream) -> syn::Result<Pattern> {
    if input.peek(Token![~]) {
        input.parse::<Token![~]>()?;
        return Ok(Pattern::Complement(Box::new(parse_prefix(input)?)));
    }
    parse_postfix(input)
}

fn parse_postfix(input: ParseStream) -> syn::Result<Pattern> {
    let mut atom = parse_atom(input)?;
    loop {
        if input.peek(Token![*]) {
            input.parse::<Token![*]>()?;
            atom = Pattern::Star(Box::new(atom));
        } else if input.peek(Token![+]) {
            input.parse::<Token![+]>()?;
            atom = Pattern::Plus(Box::new(atom));
        } else if input.peek(Token![?]) {
            input.parse::<Token![?]>()?;
            atom = Pattern::Optional(Box::new(atom));
        } else {
            return Ok(atom);
        }
    }
}

fn parse_atom(input: ParseStream) -> syn::Result<Pattern> {
    let lookahead = input.lookahead1();

    // Rust performs parenthesis matching: leverage that here.
    if lookahead.peek(syn::token::Paren) {
        let inner;
        parenthesized!(inner in input);
        return inner.parse();
    }

    if lookahead.peek(syn::LitInt) {
        let val = input.parse::<syn::LitInt>()?;
        return match val.base10_parse::<u64>() {
            Ok(0) => Ok(Pattern::Fail),
            _ => Err(syn::Error::new(val.span(), "only `0` is a valid number in a pattern")),
        };
    }

    if lookahead.peek(Token![_]) {
        input.parse::<Token![_]>()?;
        return Ok(Pattern::Any);
    }

    if lookahead.peek(syn::Ident) {
        let name = input.parse::<Ident>()?;
        return if name == "e" {
            Ok(Pattern::Accept)
        } else {
            Ok(Pattern::Name(name))
        };
    }

    Err(lookahead.error())
}

impl Pattern {
    /// Builds an expression, asking `resolve` for the expression behind every name.
    pub fn bind<T>(
        &self,
        mut resolve: impl FnMut(&str) -> Option<Expression<T>>,
    ) -> Result<Expression<T>, ParseError> {
        self.bind_with(&mut resolve)
    }

    fn bind_with<T>(
        &self,
        resolve: &mut dyn FnMut(&str) -> Option<Expression<T>>,
    ) -> Result<Expression<T>, ParseError> {
        Ok(match self {
            Pattern::Fail => Expression::fail(),
            Pattern::Accept => Expression::accept(),
            Pattern::Any => Expression::any(),
            Pattern::Name(name) => {
                let name = name.to_string();
                match resolve(&name) {
                    Some(expr) => expr,
                    None => return Err(ParseError::Unbound(name)),
                }
            }
            Pattern::Star(p) => p.bind_with(resolve)?.star(),
            Pattern::Plus(p) => p.bind_with(resolve)?.plus(),
            Pattern::Optional(p) => p.bind_with(resolve)?.optional(),
            Pattern::Complement(p) => p.bind_with(resolve)?.complement(),
            Pattern::Concat(l, r) => l.bind_with(resolve)?.concat(r.bind_with(resolve)?),
            Pattern::Alternate(l, r) => l.bind_with(resolve)?.alternate(r.bind_with(resolve)?),
            Pattern::Intersect(l, r) => l.bind_with(resolve)?.intersect(r.bind_with(resolve)?),
            Pattern::Difference(l, r) => l.bind_with(resolve)?.difference(r.bind_with(resolve)?),
        })
    }

    /// Names used in this pattern, in order of first appearance.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.search_names(&mut names);
        names
    }

    fn search_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Fail | Pattern::Accept | Pattern::Any => {}
            Pattern::Name(name) => {
                let name = name.to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Pattern::Star(p) | Pattern::Plus(p) | Pattern::Optional(p) | Pattern::Complement(p) => {
                p.search_names(names)
            }
            Pattern::Concat(l, r)
            | Pattern::Alternate(l, r)
            | Pattern::Intersect(l, r)
            | Pattern::Difference(l, r) => {
                l.search_names(names);
                r.search_names(names);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{parse_pattern, Expression, ParseError, Pattern, Pattern::*, Predicate};
    use pretty_assertions::assert_eq;
    use proc_macro2::{Ident, Span};

    fn name(n: &str) -> Box<Pattern> {
        Box::new(Name(Ident::new(n, Span::call_site())))
    }

    #[test]
    fn test_symbols() {
        assert_eq!(parse_pattern("A").unwrap(), *name("A"));
        assert_eq!(parse_pattern("CamelCase").unwrap(), *name("CamelCase"));
        assert_eq!(parse_pattern("0").unwrap(), Fail);
        assert_eq!(parse_pattern("e").unwrap(), Accept);
        assert_eq!(parse_pattern("_").unwrap(), Any);
    }

    #[test]
    fn test_operators() {
        assert_eq!(parse_pattern("A*").unwrap(), Star(name("A")));
        assert_eq!(parse_pattern("A+").unwrap(), Plus(name("A")));
        assert_eq!(parse_pattern("A?").unwrap(), Optional(name("A")));
        assert_eq!(parse_pattern("~A").unwrap(), Complement(name("A")));
        assert_eq!(parse_pattern("A B").unwrap(), Concat(name("A"), name("B")));
        assert_eq!(parse_pattern("A | B").unwrap(), Alternate(name("A"), name("B")));
        assert_eq!(parse_pattern("A & B").unwrap(), Intersect(name("A"), name("B")));
        assert_eq!(parse_pattern("A - B").unwrap(), Difference(name("A"), name("B")));
    }

    #[test]
    fn test_disambiguation() {
        // or left-associative
        assert_eq!(
            parse_pattern("A | B | C").unwrap(),
            Alternate(Box::new(Alternate(name("A"), name("B"))), name("C"))
        );

        // closure < concat
        assert_eq!(
            parse_pattern("A B*").unwrap(),
            Concat(name("A"), Box::new(Star(name("B"))))
        );

        // nested post-fix operators
        assert_eq!(
            parse_pattern("A*?+").unwrap(),
            parse_pattern("((A*)?)+").unwrap()
        );

        // not & closure < or
        assert_eq!(
            parse_pattern("~A | B*").unwrap(),
            Alternate(Box::new(Complement(name("A"))), Box::new(Star(name("B"))))
        );

        // and < or
        assert_eq!(
            parse_pattern("~A | B* & C?").unwrap(),
            parse_pattern("(~A) | ((B*) & C?)").unwrap()
        );

        // complement binds tighter than concat, looser than closure
        assert_eq!(
            parse_pattern("~A* B").unwrap(),
            parse_pattern("(~(A*)) B").unwrap()
        );

        // difference is left-associative, at the level of and
        assert_eq!(
            parse_pattern("A - B & C").unwrap(),
            parse_pattern("(A - B) & C").unwrap()
        );
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_pattern("1"), Err(ParseError::Parse(_))));
        assert!(matches!(parse_pattern("A |"), Err(ParseError::Parse(_))));
        assert!(matches!(parse_pattern("A )"), Err(ParseError::Lex(_))));
    }

    #[test]
    fn test_bind() {
        let a = Expression::literal(Predicate::equal_to('a'));
        let b = Expression::literal(Predicate::equal_to('b'));

        let pattern = parse_pattern("_* a (b | e)").unwrap();
        assert_eq!(pattern.names(), vec!["a", "b"]);

        let expr = pattern
            .bind(|n| match n {
                "a" => Some(a.clone()),
                "b" => Some(b.clone()),
                _ => None,
            })
            .unwrap();

        assert!(expr.matches("xxa".chars()));
        assert!(expr.matches("xab".chars()));
        assert!(!expr.matches("xabb".chars()));

        let err = parse_pattern("a c").unwrap().bind(|n| (n == "a").then(|| a.clone()));
        assert!(matches!(err, Err(ParseError::Unbound(n)) if n == "c"));
    }
}
