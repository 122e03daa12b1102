//! Term reader and printer for the stub backend.
//!
//! The surface is the prefix fragment shared by the solver's native syntax
//! and SMT-LIB 2 term bodies: `(and p (not q))`, `(<= x 3)`, `(f x 1/2)`.
//! Printing and reading are inverse up to interning, so
//! `parse(print(t)) == t` holds pointer-for-pointer.

use super::state::{EnvData, TermData, TermKind, TypeKind};

pub(crate) fn print_term(t: *mut TermData) -> String {
    unsafe {
        match &(*t).kind {
            TermKind::True => "true".to_string(),
            TermKind::False => "false".to_string(),
            TermKind::Number(s) => s.clone(),
            TermKind::Constant(d) => (**d).name.clone(),
            TermKind::Not(a) => format!("(not {})", print_term(*a)),
            TermKind::And(a, b) => format!("(and {} {})", print_term(*a), print_term(*b)),
            TermKind::Or(a, b) => format!("(or {} {})", print_term(*a), print_term(*b)),
            TermKind::Iff(a, b) => format!("(iff {} {})", print_term(*a), print_term(*b)),
            TermKind::Eq(a, b) => format!("(= {} {})", print_term(*a), print_term(*b)),
            TermKind::Leq(a, b) => format!("(<= {} {})", print_term(*a), print_term(*b)),
            TermKind::Plus(a, b) => format!("(+ {} {})", print_term(*a), print_term(*b)),
            TermKind::Times(a, b) => format!("(* {} {})", print_term(*a), print_term(*b)),
            TermKind::Floor(a) => format!("(floor {})", print_term(*a)),
            TermKind::Ite(c, t, e) => format!(
                "(ite {} {} {})",
                print_term(*c),
                print_term(*t),
                print_term(*e)
            ),
            TermKind::Apply(d, args) => {
                let mut out = format!("({}", (**d).name);
                for a in args {
                    out.push(' ');
                    out.push_str(&print_term(*a));
                }
                out.push(')');
                out
            }
        }
    }
}

pub(crate) fn is_numeral(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let (num, den) = match body.split_once('/') {
        Some((n, d)) => (n, Some(d)),
        None => (body, None),
    };
    let digits = |t: &str| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit());
    digits(num)
        && match den {
            Some(d) => digits(d) && d.bytes().any(|b| b != b'0'),
            None => true,
        }
}

#[derive(Debug, PartialEq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut toks = Vec::new();
    let mut atom = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !atom.is_empty() {
                    toks.push(Token::Atom(std::mem::take(&mut atom)));
                }
                toks.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    toks.push(Token::Atom(std::mem::take(&mut atom)));
                }
            }
            c => atom.push(c),
        }
    }
    if !atom.is_empty() {
        toks.push(Token::Atom(atom));
    }
    if toks.is_empty() {
        return Err("empty input".to_string());
    }
    Ok(toks)
}

pub(crate) fn parse_term(env: &mut EnvData, text: &str) -> Result<*mut TermData, String> {
    let toks = tokenize(text)?;
    let mut pos = 0;
    let term = parse_expr(env, &toks, &mut pos)?;
    if pos != toks.len() {
        return Err("trailing input after term".to_string());
    }
    Ok(term)
}

fn parse_atom(env: &mut EnvData, s: &str) -> Result<*mut TermData, String> {
    match s {
        "true" => Ok(env.intern_term(TermKind::True)),
        "false" => Ok(env.intern_term(TermKind::False)),
        _ if is_numeral(s) => Ok(env.intern_term(TermKind::Number(s.to_string()))),
        _ => {
            let decl = *env
                .decls_by_name
                .get(s)
                .ok_or_else(|| format!("undeclared symbol `{}`", s))?;
            let arity = match unsafe { &(*(*decl).ty).kind } {
                TypeKind::Function { params, .. } => params.len(),
                _ => 0,
            };
            if arity != 0 {
                return Err(format!("symbol `{}` expects {} arguments", s, arity));
            }
            Ok(env.intern_term(TermKind::Constant(decl)))
        }
    }
}

fn parse_expr(
    env: &mut EnvData,
    toks: &[Token],
    pos: &mut usize,
) -> Result<*mut TermData, String> {
    match toks.get(*pos) {
        Some(Token::Atom(s)) => {
            *pos += 1;
            parse_atom(env, s)
        }
        Some(Token::Open) => {
            *pos += 1;
            let head = match toks.get(*pos) {
                Some(Token::Atom(s)) => s.clone(),
                _ => return Err("expected operator after `(`".to_string()),
            };
            *pos += 1;
            let mut args = Vec::new();
            loop {
                match toks.get(*pos) {
                    Some(Token::Close) => {
                        *pos += 1;
                        break;
                    }
                    Some(_) => args.push(parse_expr(env, toks, pos)?),
                    None => return Err("unbalanced `(`".to_string()),
                }
            }
            build(env, &head, args)
        }
        Some(Token::Close) => Err("unexpected `)`".to_string()),
        None => Err("unexpected end of input".to_string()),
    }
}

fn build(
    env: &mut EnvData,
    head: &str,
    args: Vec<*mut TermData>,
) -> Result<*mut TermData, String> {
    let want = |n: usize| -> Result<(), String> {
        if args.len() == n {
            Ok(())
        } else {
            Err(format!("`{}` expects {} arguments, got {}", head, n, args.len()))
        }
    };
    let kind = match head {
        "not" => {
            want(1)?;
            TermKind::Not(args[0])
        }
        "floor" => {
            want(1)?;
            TermKind::Floor(args[0])
        }
        "and" => {
            want(2)?;
            TermKind::And(args[0], args[1])
        }
        "or" => {
            want(2)?;
            TermKind::Or(args[0], args[1])
        }
        "iff" => {
            want(2)?;
            TermKind::Iff(args[0], args[1])
        }
        "=" => {
            want(2)?;
            TermKind::Eq(args[0], args[1])
        }
        "<=" => {
            want(2)?;
            TermKind::Leq(args[0], args[1])
        }
        "+" => {
            want(2)?;
            TermKind::Plus(args[0], args[1])
        }
        "*" => {
            want(2)?;
            TermKind::Times(args[0], args[1])
        }
        "ite" => {
            want(3)?;
            TermKind::Ite(args[0], args[1], args[2])
        }
        name => {
            let decl = *env
                .decls_by_name
                .get(name)
                .ok_or_else(|| format!("undeclared symbol `{}`", name))?;
            let arity = match unsafe { &(*(*decl).ty).kind } {
                TypeKind::Function { params, .. } => params.len(),
                _ => 0,
            };
            if arity != args.len() {
                return Err(format!(
                    "symbol `{}` expects {} arguments, got {}",
                    name,
                    arity,
                    args.len()
                ));
            }
            TermKind::Apply(decl, args)
        }
    };
    Ok(env.intern_term(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeral_shapes() {
        assert!(is_numeral("0"));
        assert!(is_numeral("-12"));
        assert!(is_numeral("7/9"));
        assert!(!is_numeral("7/0"));
        assert!(!is_numeral("1.5"));
        assert!(!is_numeral("x"));
        assert!(!is_numeral(""));
    }

    #[test]
    fn test_parse_print_inverse() {
        let mut env = EnvData::new();
        let bool_ty = env.bool_type();
        env.declare("p", bool_ty).unwrap();
        let t = parse_term(&mut env, "(and p (not false))").unwrap();
        assert_eq!(print_term(t), "(and p (not false))");
        let again = parse_term(&mut env, "(and p (not false))").unwrap();
        assert_eq!(t, again);
    }

    #[test]
    fn test_parse_rejects_unbalanced() {
        let mut env = EnvData::new();
        assert!(parse_term(&mut env, "(and true").is_err());
        assert!(parse_term(&mut env, ")").is_err());
        assert!(parse_term(&mut env, "true false").is_err());
    }
}
