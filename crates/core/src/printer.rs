//! Value printing
//!
//! `pr_str` renders a value readably (strings quoted, chars named) or
//! plainly (`str` style). `Display` on `Value` uses the plain form.
//! Printing a lazy sequence realizes it.

use crate::coll::seq;
use crate::value::Value;
use std::fmt::Write;

pub fn pr_str(v: &Value, readably: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, v, readably);
    out
}

fn write_value(out: &mut String, v: &Value, readably: bool) {
    match v {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => write_float(out, *f),
        Value::Char(c) => write_char(out, *c, readably),
        Value::Str(s) => {
            if readably {
                write_string_readably(out, s);
            } else {
                out.push_str(s);
            }
        }
        Value::Keyword(k) => {
            let _ = write!(out, "{k}");
        }
        Value::Symbol(s) => {
            let _ = write!(out, "{s}");
        }
        Value::BigInt(b) => {
            let _ = write!(out, "{b}N");
        }
        Value::BigDec(d) => {
            let _ = write!(out, "{d}M");
        }
        Value::Ratio(r) => {
            let _ = write!(out, "{}/{}", r.numer(), r.denom());
        }
        Value::Vector(vec) => {
            out.push('[');
            for (i, e) in vec.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, e, readably);
            }
            out.push(']');
        }
        Value::List(_) | Value::Cons(_) | Value::LazySeq(_) | Value::ChunkedCons(_) => {
            let items = seq::to_vec(v).unwrap_or_default();
            out.push('(');
            for (i, e) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, e, readably);
            }
            out.push(')');
        }
        Value::Map(m) => {
            write_map(out, m.iter().map(|(k, w)| (k, w)), readably);
        }
        Value::HashMap(m) => {
            write_map(out, m.iter(), readably);
        }
        Value::Set(s) => {
            out.push_str("#{");
            for (i, e) in s.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, e, readably);
            }
            out.push('}');
        }
        Value::Array(a) => {
            let _ = write!(out, "#<array[{}]>", a.len());
        }
        Value::Atom(a) => {
            out.push_str("#<Atom ");
            write_value(out, &a.deref(), readably);
            out.push('>');
        }
        Value::Volatile(vol) => {
            out.push_str("#<Volatile ");
            write_value(out, &vol.deref(), readably);
            out.push('>');
        }
        Value::Var(var) => {
            let _ = write!(out, "#'{}", var.qualified_name());
        }
        Value::Delay(d) => {
            if d.is_realized() {
                out.push_str("#<Delay realized>");
            } else {
                out.push_str("#<Delay pending>");
            }
        }
        Value::Future(f) => {
            let _ = write!(
                out,
                "#<Future {}>",
                if f.is_done() { "done" } else { "pending" }
            );
        }
        Value::Promise(p) => {
            let _ = write!(
                out,
                "#<Promise {}>",
                if p.is_realized() { "delivered" } else { "pending" }
            );
        }
        Value::Agent(a) => {
            out.push_str("#<Agent ");
            write_value(out, &a.deref(), readably);
            out.push('>');
        }
        Value::Reduced(inner) => {
            out.push_str("#<Reduced ");
            write_value(out, inner, readably);
            out.push('>');
        }
        Value::TransientVector(_) => out.push_str("#<transient-vector>"),
        Value::TransientMap(_) => out.push_str("#<transient-map>"),
        Value::TransientSet(_) => out.push_str("#<transient-set>"),
        Value::Fn(f) => {
            let _ = write!(out, "#<Fn {}>", f.name.as_deref().unwrap_or("anonymous"));
        }
        Value::Builtin(b) => {
            let _ = write!(out, "#<Builtin {}>", b.name);
        }
        Value::MultiFn(m) => {
            let _ = write!(out, "#<MultiFn {}>", m.name);
        }
    }
}

fn write_map<'a>(
    out: &mut String,
    entries: impl Iterator<Item = (&'a Value, &'a Value)>,
    readably: bool,
) {
    out.push('{');
    for (i, (k, v)) in entries.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_value(out, k, readably);
        out.push(' ');
        write_value(out, v, readably);
    }
    out.push('}');
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("##NaN");
    } else if f == f64::INFINITY {
        out.push_str("##Inf");
    } else if f == f64::NEG_INFINITY {
        out.push_str("##-Inf");
    } else {
        let s = format!("{f}");
        out.push_str(&s);
        // Floats always show a decimal point so they read back as floats.
        if !s.contains('.') && !s.contains('e') && !s.contains('E') {
            out.push_str(".0");
        }
    }
}

fn write_char(out: &mut String, c: char, readably: bool) {
    if !readably {
        out.push(c);
        return;
    }
    match c {
        '\n' => out.push_str("\\newline"),
        ' ' => out.push_str("\\space"),
        '\t' => out.push_str("\\tab"),
        '\r' => out.push_str("\\return"),
        '\u{8}' => out.push_str("\\backspace"),
        '\u{c}' => out.push_str("\\formfeed"),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

fn write_string_readably(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&pr_str(self, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_rational::BigRational;

    #[test]
    fn test_scalars() {
        assert_eq!(pr_str(&Value::Nil, true), "nil");
        assert_eq!(pr_str(&Value::Int(42), true), "42");
        assert_eq!(pr_str(&Value::Float(1.0), true), "1.0");
        assert_eq!(pr_str(&Value::Float(1.5), true), "1.5");
        assert_eq!(pr_str(&Value::Float(f64::NAN), true), "##NaN");
        assert_eq!(pr_str(&Value::keyword(Some("a"), "b"), true), ":a/b");
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(pr_str(&Value::string("a\"b"), true), "\"a\\\"b\"");
        assert_eq!(pr_str(&Value::string("ab"), false), "ab");
        assert_eq!(pr_str(&Value::Char('x'), true), "\\x");
        assert_eq!(pr_str(&Value::Char('\n'), true), "\\newline");
        assert_eq!(pr_str(&Value::Char('x'), false), "x");
    }

    #[test]
    fn test_numeric_suffixes() {
        assert_eq!(pr_str(&Value::big_int(BigInt::from(7)), true), "7N");
        assert_eq!(
            pr_str(
                &Value::ratio(BigRational::new(BigInt::from(10), BigInt::from(3))),
                true
            ),
            "10/3"
        );
    }

    #[test]
    fn test_collections() {
        let v = Value::vector(vec![Value::Int(1), Value::string("x")]);
        assert_eq!(pr_str(&v, true), "[1 \"x\"]");

        let l = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(pr_str(&l, true), "(1 2)");

        let m = Value::array_map(vec![(Value::keyword(None, "a"), Value::Int(1))]);
        assert_eq!(pr_str(&m, true), "{:a 1}");

        let s = Value::set(vec![Value::Int(1)]);
        assert_eq!(pr_str(&s, true), "#{1}");
    }

    #[test]
    fn test_lazy_seq_prints_realized() {
        let ls = Value::lazy_seq(Value::fn_val(None, |_| {
            Ok(Value::list(vec![Value::Int(1), Value::Int(2)]))
        }));
        assert_eq!(pr_str(&ls, true), "(1 2)");
    }

    #[test]
    fn test_refs() {
        let a = crate::refs::atom::Atom::new_value(Value::Int(3));
        assert_eq!(pr_str(&a, true), "#<Atom 3>");
    }
}
