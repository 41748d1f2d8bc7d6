//! Generator arguments: a small closed value type with deterministic,
//! structural equality/hashing, plus a deterministic filesystem-safe
//! rendering used to mangle generator-call result names.

use arcstr::ArcStr;
use indexmap::IndexMap;

/// A generator argument value. Deliberately excludes floating point so that
/// `Eq`/`Hash` (needed for generator-call memoization) stay structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    Int(i64),
    Bool(bool),
    Str(ArcStr),
    List(Vec<Param>),
    Map(IndexMap<ArcStr, Param>),
}

impl Param {
    fn encode(&self) -> String {
        match self {
            Param::Int(i) => i.to_string(),
            Param::Bool(b) => b.to_string(),
            Param::Str(s) => s.to_string(),
            Param::List(items) => items.iter().map(Param::encode).collect::<Vec<_>>().join(","),
            Param::Map(m) => m
                .iter()
                .map(|(k, v)| format!("{k}={}", v.encode()))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Caps the literal rendering before we fall back to a hash, keeping the
/// overall mangled module name (which also carries the generator name and
/// flatname wrapping) well under the 511-character limit.
const MAX_ENCODED_LEN: usize = 400;

/// A deterministic, collision-resistant, filesystem-safe encoding of a
/// generator argument, used as the `"(...)"` suffix of a generated module's
/// name. Equal arguments always render identically.
pub fn unique_name(param: &Param) -> String {
    let raw = param.encode();
    if raw.len() > MAX_ENCODED_LEN {
        format!("h{}", blake3::hash(raw.as_bytes()).to_hex())
    } else {
        sanitize_filesystem_safe(&raw)
    }
}

fn sanitize_filesystem_safe(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        let c = b as char;
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '=') {
            out.push(c);
        } else {
            out.push_str(&format!("%{b:02x}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_renders_literally() {
        assert_eq!(unique_name(&Param::Int(3)), "3");
        assert_eq!(unique_name(&Param::Bool(true)), "true");
    }

    #[test]
    fn map_renders_as_key_value_pairs() {
        let mut m = IndexMap::new();
        m.insert(ArcStr::from("n"), Param::Int(3));
        assert_eq!(unique_name(&Param::Map(m)), "n=3");
    }

    #[test]
    fn distinct_arguments_produce_distinct_names() {
        let mut a = IndexMap::new();
        a.insert(ArcStr::from("n"), Param::Int(3));
        let mut b = IndexMap::new();
        b.insert(ArcStr::from("n"), Param::Int(4));
        assert_ne!(unique_name(&Param::Map(a)), unique_name(&Param::Map(b)));
    }

    #[test]
    fn equal_arguments_produce_equal_names() {
        let mut a = IndexMap::new();
        a.insert(ArcStr::from("n"), Param::Int(3));
        let mut b = IndexMap::new();
        b.insert(ArcStr::from("n"), Param::Int(3));
        assert_eq!(unique_name(&Param::Map(a)), unique_name(&Param::Map(b)));
    }

    #[test]
    fn oversized_argument_falls_back_to_hash() {
        let long = Param::Str(ArcStr::from("x".repeat(500)));
        let name = unique_name(&long);
        assert!(name.starts_with('h'));
        assert!(name.len() < MAX_ENCODED_LEN);
    }

    #[test]
    fn non_filesystem_safe_characters_are_escaped() {
        let name = unique_name(&Param::Str(ArcStr::from("a/b c")));
        assert!(!name.contains('/'));
        assert!(!name.contains(' '));
    }
}
