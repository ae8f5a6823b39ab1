//! Per-command engine flags and their flattening into argument lists.
//!
//! Options live in three scopes (global, backend, location). Each scope maps
//! a bucket key, either [`ALL_SCOPE`] or a command name, to an [`OptionMap`]
//! of flag name to [`OptionValue`].

use crate::config::backend::Backend;
use crate::config::location::Location;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Formatter;
use std::result;

/// Bucket applied to every command.
pub const ALL_SCOPE: &str = "all";

/// Flag name to value, in the order the flags were written.
pub type OptionMap = IndexMap<String, OptionValue>;
pub type Options = IndexMap<String, OptionMap>;

/// A single flag value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionScalar {
    /// Presence-only flag. `false` suppresses the flag entirely.
    Flag(bool),
    /// Flag followed by a value token. Numbers are kept as their text.
    Value(String),
}

/// What a flag name maps to in the config file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Flag(bool),
    Value(String),
    /// Repeatable flag, emitted once per item in order.
    Repeated(Vec<OptionScalar>),
}

impl OptionScalar {
    fn append_to(&self, flag: &str, args: &mut Vec<String>) {
        match self {
            OptionScalar::Flag(true) => args.push(flag.to_owned()),
            OptionScalar::Flag(false) => {}
            OptionScalar::Value(value) => args.extend([flag.to_owned(), value.clone()]),
        }
    }
}

impl OptionValue {
    pub fn append_to(&self, flag: &str, args: &mut Vec<String>) {
        match self {
            OptionValue::Flag(b) => OptionScalar::Flag(*b).append_to(flag, args),
            OptionValue::Value(v) => OptionScalar::Value(v.clone()).append_to(flag, args),
            OptionValue::Repeated(items) => items.iter().for_each(|i| i.append_to(flag, args)),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_owned())
    }
}

impl<const N: usize> From<[&str; N]> for OptionValue {
    fn from(values: [&str; N]) -> Self {
        Self::Repeated(
            values
                .into_iter()
                .map(|v| OptionScalar::Value(v.to_owned()))
                .collect(),
        )
    }
}

/// Long-flag form: `--name` unless the name already starts with a dash.
pub fn flag_name(option: &str) -> String {
    if option.starts_with('-') {
        option.to_owned()
    } else {
        format!("--{option}")
    }
}

pub fn append_option_map(args: &mut Vec<String>, options: &OptionMap) {
    for (key, value) in options {
        value.append_to(&flag_name(key), args);
    }
}

/// Flags of one scope for `command`: the `all` bucket first, then the command bucket.
///
/// An empty command, or `command == "all"`, yields the `all` bucket once.
pub fn scope_args(options: &Options, command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let command = Some(command).filter(|c| !c.is_empty() && *c != ALL_SCOPE);
    for key in std::iter::once(ALL_SCOPE).chain(command) {
        if let Some(map) = options.get(key) {
            append_option_map(&mut args, map);
        }
    }
    args
}

/// Flattens global, backend and location options for `command`, in that order.
///
/// The engine applies last-flag-wins, so location flags override backend
/// flags which override global ones.
pub fn combine(command: &str, global: &Options, location: &Location, backend: &Backend) -> Vec<String> {
    let mut args = scope_args(global, command);
    args.extend(scope_args(backend.options(), command));
    args.extend(scope_args(location.options(), command));
    tracing::debug!(
        "Resolved {} option tokens for {:?} on location {:?} / backend {:?}",
        args.len(),
        command,
        location.name(),
        backend.name()
    );
    args
}

impl Serialize for OptionScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        match self {
            OptionScalar::Flag(b) => serializer.serialize_bool(*b),
            OptionScalar::Value(v) => serializer.serialize_str(v),
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        match self {
            OptionValue::Flag(b) => serializer.serialize_bool(*b),
            OptionValue::Value(v) => serializer.serialize_str(v),
            OptionValue::Repeated(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct OptionScalarVisitor;

impl Visitor<'_> for OptionScalarVisitor {
    type Value = OptionScalar;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a boolean, number or string")
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> result::Result<Self::Value, E> {
        Ok(OptionScalar::Flag(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> result::Result<Self::Value, E> {
        Ok(OptionScalar::Value(v.to_string()))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> result::Result<Self::Value, E> {
        Ok(OptionScalar::Value(v.to_string()))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> result::Result<Self::Value, E> {
        Ok(OptionScalar::Value(v.to_string()))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> result::Result<Self::Value, E> {
        Ok(OptionScalar::Value(v.to_owned()))
    }
}

impl<'de> Deserialize<'de> for OptionScalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_any(OptionScalarVisitor)
    }
}

struct OptionValueVisitor;

impl<'de> Visitor<'de> for OptionValueVisitor {
    type Value = OptionValue;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a boolean, number, string or a list of those")
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Flag(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Value(v.to_string()))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Value(v.to_string()))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Value(v.to_string()))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> result::Result<Self::Value, E> {
        Ok(OptionValue::Value(v.to_owned()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> result::Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        while let Some(item) = seq.next_element::<OptionScalar>()? {
            items.push(item);
        }
        Ok(OptionValue::Repeated(items))
    }
}

impl<'de> Deserialize<'de> for OptionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        deserializer.deserialize_any(OptionValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(yaml: &str) -> Options {
        serde_yml::from_str(yaml).unwrap()
    }

    fn location_with(opts: Options) -> Location {
        Location::builder()
            .from(vec!["/data".to_owned()])
            .to(vec!["nas".into()])
            .options(opts)
            .build()
    }

    fn backend_with(opts: Options) -> Backend {
        Backend::builder()
            .backend_type("local")
            .path("/backup")
            .options(opts)
            .build()
    }

    #[test]
    fn test_scope_priority_order() {
        let global = options("all: {x: [1]}");
        let backend = backend_with(options("all: {x: [2]}"));
        let location = location_with(options("all: {x: [3]}"));

        assert_eq!(
            combine("cmd", &global, &location, &backend),
            vec!["--x", "1", "--x", "2", "--x", "3"]
        );
    }

    #[test]
    fn test_boolean_values() {
        let global = options("all: {q: true, verbose: false}");
        let backend = backend_with(Options::new());
        let location = location_with(Options::new());

        assert_eq!(combine("backup", &global, &location, &backend), vec!["--q"]);
    }

    #[test]
    fn test_all_bucket_before_command_bucket() {
        let opts = options(
            r#"
backup:
  tag: [daily, home]
all:
  limit-upload: 500
forget:
  keep-last: 3
"#,
        );

        assert_eq!(
            scope_args(&opts, "backup"),
            vec!["--limit-upload", "500", "--tag", "daily", "--tag", "home"]
        );
        assert_eq!(
            scope_args(&opts, "forget"),
            vec!["--limit-upload", "500", "--keep-last", "3"]
        );
        assert_eq!(scope_args(&opts, ""), vec!["--limit-upload", "500"]);
    }

    #[test]
    fn test_all_command_key_not_applied_twice() {
        let opts = options("all: {x: a}");
        assert_eq!(scope_args(&opts, ALL_SCOPE), vec!["--x", "a"]);
    }

    #[test]
    fn test_flags_keep_written_order() {
        let opts = options("all: {verbose: true, exclude: '*.tmp', cache-dir: /c}");
        assert_eq!(
            scope_args(&opts, "backup"),
            vec!["--verbose", "--exclude", "*.tmp", "--cache-dir", "/c"]
        );
    }

    #[test]
    fn test_dash_prefixed_names_kept() {
        assert_eq!(flag_name("exclude"), "--exclude");
        assert_eq!(flag_name("-v"), "-v");
        assert_eq!(flag_name("--dry-run"), "--dry-run");
    }

    #[test]
    fn test_repeated_mixed_items() {
        let mut args = Vec::new();
        OptionValue::Repeated(vec![
            OptionScalar::Value("*.tmp".into()),
            OptionScalar::Flag(false),
            OptionScalar::Flag(true),
        ])
        .append_to("--exclude", &mut args);

        assert_eq!(args, vec!["--exclude", "*.tmp", "--exclude"]);
    }

    #[test]
    fn test_deserialize_shapes() {
        let map: OptionMap = serde_yml::from_str("a: true\nb: 1.5\nc: text\nd: [x, 2, false]").unwrap();

        assert_eq!(map["a"], OptionValue::Flag(true));
        assert_eq!(map["b"], OptionValue::Value("1.5".into()));
        assert_eq!(map["c"], OptionValue::Value("text".into()));
        assert_eq!(
            map["d"],
            OptionValue::Repeated(vec![
                OptionScalar::Value("x".into()),
                OptionScalar::Value("2".into()),
                OptionScalar::Flag(false),
            ])
        );
    }

    #[test]
    fn test_nested_lists_rejected() {
        assert!(serde_yml::from_str::<OptionMap>("a: [[1]]").is_err());
    }

    #[test]
    fn test_serialize_shapes() {
        let mut map = OptionMap::new();
        map.insert("dry-run".into(), true.into());
        map.insert("tag".into(), ["a", "b"].into());

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"dry-run":true,"tag":["a","b"]}"#);
    }
}
