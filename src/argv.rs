//! Command-line tokenizer producing a flat key/value map.
//!
//! Recognised forms:
//! - `--key value`, `--key=value`, `-k value`
//! - `--flag` (true), `--no-flag` (false), `-abc` (a, b and c all true)
//! - positional arguments and everything after `--` collect under `_`
//!
//! Values that look numeric become numbers and `true`/`false` become
//! booleans. Repeating a key collects its values into a sequence. Keys are
//! left flat; dotted keys such as `--db.port 5432` are expanded later.

use serde_json::{Map, Number, Value};

/// Key holding positional arguments.
pub const POSITIONAL_KEY: &str = "_";

/// Tokenize `argv` (without the program name) into a flat map.
pub fn parse_args<I, S>(argv: I) -> Map<String, Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<String> = argv.into_iter().map(|s| s.as_ref().to_string()).collect();
    let mut flat = Map::new();
    let mut positional = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();

        if arg == "--" {
            positional.extend(args[i + 1..].iter().map(|s| coerce(s)));
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            if let Some((key, value)) = long.split_once('=') {
                insert(&mut flat, key, coerce(value));
            } else if let Some(key) = long.strip_prefix("no-") {
                insert(&mut flat, key, Value::Bool(false));
            } else if let Some(next) = args.get(i + 1).filter(|next| !is_flag(next)) {
                insert(&mut flat, long, coerce(next));
                i += 1;
            } else {
                insert(&mut flat, long, Value::Bool(true));
            }
        } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty() && !is_number(arg)) {
            if let Some((key, value)) = short.split_once('=') {
                insert(&mut flat, key, coerce(value));
            } else {
                let letters: Vec<char> = short.chars().collect();
                if let Some((last, leading)) = letters.split_last() {
                    for letter in leading {
                        insert(&mut flat, &letter.to_string(), Value::Bool(true));
                    }
                    if let Some(next) = args.get(i + 1).filter(|next| !is_flag(next)) {
                        insert(&mut flat, &last.to_string(), coerce(next));
                        i += 1;
                    } else {
                        insert(&mut flat, &last.to_string(), Value::Bool(true));
                    }
                }
            }
        } else {
            positional.push(coerce(arg));
        }

        i += 1;
    }

    flat.insert(POSITIONAL_KEY.to_string(), Value::Array(positional));
    flat
}

fn is_flag(arg: &str) -> bool {
    arg.starts_with('-') && arg.len() > 1 && !is_number(arg)
}

fn insert(flat: &mut Map<String, Value>, key: &str, value: Value) {
    match flat.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            flat.insert(key.to_string(), value);
        }
    }
}

fn is_number(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && s.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Convert a raw argument into a typed value.
fn coerce(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }

    if is_number(raw)
        && let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64)
    {
        return Value::Number(n);
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(args: &[&str]) -> Value {
        Value::Object(parse_args(args))
    }

    #[test]
    fn test_long_flags_with_values() {
        let parsed = parse(&["--foo", "bar", "--baz.lulz", "some value"]);
        assert_eq!(
            parsed,
            json!({"foo": "bar", "baz.lulz": "some value", "_": []})
        );
    }

    #[test]
    fn test_equals_and_negation() {
        let parsed = parse(&["--port=8080", "--no-color", "--debug"]);
        assert_eq!(
            parsed,
            json!({"port": 8080, "color": false, "debug": true, "_": []})
        );
    }

    #[test]
    fn test_boolean_and_number_coercion() {
        let parsed = parse(&["--enabled", "false", "--ratio", "0.5", "--offset", "-3"]);
        assert_eq!(parsed["enabled"], json!(false));
        assert_eq!(parsed["ratio"], json!(0.5));
        assert_eq!(parsed["offset"], json!(-3));
    }

    #[test]
    fn test_short_flags() {
        let parsed = parse(&["-abc", "-n", "5"]);
        assert_eq!(parsed["a"], json!(true));
        assert_eq!(parsed["b"], json!(true));
        assert_eq!(parsed["c"], json!(true));
        assert_eq!(parsed["n"], json!(5));
    }

    #[test]
    fn test_positional_and_terminator() {
        let parsed = parse(&["serve", "--verbose", "--", "--not-a-flag", "7"]);
        assert_eq!(parsed["_"], json!(["serve", "--not-a-flag", 7]));
        assert_eq!(parsed["verbose"], json!(true));
    }

    #[test]
    fn test_repeated_keys_collect() {
        let parsed = parse(&["--tag", "a", "--tag", "b", "--tag", "c"]);
        assert_eq!(parsed["tag"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_flag_followed_by_flag_is_true() {
        let parsed = parse(&["--foo", "--bar", "x"]);
        assert_eq!(parsed["foo"], json!(true));
        assert_eq!(parsed["bar"], json!("x"));
    }
}
