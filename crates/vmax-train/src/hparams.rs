//! Human-readable hyperparameter dumps.

use serde_json::Value;

/// Wrap width of leaf values.
pub const WRAP_WIDTH: usize = 70;
/// Width of centered section titles.
pub const TITLE_WIDTH: usize = 50;

fn indent(level: i32) -> String {
    " ".repeat(4 * level.max(0) as usize)
}

/// Greedy word wrap: the first line has no indent, following lines
/// start with `subsequent`. Words longer than a line are split.
fn fill(text: &str, width: usize, subsequent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let prefix_len = if lines.is_empty() { 0 } else { subsequent.len() };
        let sep = usize::from(!line.is_empty());
        if line.chars().count() + sep + word.chars().count() + prefix_len <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(word);
            continue;
        }
        let mut rest: Vec<char> = word.chars().collect();
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        loop {
            let room = width.saturating_sub(if lines.is_empty() { 0 } else { subsequent.len() }).max(1);
            if rest.len() <= room {
                line = rest.into_iter().collect();
                break;
            }
            lines.push(rest.drain(..room).collect());
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join(&format!("\n{subsequent}"))
}

/// Leaves print as `True`/`False`/`None`, lists are joined with `", "`
/// and strings below the top are single-quoted.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => nested(other),
    }
}

fn nested(value: &Value) -> String {
    match value {
        Value::Null => "None".into(),
        Value::Bool(true) => "True".into(),
        Value::Bool(false) => "False".into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(nested).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map.iter().map(|(k, v)| format!("'{k}': {}", nested(v))).collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn render(out: &mut Vec<String>, params: &serde_json::Map<String, Value>, name: &str, level: i32) {
    if level <= 0 {
        out.push(format!("{name:=^TITLE_WIDTH$}"));
    } else {
        out.push(format!("{}- {name}", indent(level - 1)));
    }
    for (key, value) in params {
        match value {
            Value::Object(map) => render(out, map, key, level + 1),
            leaf => {
                let wrapped = fill(&scalar(leaf), WRAP_WIDTH, &indent(level + 1));
                out.push(format!("{}{key}: {wrapped}", indent(level)));
            }
        }
    }
}

/// Render a nested configuration.
///
/// The top level and its direct sub-sections get a title centered in
/// `=`; deeper sections are listed as `- name` and indented by four
/// spaces per level. A non-object `params` renders as a single entry.
pub fn format_hyperparameters(params: &Value, name: &str) -> String {
    let mut out = Vec::new();
    match params {
        Value::Object(map) => render(&mut out, map, name, -1),
        leaf => {
            out.push(format!("{name:=^TITLE_WIDTH$}"));
            out.push(fill(&scalar(leaf), WRAP_WIDTH, ""));
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_sections_indent() {
        let params = json!({
            "seed": 1,
            "network": {
                "encoder": { "type": "mlp", "depth": 2 },
                "lr": 0.001
            }
        });
        let text = format_hyperparameters(&params, "config");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("{:=^50}", "config"));
        assert_eq!(lines[1], "seed: 1");
        assert_eq!(lines[2], format!("{:=^50}", "network"));
        assert_eq!(lines[3], "- encoder");
        assert_eq!(lines[4], "    type: mlp");
        assert_eq!(lines[5], "    depth: 2");
        assert_eq!(lines[6], "lr: 0.001");
        assert_eq!(lines[0].len(), 50);
    }

    #[test]
    fn leaves_print_capitalized_and_spaced() {
        let params = json!({
            "flag": true,
            "off": false,
            "layers": null,
            "sizes": [256, 256],
            "keys": ["offroad", "overlap"],
            "reward": { "weights": [{ "overlap": -1.0 }] }
        });
        let text = format_hyperparameters(&params, "run");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "flag: True");
        assert_eq!(lines[2], "off: False");
        assert_eq!(lines[3], "layers: None");
        assert_eq!(lines[4], "sizes: [256, 256]");
        assert_eq!(lines[5], "keys: ['offroad', 'overlap']");
        assert_eq!(lines[7], "weights: [{'overlap': -1.0}]");
    }

    #[test]
    fn long_values_wrap_at_seventy() {
        let words = vec!["abcdefghi"; 20].join(" ");
        let params = json!({ "a": { "b": { "keys": words } } });
        let text = format_hyperparameters(&params, "");
        let value_lines: Vec<&str> = text.lines().skip(3).collect();
        assert!(value_lines.len() > 1);
        assert!(value_lines[0].starts_with("    keys: abcdefghi"));
        for line in &value_lines[1..] {
            assert!(line.starts_with("        abcdefghi"), "{line:?}");
            assert!(line.len() <= 70);
        }
    }

    #[test]
    fn overlong_word_is_split() {
        let wrapped = fill(&"x".repeat(150), 70, "  ");
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines[0].len(), 70);
        assert_eq!(lines[1], format!("  {}", "x".repeat(68)));
        assert_eq!(lines[2], format!("  {}", "x".repeat(12)));
    }
}
