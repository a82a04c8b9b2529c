use serde_json::Value;

use terminal_size::{terminal_size, Width};

// Render a JSON result as an ASCII table.
// Returns true if a table was printed (object or array of objects), false
// otherwise; the caller falls back to raw JSON.
pub fn print_result(val: &Value) -> bool {
    // Honor env override to force JSON output
    if std::env::var("PORTICO_OUTPUT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
        return false;
    }

    let (cols, rows) = match shape_table(val) {
        Some(t) => t,
        None => return false,
    };
    if rows.is_empty() {
        return false;
    }

    // Detect terminal width once for this rendering
    let termw = get_terminal_width();
    crate::tprintln!("[cli] detected terminal width={} columns", termw);

    let mut widths: Vec<usize> = cols.iter().map(|s| s.len().min(termw)).collect();
    for r in &rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(termw); }
        }
    }

    let sep = build_separator(&widths);
    println!("{}", fit_line_to_width(&sep, termw));
    println!("{}", fit_line_to_width(&build_row(&cols, &widths), termw));
    println!("{}", fit_line_to_width(&sep, termw));
    for r in &rows {
        println!("{}", fit_line_to_width(&build_row(r, &widths), termw));
    }
    println!("{}", fit_line_to_width(&sep, termw));
    println!("rows: {}, cols: {}", rows.len(), cols.len());

    true
}

// Accepted shapes:
// - object => two-column key/value table (sorted by key)
// - array of objects => union-of-keys table (sorted)
// - array of scalars => single "value" column
fn shape_table(val: &Value) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    match val {
        Value::Object(map) => {
            if map.is_empty() { return None; }
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let rows = keys
                .into_iter()
                .map(|k| vec![k.clone(), to_cell_string(&map[k.as_str()])])
                .collect();
            Some((vec!["key".to_string(), "value".to_string()], rows))
        }
        Value::Array(arr) => {
            if arr.is_empty() { return None; }
            let mut all_keys: Vec<String> = Vec::new();
            let mut is_all_objects = true;
            for el in arr {
                if let Value::Object(map) = el {
                    for k in map.keys() { if !all_keys.contains(k) { all_keys.push(k.clone()); } }
                } else {
                    is_all_objects = false;
                }
            }
            if is_all_objects && !all_keys.is_empty() {
                all_keys.sort();
                let mut rows: Vec<Vec<String>> = Vec::with_capacity(arr.len());
                for el in arr {
                    if let Value::Object(map) = el {
                        rows.push(all_keys.iter().map(|k| to_cell_string(map.get(k).unwrap_or(&Value::Null))).collect());
                    }
                }
                Some((all_keys, rows))
            } else {
                // Single column fallback
                let rows = arr.iter().map(|el| vec![to_cell_string(el)]).collect();
                Some((vec!["value".to_string()], rows))
            }
        }
        _ => None,
    }
}

fn to_cell_string(v: &Value) -> String {
    match v {
        Value::Null => String::from("NULL"),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // keep objects/arrays compact
        other => other.to_string(),
    }
}

fn get_terminal_width() -> usize {
    match terminal_size() {
        Some((Width(w), _)) => (w as usize).max(20),
        None => 120,
    }
}

fn display_len(s: &String) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        s.push(' ');
        if align_right {
            let pad = w.saturating_sub(display_len(&text));
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            let pad = w.saturating_sub(display_len(&text));
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn fit_line_to_width(line: &str, max: usize) -> String {
    if line.chars().count() <= max { return line.to_string(); }
    truncate(line, max)
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    let take = max - 1;
    s.chars().take(take).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    // crude detection for aligning numbers to right
    let st = s.trim();
    if st.is_empty() { return false; }
    let mut has_digit = false;
    for ch in st.chars() {
        if ch.is_ascii_digit() { has_digit = true; continue; }
        if ".-+eE,_".contains(ch) { continue; }
        return false;
    }
    has_digit
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn objects_become_key_value_rows() {
        let (cols, rows) = shape_table(&json!({"status": "ok", "uptime": 12})).unwrap();
        assert_eq!(cols, vec!["key".to_string(), "value".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["status".to_string(), "ok".to_string()]);
    }

    #[test]
    fn object_arrays_union_their_keys() {
        let (cols, rows) = shape_table(&json!([{"a": 1}, {"b": 2}])).unwrap();
        assert_eq!(cols, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(rows[1], vec!["NULL".to_string(), "2".to_string()]);
    }

    #[test]
    fn scalars_are_not_tables() {
        assert!(shape_table(&json!("just a string")).is_none());
        assert!(shape_table(&json!(null)).is_none());
    }
}
