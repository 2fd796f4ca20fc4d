/// `BOM-{job}.pdf`, as the export endpoint names its download.
pub fn pdf_filename(job_id: &str) -> String {
    format!("BOM-{}.pdf", sanitize_component(job_id))
}

pub fn csv_filename(job_id: &str) -> String {
    format!("bom-{}.csv", sanitize_component(job_id))
}

/// Makes a job id safe to embed in a file name on every platform.
pub fn sanitize_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    if compacted.is_empty() {
        return "job".to_string();
    }
    if compacted.chars().count() > 64 {
        compacted = compacted.chars().take(64).collect();
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
