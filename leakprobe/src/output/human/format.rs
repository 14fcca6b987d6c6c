use std::time::Duration;

pub(crate) const SEPARATOR_WIDTH: usize = 25;
pub(crate) const BANNER_WIDTH: usize = 30;

pub(crate) fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

pub(crate) fn banner() -> String {
    "=".repeat(BANNER_WIDTH)
}

pub(crate) fn format_kb(kb: u64) -> String {
    format!("{kb} kB")
}

pub(crate) fn format_delta_kb(kb: i64) -> String {
    if kb > 0 {
        format!("+{kb} kB")
    } else {
        format!("{kb} kB")
    }
}

pub(crate) fn format_secs(d: Duration) -> String {
    format!("{:.6} s", d.as_secs_f64())
}

pub(crate) fn format_avg_kb(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.6} kB")
    } else {
        "0.000000 kB".to_string()
    }
}

/// First line of a statement, capped at `max` characters.
pub(crate) fn sql_preview(sql: &str, max: usize) -> String {
    let line = sql.trim().lines().next().unwrap_or_default();
    let mut out: String = line.chars().take(max).collect();
    if line.chars().count() > max || sql.trim().lines().nth(1).is_some() {
        out.push_str(" ...");
    }
    out
}
