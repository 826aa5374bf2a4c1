// src/utils/report.rs

//! Console report helpers layered on the `log` facade.
//!
//! Gives run output a consistent banner/summary shape regardless of which
//! logger the binary installs.

const WIDTH: usize = 43;

/// Log a banner line.
pub fn separator() {
    log::info!("{}", "─".repeat(WIDTH));
}

/// Log a header framed by banner lines.
pub fn header(title: &str) {
    let border = "═".repeat(WIDTH);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Join up to `max` names, appending `+N more` for the rest.
pub fn name_list(names: &[&str], max: usize) -> String {
    let mut joined = names
        .iter()
        .take(max)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > max {
        joined.push_str(&format!(" +{} more", names.len() - max));
    }
    joined
}
