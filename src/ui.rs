use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Truncate a string for display, keeping the end
pub fn truncate_end(text: &str, max_len: usize) -> String {
    let len = text.chars().count();
    if len <= max_len {
        text.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let tail: String = text.chars().skip(len - (max_len - 3)).collect();
        format!("...{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_end_short() {
        assert_eq!(truncate_end("settings.php", 20), "settings.php");
        assert_eq!(truncate_end("exact", 5), "exact");
    }

    #[test]
    fn test_truncate_end_long() {
        assert_eq!(
            truncate_end("/srv/app/docroot/sites/default/settings.php", 15),
            "...settings.php"
        );
    }

    #[test]
    fn test_truncate_end_edge_cases() {
        assert_eq!(truncate_end("test", 3), "...");
        assert_eq!(truncate_end("", 10), "");
    }
}
