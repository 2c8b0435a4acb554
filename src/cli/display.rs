use console::style;

/// Print a success line: "ok: <message>"
pub fn ok(message: &str) {
    eprintln!("{} {}", style("ok:").green().bold(), message);
}

/// Print a warning line: "warning: <message>"
pub fn warning(message: &str) {
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
}

/// Print a labeled value for identity/send detail output.
pub fn field(label: &str, value: &str) {
    println!("  {:<14}{}", style(label).bold(), value);
}
