use console::style;

/// Terminal output helpers; `quiet` silences everything but errors
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold().underlined());
        }
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold());
            println!("{}", "─".repeat(40));
        }
    }

    /// Aligned `label: value` line
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("  {:<14} {}", style(format!("{}:", label)).dim(), value);
        }
    }

    pub fn line(&self, text: &str) {
        if !self.quiet {
            println!("{}", text);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
