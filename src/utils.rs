use std::io::{self, BufRead, Write};

/// Check if stdin is a TTY (interactive)
pub fn is_stdin_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Read one line from stdin, prompting first when stdin is a terminal.
/// The trailing newline is removed.
pub fn read_line(prompt: &str) -> io::Result<String> {
    if is_stdin_tty() {
        eprint!("{prompt}");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Truncate a string to a maximum length, handling multi-byte characters properly.
/// Appends "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}

/// Pad or truncate to exactly `width` characters
pub fn fit_width(s: &str, width: usize) -> String {
    let truncated = truncate_string(s, width);
    format!("{truncated:<width$}")
}
