//! POSIX shell quoting for the few places where an argument vector has to
//! become a single command string (the remote side of `ssh`).

/// Quotes `value` so a POSIX shell reads it back as exactly one word.
///
/// Words made only of safe characters are left as-is to keep commands
/// readable in logs.
#[must_use]
pub fn quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@,+%".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Quotes each argument and joins them with spaces.
#[must_use]
pub fn join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|a| quote(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
