use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandNameViolation {
    Empty,
    ContainsNul,
    StartsWithDash,
    ContainsWhitespace,
    IsDotToken,
    ContainsPathSeparator,
}

impl fmt::Display for CommandNameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Empty => "command name cannot be empty",
            Self::ContainsNul => "command name cannot contain NUL bytes",
            Self::StartsWithDash => "command name cannot start with `-`",
            Self::ContainsWhitespace => "command name cannot contain whitespace",
            Self::IsDotToken => "command name cannot be `.` or `..`",
            Self::ContainsPathSeparator => "command name cannot contain path separators",
        };
        f.write_str(message)
    }
}

impl std::error::Error for CommandNameViolation {}

/// The launcher is written as a single file inside the bin dir, so its name
/// must be a plain file name that a shell will treat as a command word.
pub fn validate_command_name(name: &str) -> Result<(), CommandNameViolation> {
    if name.trim().is_empty() {
        return Err(CommandNameViolation::Empty);
    }
    if name.contains('\0') {
        return Err(CommandNameViolation::ContainsNul);
    }
    if name.starts_with('-') {
        return Err(CommandNameViolation::StartsWithDash);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(CommandNameViolation::ContainsWhitespace);
    }
    if name == "." || name == ".." {
        return Err(CommandNameViolation::IsDotToken);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(CommandNameViolation::ContainsPathSeparator);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_command_name, CommandNameViolation};

    #[test]
    fn accepts_typical_command_names() {
        assert!(validate_command_name("cc-insights").is_ok());
        assert!(validate_command_name("ccinsights2").is_ok());
        assert!(validate_command_name("cc.insights").is_ok());
    }

    #[test]
    fn rejects_whitespace_and_pathlike_names() {
        assert_eq!(
            validate_command_name("cc insights"),
            Err(CommandNameViolation::ContainsWhitespace)
        );
        assert_eq!(
            validate_command_name("bin/cc"),
            Err(CommandNameViolation::ContainsPathSeparator)
        );
    }

    #[test]
    fn rejects_flags_dots_nul_and_blank() {
        assert_eq!(validate_command_name("-cc"), Err(CommandNameViolation::StartsWithDash));
        assert_eq!(validate_command_name(".."), Err(CommandNameViolation::IsDotToken));
        assert_eq!(validate_command_name("c\0c"), Err(CommandNameViolation::ContainsNul));
        assert_eq!(validate_command_name("   "), Err(CommandNameViolation::Empty));
    }

    #[test]
    fn violations_render_readable_messages() {
        let message = CommandNameViolation::StartsWithDash.to_string();
        assert!(message.contains("cannot start with `-`"), "{message}");
    }
}
