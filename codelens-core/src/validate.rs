//! Cheap pre-submission checks.
//!
//! Nothing here parses code. The bracket check only compares counts, so a string
//! literal containing `"("` can trip it; the caller surfaces the message and the
//! user decides.

use crate::error::ValidationError;

/// Size caps applied before a submission is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_chars: usize,
    pub max_lines: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_chars: 50_000,
            max_lines: 2_000,
        }
    }
}

const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// Returns the first problem found in `code`, checked in order: size, lines, brackets.
pub fn validate(code: &str, limits: &ValidationLimits) -> Result<(), ValidationError> {
    let chars = code.chars().count();
    if chars > limits.max_chars {
        return Err(ValidationError::TooLarge {
            chars,
            limit: limits.max_chars,
        });
    }

    let lines = code.lines().count();
    if lines > limits.max_lines {
        return Err(ValidationError::TooManyLines {
            lines,
            limit: limits.max_lines,
        });
    }

    for (open, close) in PAIRS {
        let opened = code.chars().filter(|&c| c == open).count();
        let closed = code.chars().filter(|&c| c == close).count();
        if opened != closed {
            return Err(ValidationError::Unbalanced {
                open,
                close,
                opened,
                closed,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_code_passes() {
        let code = "function f(a) { return [a, (a + 1)]; }";
        assert_eq!(validate(code, &ValidationLimits::default()), Ok(()));
    }

    #[test]
    fn missing_brace_is_reported() {
        let err = validate("fn main() {", &ValidationLimits::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Unbalanced {
                open: '{',
                close: '}',
                opened: 1,
                closed: 0
            }
        );
    }

    #[test]
    fn size_cap_counts_characters_not_bytes() {
        let limits = ValidationLimits {
            max_chars: 3,
            max_lines: 10,
        };
        assert_eq!(validate("ééé", &limits), Ok(()));
        assert!(matches!(
            validate("éééé", &limits),
            Err(ValidationError::TooLarge { chars: 4, limit: 3 })
        ));
    }

    #[test]
    fn line_cap() {
        let limits = ValidationLimits {
            max_chars: 1_000,
            max_lines: 2,
        };
        assert!(matches!(
            validate("a\nb\nc", &limits),
            Err(ValidationError::TooManyLines { lines: 3, limit: 2 })
        ));
    }
}
