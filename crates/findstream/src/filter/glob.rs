//! Shell glob to regex translation.

/// What a glob's wildcards may span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobScope {
    /// One path component: wildcards never match `/`.
    Name,
    /// A whole path: wildcards also match `/`.
    Path,
}

impl GlobScope {
    fn any_char(self) -> &'static str {
        match self {
            Self::Name => "[^/]",
            Self::Path => ".",
        }
    }
}

/// Translates a shell glob into an anchored regex pattern.
///
/// Unescaped `*` matches zero or more characters and `?` exactly one; for
/// [`GlobScope::Name`] neither matches `/`. `\*`, `\?` and `\\` are
/// literals. Every other character, including regex metacharacters, stands
/// for itself.
pub fn glob_to_regex(glob: &str, scope: GlobScope) -> String {
    let any = scope.any_char();
    let mut pattern = String::with_capacity(glob.len() + 8);
    let mut literal = String::new();
    pattern.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next @ ('*' | '?' | '\\')) => {
                    literal.push(next);
                    chars.next();
                }
                _ => literal.push('\\'),
            },
            '*' | '?' => {
                pattern.push_str(&regex::escape(&literal));
                literal.clear();
                pattern.push_str(any);
                if ch == '*' {
                    pattern.push('*');
                }
            }
            other => literal.push(other),
        }
    }

    pattern.push_str(&regex::escape(&literal));
    pattern.push('$');
    pattern
}
