//! Input sanitization and validation for iptrules
//!
//! Comment text ends up inside a quoted module argument in an
//! `iptables-restore` input line, which has no faithful quoting mechanism.
//! Comments are therefore sanitized lossily rather than escaped.

/// Maximum comment length accepted by the iptables comment match, in bytes.
pub const MAX_COMMENT_LEN: usize = 256;

/// Maximum chain name length (`XT_EXTENSION_MAXNAMELEN` - 1).
pub const MAX_CHAIN_NAME_LEN: usize = 28;

/// Returns `true` for characters that may appear unmodified in a comment.
///
/// Word characters are ASCII only; anything multi-byte is unsafe.
#[inline]
fn is_comment_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '_' | ' ' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-'
        )
}

/// Replaces every character outside `[A-Za-z0-9_ @%+=:,./-]` with `_`.
///
/// This is lossy by design of the target format: each unsafe character,
/// including a multi-byte one, becomes exactly one underscore.
///
/// # Examples
///
/// ```
/// use iptrules::validators::escape_comment;
///
/// assert_eq!(escape_comment("policy \"allow-all\""), "policy _allow-all_");
/// assert_eq!(escape_comment("`rm -rf`; echo $HOME"), "_rm -rf__ echo _HOME");
/// ```
pub fn escape_comment(input: &str) -> String {
    input
        .chars()
        .map(|c| if is_comment_safe(c) { c } else { '_' })
        .collect()
}

/// Hard-truncates a comment to [`MAX_COMMENT_LEN`] bytes.
///
/// Expects already-escaped (ASCII) input; a multi-byte character straddling
/// the limit is dropped whole rather than split.
pub fn truncate_comment(mut input: String) -> String {
    if input.len() > MAX_COMMENT_LEN {
        let mut end = MAX_COMMENT_LEN;
        while !input.is_char_boundary(end) {
            end -= 1;
        }
        input.truncate(end);
    }
    input
}

/// Escapes then truncates a comment, in that order.
pub fn sanitize_comment(input: &str) -> String {
    truncate_comment(escape_comment(input))
}

/// Validates an iptables chain name.
///
/// # Errors
///
/// Returns `Err` if the name is empty, longer than [`MAX_CHAIN_NAME_LEN`]
/// bytes, contains whitespace, or starts with `-` or `!` (which the loader
/// would parse as an option or negation).
pub fn validate_chain_name(name: &str) -> Result<&str, String> {
    if name.is_empty() {
        return Err("Chain name cannot be empty".to_string());
    }

    if name.len() > MAX_CHAIN_NAME_LEN {
        return Err(format!(
            "Chain name too long (max {MAX_CHAIN_NAME_LEN} characters)"
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err("Chain name cannot contain whitespace".to_string());
    }

    if name.starts_with('-') || name.starts_with('!') {
        return Err("Chain name cannot start with '-' or '!'".to_string());
    }

    Ok(name)
}

/// Validates the prefix used in hash tracking comments (e.g. `cali`).
///
/// # Errors
///
/// Returns `Err` if the prefix is empty or would be altered by
/// [`escape_comment`].
pub fn validate_hash_prefix(prefix: &str) -> Result<&str, String> {
    if prefix.is_empty() {
        return Err("Hash comment prefix cannot be empty".to_string());
    }
    if !prefix.chars().all(is_comment_safe) || prefix.contains(' ') {
        return Err("Hash comment prefix contains characters unsafe in comments".to_string());
    }
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_keeps_safe_characters() {
        let safe = "Policy ns/allow-web: 10.0.0.0/8, port=80 @host %x +y";
        assert_eq!(escape_comment(safe), safe);
    }

    #[test]
    fn test_escape_replaces_quote_and_backtick() {
        assert_eq!(escape_comment("a\"b`c"), "a_b_c");
    }

    #[test]
    fn test_escape_control_and_shell_characters() {
        assert_eq!(escape_comment("a\nb\tc;d|e&f$g'h"), "a_b_c_d_e_f_g_h");
    }

    #[test]
    fn test_escape_multibyte_becomes_single_underscore() {
        assert_eq!(escape_comment("café ✓"), "caf_ _");
    }

    #[test]
    fn test_truncate_exact_limit() {
        let input = "x".repeat(300);
        assert_eq!(truncate_comment(input).len(), MAX_COMMENT_LEN);

        let short = "y".repeat(MAX_COMMENT_LEN);
        assert_eq!(truncate_comment(short.clone()), short);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let mut input = "a".repeat(MAX_COMMENT_LEN - 1);
        input.push('é');
        let out = truncate_comment(input);
        assert_eq!(out.len(), MAX_COMMENT_LEN - 1);
    }

    #[test]
    fn test_sanitize_escapes_before_truncating() {
        // 255 safe chars then a multi-byte char: escaping first keeps it at 256 bytes
        let mut input = "a".repeat(MAX_COMMENT_LEN - 1);
        input.push_str("éééé");
        let out = sanitize_comment(&input);
        assert_eq!(out.len(), MAX_COMMENT_LEN);
        assert!(out.ends_with('_'));
    }

    #[test]
    fn test_validate_chain_name() {
        assert!(validate_chain_name("cali-FORWARD").is_ok());
        assert!(validate_chain_name("").is_err());
        assert!(validate_chain_name("has space").is_err());
        assert!(validate_chain_name("-A").is_err());
        assert!(validate_chain_name("!neg").is_err());
        assert!(validate_chain_name(&"c".repeat(MAX_CHAIN_NAME_LEN)).is_ok());
        assert!(validate_chain_name(&"c".repeat(MAX_CHAIN_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_hash_prefix() {
        assert!(validate_hash_prefix("cali").is_ok());
        assert!(validate_hash_prefix("").is_err());
        assert!(validate_hash_prefix("ca\"li").is_err());
        assert!(validate_hash_prefix("ca li").is_err());
    }
}
