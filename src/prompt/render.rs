//! Placeholder substitution over a closed set of fields.
//!
//! Templates use `{name}` placeholders with `{{` and `}}` as literal brace
//! escapes. Rendering either substitutes every placeholder or fails with a
//! [`RenderError`]; it never produces partially rendered text.
//!
//! Only bare field names are recognised. Format specs and conversions such
//! as `{sender_name:>10}` or `{sender_name!r}` are not applied; they are
//! reported as unknown placeholders, which sends the caller to the
//! fallback prompt.

use thiserror::Error;

/// The values a template can reference, one per known placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFields {
    pub recipient_system_prompt: String,
    pub recipient_name: String,
    pub sender_name: String,
    pub conversation_history: String,
    pub message_text: String,
}

impl PromptFields {
    /// Names accepted inside `{...}`.
    pub const PLACEHOLDERS: [&'static str; 5] = [
        "recipient_system_prompt",
        "recipient_name",
        "sender_name",
        "conversation_history",
        "message_text",
    ];

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "recipient_system_prompt" => Some(&self.recipient_system_prompt),
            "recipient_name" => Some(&self.recipient_name),
            "sender_name" => Some(&self.sender_name),
            "conversation_history" => Some(&self.conversation_history),
            "message_text" => Some(&self.message_text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),

    #[error("single '}}' at byte {0} is not escaped")]
    UnmatchedClosingBrace(usize),
}

/// Substitute every placeholder in `template` from `fields`.
pub fn render(template: &str, fields: &PromptFields) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len() + fields.conversation_history.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let at = offset + pos;
        let tail = &rest[pos..];

        let consumed = if tail.starts_with("{{") {
            out.push('{');
            2
        } else if tail.starts_with("}}") {
            out.push('}');
            2
        } else if tail.starts_with('}') {
            return Err(RenderError::UnmatchedClosingBrace(at));
        } else {
            let close = tail.find('}').ok_or(RenderError::UnclosedBrace(at))?;
            let name = &tail[1..close];
            if name.contains('{') {
                return Err(RenderError::UnclosedBrace(at));
            }
            let value = fields
                .lookup(name)
                .ok_or_else(|| RenderError::UnknownPlaceholder(name.to_string()))?;
            out.push_str(value);
            close + 1
        };

        rest = &tail[consumed..];
        offset = at + consumed;
    }

    out.push_str(rest);
    Ok(out)
}

/// The minimal prompt used whenever the configured template cannot render.
/// Never empty.
pub fn render_fallback(fields: &PromptFields) -> String {
    let name = if fields.recipient_name.trim().is_empty() {
        "an AI"
    } else {
        fields.recipient_name.as_str()
    };
    format!("You are {name}. Respond to: {}", fields.message_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> PromptFields {
        PromptFields {
            recipient_system_prompt: "sys".into(),
            recipient_name: "Bob".into(),
            sender_name: "Alice".into(),
            conversation_history: "hist".into(),
            message_text: "Hi".into(),
        }
    }

    #[test]
    fn substitutes_known_placeholders() {
        let out = render("{sender_name} -> {recipient_name}: {message_text}", &fields()).unwrap();
        assert_eq!(out, "Alice -> Bob: Hi");
    }

    #[test]
    fn repeated_placeholders_are_all_replaced() {
        let out = render("{sender_name}{sender_name}", &fields()).unwrap();
        assert_eq!(out, "AliceAlice");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = render("{{literal}} {message_text} }}", &fields()).unwrap();
        assert_eq!(out, "{literal} Hi }");
    }

    #[test]
    fn values_are_not_rescanned() {
        let mut f = fields();
        f.message_text = "{sender_name} }".into();
        let out = render("{message_text}", &f).unwrap();
        assert_eq!(out, "{sender_name} }");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = render("hello {nickname}", &fields()).unwrap_err();
        assert_eq!(err, RenderError::UnknownPlaceholder("nickname".into()));
    }

    #[test]
    fn format_specs_are_unknown_placeholders() {
        assert!(matches!(
            render("{sender_name:>10}", &fields()),
            Err(RenderError::UnknownPlaceholder(_))
        ));
        assert!(matches!(
            render("{0}", &fields()),
            Err(RenderError::UnknownPlaceholder(_))
        ));
        assert!(matches!(
            render("{sender_name!r}", &fields()),
            Err(RenderError::UnknownPlaceholder(_))
        ));
    }

    #[test]
    fn broken_braces_are_errors() {
        assert_eq!(
            render("abc {sender_name", &fields()),
            Err(RenderError::UnclosedBrace(4))
        );
        assert_eq!(
            render("a { {sender_name}", &fields()),
            Err(RenderError::UnclosedBrace(2))
        );
        assert_eq!(
            render("ab } c", &fields()),
            Err(RenderError::UnmatchedClosingBrace(3))
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("no braces", &fields()).unwrap(), "no braces");
        assert_eq!(render("", &fields()).unwrap(), "");
    }

    #[test]
    fn fallback_uses_recipient_and_message() {
        assert_eq!(render_fallback(&fields()), "You are Bob. Respond to: Hi");

        let mut f = fields();
        f.recipient_name = String::new();
        f.message_text = String::new();
        assert_eq!(render_fallback(&f), "You are an AI. Respond to: ");
    }
}
