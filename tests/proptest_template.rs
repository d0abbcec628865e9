//! Property-based tests for prompt templates
//!
//! Parsing must never panic, and rendering must substitute every field
//! exactly, whatever the surrounding text.

use batch_infer::dataset::Fields;
use batch_infer::template::PromptTemplate;
use proptest::prelude::*;
use serde_json::Value;

/// Literal text without braces
fn literal() -> impl Strategy<Value = String> {
    "[^{}]{0,20}"
}

fn field_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,10}"
}

proptest! {
    #[test]
    fn parse_never_panics(source in ".{0,64}") {
        let _ = PromptTemplate::parse(&source);
    }

    #[test]
    fn brace_free_text_renders_verbatim(text in literal()) {
        let template = PromptTemplate::parse(&text).unwrap();
        prop_assert_eq!(template.render(&Fields::new()).unwrap(), text);
    }

    #[test]
    fn single_field_is_substituted(
        prefix in literal(),
        name in field_name(),
        value in ".{0,30}",
        suffix in literal(),
    ) {
        let template = PromptTemplate::parse(&format!("{prefix}{{{name}}}{suffix}")).unwrap();
        let mut fields = Fields::new();
        fields.insert(name.clone(), Value::String(value.clone()));

        let rendered = template.render(&fields).unwrap();
        prop_assert_eq!(rendered, format!("{prefix}{value}{suffix}"));
        prop_assert_eq!(template.fields().collect::<Vec<_>>(), vec![name.as_str()]);
    }

    #[test]
    fn missing_field_is_reported(name in field_name()) {
        let template = PromptTemplate::parse(&format!("{{{name}}}")).unwrap();
        let err = template.render(&Fields::new()).unwrap_err();
        prop_assert_eq!(err.code(), "BATCH-011");
    }

    #[test]
    fn escaped_braces_round_trip(text in literal()) {
        let template = PromptTemplate::parse(&format!("{{{{{text}}}}}")).unwrap();
        prop_assert_eq!(template.render(&Fields::new()).unwrap(), format!("{{{text}}}"));
    }

    #[test]
    fn numbers_render_as_json(name in field_name(), n in any::<i64>()) {
        let template = PromptTemplate::parse(&format!("n={{{name}}}")).unwrap();
        let mut fields = Fields::new();
        fields.insert(name, Value::from(n));
        prop_assert_eq!(template.render(&fields).unwrap(), format!("n={n}"));
    }
}
