use parley::prompt::builder::{EMPTY_HISTORY, format_history, prompt_fields};
use parley::prompt::{PromptBuilder, TemplateStore};
use parley::types::{ContextTurn, PersonaConfig};

fn alice() -> PersonaConfig {
    PersonaConfig::new("Alice", "llama3").with_system_prompt("You are Alice.")
}

fn bob() -> PersonaConfig {
    PersonaConfig::new("Bob", "mistral").with_system_prompt("You are Bob.")
}

#[test]
fn empty_context_uses_placeholder_history() {
    let store = TemplateStore::new();
    let prompt = PromptBuilder::new(&store).build(Some(&alice()), Some(&bob()), "Hi", &[]);
    assert!(prompt.contains("No previous conversation."));
    assert_eq!(format_history(&[]), EMPTY_HISTORY);
}

#[test]
fn alice_greets_bob_with_default_template() {
    let store = TemplateStore::new();
    let prompt = PromptBuilder::new(&store).build(Some(&alice()), Some(&bob()), "Hi", &[]);

    let expected = "System: You are Bob.

You are Bob having a conversation with Alice.

Previous conversation:
No previous conversation.

Alice: Hi

Bob:";
    assert_eq!(prompt, expected);
}

#[test]
fn history_is_formatted_as_blank_line_separated_turns() {
    let context = vec![
        ContextTurn::new("alice", "Hello Bob"),
        ContextTurn::new("bob", "Hi Alice\n"),
    ];
    assert_eq!(
        format_history(&context),
        "alice: Hello Bob\n\nbob: Hi Alice"
    );
}

#[test]
fn history_appears_in_prompt() {
    let store = TemplateStore::new();
    let context = vec![ContextTurn::new("alice", "Earlier"), ContextTurn::new("alice", "Hi")];
    let prompt = PromptBuilder::new(&store).build(Some(&alice()), Some(&bob()), "Hi", &context);
    assert!(prompt.contains("Previous conversation:\nalice: Earlier\n\nalice: Hi\n\nAlice: Hi"));
    assert!(!prompt.contains(EMPTY_HISTORY));
}

#[test]
fn missing_personas_use_defaults() {
    let fields = prompt_fields(None, None, "ping", &[]);
    assert_eq!(fields.sender_name, "Unknown");
    assert_eq!(fields.recipient_name, "Unknown");
    assert_eq!(fields.recipient_system_prompt, "You are an AI assistant.");
    assert_eq!(fields.message_text, "ping");
    assert_eq!(fields.conversation_history, EMPTY_HISTORY);
}

#[test]
fn recipient_without_system_prompt_gets_default() {
    let plain = PersonaConfig::new("Carol", "llama3");
    let fields = prompt_fields(Some(&alice()), Some(&plain), "yo", &[]);
    assert_eq!(fields.recipient_system_prompt, "You are an AI assistant.");
    assert_eq!(fields.recipient_name, "Carol");
    assert_eq!(fields.sender_name, "Alice");
}

#[test]
fn message_text_is_verbatim() {
    let store = TemplateStore::new();
    store.set_template("[{message_text}]").unwrap();
    let text = "  {not a placeholder}  \n";
    let prompt = PromptBuilder::new(&store).build(Some(&alice()), Some(&bob()), text, &[]);
    assert_eq!(prompt, format!("[{text}]"));
}

#[test]
fn broken_template_falls_back_during_build() {
    let store = TemplateStore::new();
    store.set_template("{recipient_name} {mood}").unwrap();
    let prompt = PromptBuilder::new(&store).build(Some(&alice()), Some(&bob()), "Hi", &[]);
    assert_eq!(prompt, "You are Bob. Respond to: Hi");
}

#[test]
fn build_is_deterministic_for_a_fixed_template() {
    let store = TemplateStore::new();
    let context = vec![ContextTurn::new("alice", "a")];
    let builder = PromptBuilder::new(&store);
    let first = builder.build(Some(&alice()), Some(&bob()), "x", &context);
    let second = builder.build(Some(&alice()), Some(&bob()), "x", &context);
    assert_eq!(first, second);
}
