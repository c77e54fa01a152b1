use apollo_assistant::conversation::{trim_history, ConversationStore};
use apollo_assistant::models::{FunctionCall, Message, ToolCall};

#[tokio::test]
async fn unknown_id_seeds_single_system_message() {
    let store = ConversationStore::new("persona");

    let history = store.history("conv1").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, "system");
    assert_eq!(history[0].content.as_deref(), Some("persona"));
}

#[tokio::test]
async fn append_grows_history_in_order() {
    let store = ConversationStore::new("persona");

    store.append("conv1", Message::user("hello")).await;
    store
        .append("conv1", Message::assistant(Some("hi".to_string()), None))
        .await;

    let history = store.history("conv1").await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role, "user");
    assert_eq!(history[2].role, "assistant");
}

#[tokio::test]
async fn replace_swaps_full_history() {
    let store = ConversationStore::new("persona");
    store.append("conv1", Message::user("hello")).await;

    let replacement = vec![Message::system("persona"), Message::user("other")];
    store.replace("conv1", replacement.clone()).await;

    assert_eq!(store.history("conv1").await, replacement);
}

#[tokio::test]
async fn clear_reseeds_fresh_on_next_access() {
    let store = ConversationStore::new("persona");
    store.append("conv1", Message::user("hello")).await;
    store
        .append("conv1", Message::assistant(Some("hi".to_string()), None))
        .await;

    store.clear("conv1");

    let history = store.history("conv1").await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, "system");
}

#[tokio::test]
async fn distinct_ids_are_independent() {
    let store = ConversationStore::new("persona");
    store.append("a", Message::user("one")).await;

    assert_eq!(store.history("a").await.len(), 2);
    assert_eq!(store.history("b").await.len(), 1);
}

fn tool_round(call_id: &str) -> Vec<Message> {
    let call = ToolCall {
        id: call_id.to_string(),
        tool_type: "function".to_string(),
        function: FunctionCall {
            name: "weather".to_string(),
            arguments: "{}".to_string(),
        },
    };
    vec![
        Message::assistant(None, Some(vec![call])),
        Message {
            role: "tool".to_string(),
            content: Some("{\"result\":{}}".to_string()),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        },
        Message::assistant(Some("done".to_string()), None),
    ]
}

#[test]
fn trim_never_orphans_a_tool_message() {
    let mut messages = vec![Message::system("persona"), Message::user("weather?")];
    messages.extend(tool_round("call_1"));

    // A window of one pair would open on the tool message; the whole
    // partial round is dropped instead.
    trim_history(&mut messages, 1);

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, "system");
}

#[test]
fn trim_keeps_a_tool_round_that_fits_the_window() {
    let mut messages = vec![
        Message::system("persona"),
        Message::user("hi"),
        Message::assistant(Some("hello".to_string()), None),
        Message::user("weather?"),
    ];
    messages.extend(tool_round("call_1"));

    trim_history(&mut messages, 2);

    // system + the full four-message tool round, starting at its user turn
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[1].role, "user");
    assert_eq!(messages[1].content.as_deref(), Some("weather?"));
    assert_eq!(messages[3].role, "tool");
    assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
}

#[test]
fn trim_keeps_system_and_last_pairs() {
    let mut messages = vec![Message::system("persona")];
    for i in 0..5 {
        messages.push(Message::user(format!("u{}", i)));
        messages.push(Message::assistant(Some(format!("a{}", i)), None));
    }

    trim_history(&mut messages, 2);

    assert_eq!(messages.len(), 5);
    assert_eq!(messages[0].role, "system");
    assert_eq!(messages[1].content.as_deref(), Some("u3"));
    assert_eq!(messages[4].content.as_deref(), Some("a4"));
}
