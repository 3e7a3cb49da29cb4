use std::sync::Arc;

use serde_json::json;
use teleagent::prelude::*;
use teleagent_test_utils::{ScriptedChatProvider, final_answer_reply, tool_call_reply};

#[tokio::test]
async fn test_agent_from_prelude() {
    init_logging();

    let subscribers = serde_json::from_value(json!([
        {"tc_no": "22222222222", "name": "Can Öztürk", "esim_active": false}
    ]))
    .unwrap();
    let store = Arc::new(SubscriberStore::new(subscribers, vec![]));
    let registry = Arc::new(telecom_registry(Arc::clone(&store)).unwrap());
    let llm = Arc::new(ScriptedChatProvider::new([
        tool_call_reply("activateEsim", json!({"user_identifier": "22222222222"})),
        final_answer_reply("eSIM hizmetiniz aktif edildi."),
    ]));

    let agent: Arc<dyn ConversationAgent> = Arc::new(Dispatcher::new(registry, llm));
    let mut session = ConversationSession::new();
    let outcome = agent.respond(&mut session, "eSIM açar mısınız?").await.unwrap();

    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.reply, "eSIM hizmetiniz aktif edildi.");
    assert!(store.find("22222222222").unwrap().esim_active);
    assert_eq!(session.last().map(|t| t.role), Some(Role::Assistant));
}
