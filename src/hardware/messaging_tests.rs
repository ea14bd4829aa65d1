use super::*;

use std::sync::Mutex as StdMutex;
use std::time::Duration;

fn messaging(fake: &FakeNativeMessaging) -> Messaging {
    messaging_with(fake, MessagingConfig::default())
}

fn messaging_with(fake: &FakeNativeMessaging, config: MessagingConfig) -> Messaging {
    Messaging::init(Arc::new(fake.clone()), config, Handle::current())
}

type Received = Arc<StdMutex<Vec<Notification>>>;

fn recorder() -> (Received, impl Fn(Notification) + Send + Sync + 'static) {
    let received: Received = Arc::new(StdMutex::new(Vec::new()));
    let sink = received.clone();
    (received, move |notification| sink.lock().unwrap().push(notification))
}

fn extras(pairs: &[(&str, Value)]) -> Payload {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn tapped_intent() -> LaunchIntent {
    LaunchIntent::new(Some("android.intent.action.MAIN"), Some(extras(&[
        ("from", "1234567".into()),
        ("collapse_key", "org.maverick.demo".into()),
        ("title", "Hello".into()),
        ("count", 3i64.into()),
    ])))
}

#[tokio::test]
async fn launch_intents_without_from_leave_state_untouched() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);

    let intents = [
        LaunchIntent::new(Some("android.intent.action.MAIN"), None),
        LaunchIntent::new(Some("android.intent.action.MAIN"), Some(extras(&[("title", "Hello".into())]))),
        LaunchIntent::new(None, Some(Payload::new())),
        LaunchIntent::new(Some(VIEW_ACTION), Some(extras(&[("from", "1234567".into())]))),
    ];
    for intent in &intents {
        messaging.handle_app_launch(intent);
        assert!(!messaging.has_launch_notification(), "captured {intent:?}");
        assert!(!messaging.has_message_callback());
    }
}

#[tokio::test]
async fn launch_notification_is_held_until_a_callback_registers() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);

    messaging.handle_app_launch(&tapped_intent());

    let pending = messaging.launch_notification().unwrap();
    assert!(!pending.foreground);
    assert_eq!(pending.fields.keys().collect::<Vec<_>>(), ["count", "title"]);
    assert_eq!(pending.data, pending.fields);
    assert_eq!(pending.title(), Some("Hello"));

    let (received, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();
    assert_eq!(*received.lock().unwrap(), vec![pending]);
    assert!(!messaging.has_launch_notification());

    let (again, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();
    assert!(again.lock().unwrap().is_empty());
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn launch_notification_goes_to_a_registered_callback_on_the_next_turn() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    let (received, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    messaging.handle_app_launch(&tapped_intent());
    assert!(received.lock().unwrap().is_empty());
    assert!(!messaging.has_launch_notification());

    tokio::time::sleep(Duration::from_millis(1)).await;
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].title(), Some("Hello"));
    assert!(!messaging.has_launch_notification());
}

#[tokio::test(start_paused = true)]
async fn launch_delivery_waits_for_the_configured_delay() {
    let fake = FakeNativeMessaging::new();
    let config = MessagingConfig{launch_delivery_delay_ms: 250, ..Default::default()};
    let messaging = messaging_with(&fake, config);
    let (received, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    messaging.handle_app_launch(&tapped_intent());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(received.lock().unwrap().is_empty());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn delayed_launch_delivery_goes_to_the_latest_callback() {
    let fake = FakeNativeMessaging::new();
    let config = MessagingConfig{launch_delivery_delay_ms: 250, ..Default::default()};
    let messaging = messaging_with(&fake, config);
    let (first, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    messaging.handle_app_launch(&tapped_intent());
    let (second, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(first.lock().unwrap().is_empty());
    let second = second.lock().unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].title(), Some("Hello"));
}

#[tokio::test(start_paused = true)]
async fn delayed_launch_delivery_is_dropped_after_teardown() {
    let fake = FakeNativeMessaging::new();
    let config = MessagingConfig{launch_delivery_delay_ms: 250, ..Default::default()};
    let messaging = messaging_with(&fake, config);
    let (received, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    messaging.handle_app_launch(&tapped_intent());
    messaging.teardown();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(received.lock().unwrap().is_empty());
    assert!(!messaging.has_launch_notification());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_launch_and_registration_deliver_exactly_once() {
    for round in 0..100 {
        let fake = FakeNativeMessaging::new();
        let messaging = messaging(&fake);
        let (received, callback) = recorder();
        let handle = Handle::current();
        let barrier = std::sync::Barrier::new(2);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                messaging.handle_app_launch(&tapped_intent());
            });
            scope.spawn(|| {
                barrier.wait();
                handle.block_on(messaging.register_message_received_callback(callback)).unwrap();
            });
        });

        for _ in 0..200 {
            if !received.lock().unwrap().is_empty() {break}
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(received.lock().unwrap().len(), 1, "round {round}");
        assert!(!messaging.has_launch_notification(), "round {round}");
    }
}

#[tokio::test]
async fn launch_without_sender_id_is_not_captured() {
    let fake = FakeNativeMessaging::new();
    fake.set_sender_id(None);
    let messaging = messaging(&fake);

    messaging.handle_app_launch(&tapped_intent());

    assert!(!messaging.has_launch_notification());
    assert_eq!(fake.calls(), vec![NativeCall::RegisterLifecycleCallbacks]);
}

#[tokio::test]
async fn subscribe_then_unsubscribe_resolve_in_order() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);

    messaging.subscribe_to_topic("demo").await.unwrap();
    messaging.unsubscribe_from_topic("demo").await.unwrap();

    assert_eq!(fake.calls(), vec![
        NativeCall::Subscribe("demo".to_string()),
        NativeCall::Unsubscribe("demo".to_string()),
    ]);
}

#[tokio::test]
async fn topic_failures_pass_the_reason_or_the_raw_error() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    fake.push_topic_result(Err(TaskFailure{reason: Some("TOPIC_INVALID".to_string()), raw: "java.lang.IllegalArgumentException".to_string()}));
    fake.push_topic_result(Err(TaskFailure{reason: None, raw: "java.io.IOException: SERVICE_NOT_AVAILABLE".to_string()}));

    assert_eq!(
        messaging.subscribe_to_topic("bad topic").await,
        Err(MessagingError::Rejected("TOPIC_INVALID".to_string()))
    );
    assert_eq!(
        messaging.unsubscribe_from_topic("demo").await,
        Err(MessagingError::Rejected("java.io.IOException: SERVICE_NOT_AVAILABLE".to_string()))
    );
}

#[tokio::test]
async fn operations_without_the_messaging_module_reject_with_the_sentinel() {
    let fake = FakeNativeMessaging::unprovisioned();
    let messaging = messaging(&fake);

    assert_eq!(messaging.current_push_token().await, Err(MessagingError::NotProvisioned));
    assert_eq!(messaging.register_for_push_notifications().await, Err(MessagingError::NotProvisioned));
    assert_eq!(messaging.unregister_for_push_notifications().await, Err(MessagingError::NotProvisioned));
    assert_eq!(messaging.subscribe_to_topic("demo").await, Err(MessagingError::NotProvisioned));
    assert_eq!(messaging.unsubscribe_from_topic("demo").await, Err(MessagingError::NotProvisioned));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn token_without_sender_id_rejects_with_the_sentinel() {
    let fake = FakeNativeMessaging::new();
    fake.set_sender_id(None);
    let messaging = messaging(&fake);

    assert_eq!(messaging.current_push_token().await, Err(MessagingError::NotProvisioned));
    assert!(messaging.unregister_for_push_notifications().await.is_ok());
    assert_eq!(fake.calls(), vec![NativeCall::Unregister(None)]);
}

#[cfg(not(target_os = "android"))]
#[tokio::test]
async fn platform_without_binding_rejects_with_the_sentinel() {
    let messaging = Messaging::init(Arc::new(OsMessaging::new()), MessagingConfig::default(), Handle::current());
    let error = messaging.current_push_token().await.unwrap_err();
    assert_eq!(error, MessagingError::NotProvisioned);
    assert!(error.to_string().starts_with("Messaging is not provisioned"));
}

#[tokio::test]
async fn current_push_token_passes_the_native_answer_through() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);

    assert_eq!(messaging.current_push_token().await, Ok(None));

    fake.set_token(Ok(Some("device-token".to_string())));
    assert_eq!(messaging.current_push_token().await, Ok(Some("device-token".to_string())));

    fake.set_token(Err(MessagingError::Rejected("SERVICE_NOT_AVAILABLE".to_string())));
    assert_eq!(messaging.current_push_token().await, Err(MessagingError::Rejected("SERVICE_NOT_AVAILABLE".to_string())));

    assert_eq!(fake.calls()[0], NativeCall::CurrentPushToken("123456789".to_string()));
}

#[tokio::test]
async fn notifications_enabled_defaults_to_true_below_the_query_level() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    fake.set_notifications_enabled(Ok(false));

    for sdk in [0, 16, 23] {
        fake.set_sdk_version(sdk);
        assert!(messaging.are_notifications_enabled());
    }

    fake.set_sdk_version(24);
    assert!(!messaging.are_notifications_enabled());

    fake.set_notifications_enabled(Err(MessagingError::Native("java.lang.NoClassDefFoundError".to_string())));
    assert!(messaging.are_notifications_enabled());
}

#[tokio::test]
async fn register_and_unregister_pass_the_sender_id() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);

    messaging.register_for_push_notifications().await.unwrap();
    messaging.unregister_for_push_notifications().await.unwrap();

    assert_eq!(fake.calls(), vec![
        NativeCall::Register("123456789".to_string()),
        NativeCall::Unregister(Some("123456789".to_string())),
    ]);
}

#[tokio::test]
async fn received_messages_are_parsed_before_delivery() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    let (received, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    assert!(fake.deliver_message(r#"{"title":"Hi","foreground":true,"data":{"k":"v"},"notification":{"x":1}}"#));
    assert!(fake.deliver_message("not json"));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].title(), Some("Hi"));
    assert!(received[0].foreground);
    assert_eq!(received[0].data.get("k"), Some(&Value::from("v")));
    assert!(!received[0].fields.contains_key("notification"));
}

#[tokio::test]
async fn last_message_callback_registration_wins() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    let (first, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();
    let (second, callback) = recorder();
    messaging.register_message_received_callback(callback).await.unwrap();

    fake.deliver_message(r#"{"title":"Hi"}"#);

    assert!(first.lock().unwrap().is_empty());
    assert_eq!(second.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn tokens_issued_before_registration_are_lost() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    assert!(!fake.issue_token("early"));

    let tokens = Arc::new(StdMutex::new(Vec::new()));
    let sink = tokens.clone();
    messaging.register_push_token_received_callback(move |token| sink.lock().unwrap().push(token)).await.unwrap();

    assert!(fake.issue_token("fresh"));
    assert!(fake.fail_token("MISSING_INSTANCEID_SERVICE"));
    assert_eq!(*tokens.lock().unwrap(), vec!["fresh".to_string()]);
}

#[tokio::test]
async fn failed_listener_installation_is_reported() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    fake.fail_listener_install(MessagingError::Native("java.lang.ClassNotFoundException".to_string()));

    let (_, callback) = recorder();
    let result = messaging.register_message_received_callback(callback).await;

    assert_eq!(result, Err(MessagingError::Native("java.lang.ClassNotFoundException".to_string())));
    assert!(!fake.has_message_listener());
}

#[tokio::test]
async fn register_callbacks_installs_both_listeners() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    let (received, callback) = recorder();

    messaging.register_callbacks(CallbackOptions{
        on_message_received: Some(Arc::new(callback)),
        on_push_token_received: Some(Arc::new(|_token: String| {})),
    }).await.unwrap();

    assert_eq!(fake.calls(), vec![NativeCall::SetMessageListener, NativeCall::SetTokenListener]);
    fake.deliver_message(r#"{"title":"Hi"}"#);
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn teardown_resets_every_slot() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    messaging.handle_app_launch(&tapped_intent());
    messaging.register_push_token_received_callback(|_| {}).await.unwrap();
    assert!(messaging.has_launch_notification());

    messaging.teardown();

    assert!(!messaging.has_launch_notification());
    assert!(!messaging.has_message_callback());
    assert!(fake.calls().contains(&NativeCall::ClearListeners));
    assert!(!fake.issue_token("after teardown"));
    assert_eq!(messaging.current_push_token().await, Err(MessagingError::NotProvisioned));
}

#[tokio::test]
async fn interactive_push_forwards_actions_to_the_model_callback() {
    let fake = FakeNativeMessaging::new();
    let messaging = messaging(&fake);
    let taken = Arc::new(StdMutex::new(Vec::new()));
    let sink = taken.clone();

    messaging.register_for_interactive_push(PushNotificationModel{
        ios_settings: IosPushSettings{
            alert: true,
            interactive_settings: Some(InteractiveSettings{
                actions: vec![NotificationAction::button("OPEN_ACTION", "Open", ActionOptions::FOREGROUND)],
                categories: vec![NotificationCategory{identifier: "GENERAL".to_string()}],
            }),
            ..Default::default()
        },
        on_notification_action_taken: Some(Arc::new(move |action: ActionTaken| sink.lock().unwrap().push(action.action_identifier))),
    }).await.unwrap();

    assert_eq!(fake.calls(), vec![NativeCall::RegisterInteractivePush{actions: 1, categories: 1}]);
    assert!(fake.take_action(ActionTaken{
        action_identifier: "OPEN_ACTION".to_string(),
        message: Notification::default(),
        input_text: None,
    }));
    assert_eq!(*taken.lock().unwrap(), vec!["OPEN_ACTION".to_string()]);
}
