// Android push messaging over JNI.

//System:

//<Calls>>>: static methods on the app's org.maverick.push.MessagingBridge class, loaded through
//      the application class loader so it resolves from any attached thread.

//<Results>>>: asynchronous bridge calls carry a request id; the bridge answers through
//      nativeOnResult and the waiting future is woken through a oneshot channel.

//<Listeners>>>: messages, tokens and notification actions arrive through the nativeOn* exports
//      and are forwarded to whatever listener the adapter installed last.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use jni::objects::{GlobalRef, JClass, JObject, JString, JValue, JValueOwned};
use jni::sys::{jboolean, jint, jlong, JNI_VERSION_1_6};
use jni::{JNIEnv, JavaVM};
use tokio::sync::oneshot;

use super::{
    ActionListener, ActionTaken, IosPushSettings, LaunchIntent, MessagingError, NativeListener,
    NativeMessaging, Notification, Payload, TaskFailure, Value,
};

const BRIDGE_CLASS: &str = "org.maverick.push.MessagingBridge";
const MESSAGING_CLASS: &str = "com.google.firebase.messaging.FirebaseMessaging";
const NOTIFICATION_MANAGER_CLASS: &str = "androidx.core.app.NotificationManagerCompat";

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();
static APP_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();

static NEXT_REQUEST: AtomicI64 = AtomicI64::new(1);
static PENDING: Mutex<BTreeMap<i64, oneshot::Sender<BridgeResult>>> = Mutex::new(BTreeMap::new());
static LISTENERS: Mutex<Listeners> = Mutex::new(Listeners{message: None, token: None, action: None});

struct Listeners {
    message: Option<NativeListener>,
    token: Option<NativeListener>,
    action: Option<ActionListener>,
}

#[derive(Debug)]
struct BridgeResult {
    success: bool,
    value: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OsMessaging;

impl OsMessaging {
    pub fn new() -> Self {
        OsMessaging
    }

    pub fn init_java_vm(vm: JavaVM) {
        JAVA_VM.set(vm).ok();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn java_vm() -> Result<&'static JavaVM, MessagingError> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let context = std::panic::catch_unwind(ndk_context::android_context)
        .map_err(|_| MessagingError::Native("JavaVM not initialized".to_string()))?;
    let vm = unsafe { JavaVM::from_raw(context.vm().cast()) }?;
    Ok(JAVA_VM.get_or_init(|| vm))
}

fn application_context(env: &mut JNIEnv<'_>) -> jni::errors::Result<&'static GlobalRef> {
    if let Some(context) = APP_CONTEXT.get() {
        return Ok(context);
    }
    let activity_thread = env.call_static_method(
        "android/app/ActivityThread",
        "currentActivityThread",
        "()Landroid/app/ActivityThread;",
        &[]
    )?.l()?;
    let application = env.call_method(
        &activity_thread,
        "getApplication",
        "()Landroid/app/Application;",
        &[]
    )?.l()?;
    let global = env.new_global_ref(application)?;
    Ok(APP_CONTEXT.get_or_init(|| global))
}

/// Runs `f` on an attached thread. A pending Java exception is cleared and
/// returned as its `toString()`.
fn with_env<T>(f: impl FnOnce(&mut JNIEnv<'_>, &GlobalRef) -> jni::errors::Result<T>) -> Result<T, MessagingError> {
    let vm = java_vm()?;
    let mut env = vm.attach_current_thread()?;
    let result = application_context(&mut env).and_then(|context| f(&mut *env, context));
    match result {
        Ok(value) => Ok(value),
        Err(jni::errors::Error::JavaException) => Err(MessagingError::Native(take_exception(&mut env))),
        Err(e) => Err(e.into()),
    }
}

fn take_exception(env: &mut JNIEnv<'_>) -> String {
    let unknown = || "unknown Java exception".to_string();
    let Ok(throwable) = env.exception_occurred() else {return unknown()};
    if env.exception_clear().is_err() {
        return unknown();
    }
    env.call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l())
        .and_then(|obj| env.get_string(&JString::from(obj)).map(String::from))
        .unwrap_or_else(|_| unknown())
}

fn load_class<'local>(env: &mut JNIEnv<'local>, context: &GlobalRef, name: &str) -> jni::errors::Result<JClass<'local>> {
    let loader = env.call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])?.l()?;
    let name = env.new_string(name)?;
    let class = env.call_method(
        &loader,
        "loadClass",
        "(Ljava/lang/String;)Ljava/lang/Class;",
        &[JValue::Object(&name)]
    )?.l()?;
    Ok(JClass::from(class))
}

fn call_bridge<'local>(
    env: &mut JNIEnv<'local>, context: &GlobalRef, method: &str, sig: &str, args: &[JValue]
) -> jni::errors::Result<JValueOwned<'local>> {
    let bridge = load_class(env, context, BRIDGE_CLASS)?;
    env.call_static_method(&bridge, method, sig, args)
}

fn optional_string(env: &mut JNIEnv<'_>, value: &JString<'_>) -> Option<String> {
    if value.is_null() {
        return None;
    }
    env.get_string(value).ok().map(String::from)
}

fn open_request() -> (i64, oneshot::Receiver<BridgeResult>) {
    let id = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
    let (sender, receiver) = oneshot::channel();
    lock(&PENDING).insert(id, sender);
    (id, receiver)
}

fn cancel_request(id: i64) {
    lock(&PENDING).remove(&id);
}

async fn bridge_request(
    method: &str, sig: &str, argument: &str
) -> Result<BridgeResult, MessagingError> {
    let (id, receiver) = open_request();
    let sent = with_env(|env, context| {
        let argument = env.new_string(argument)?;
        call_bridge(env, context, method, sig, &[JValue::Object(&argument), JValue::Long(id)]).map(|_| ())
    });
    if let Err(e) = sent {
        cancel_request(id);
        return Err(e);
    }
    receiver.await.map_err(|_| MessagingError::Native(format!("{method} was dropped by the bridge")))
}

async fn topic_task(method: &str, topic: &str) -> Result<(), TaskFailure> {
    match bridge_request(method, "(Ljava/lang/String;J)V", topic).await {
        Ok(BridgeResult{success: true, ..}) => Ok(()),
        Ok(BridgeResult{value, reason, ..}) => Err(TaskFailure{reason, raw: value.unwrap_or_default()}),
        Err(e) => Err(TaskFailure{reason: None, raw: e.to_string()}),
    }
}

fn set_bridge_listener(method: &str, enabled: bool) -> Result<(), MessagingError> {
    with_env(|env, context| {
        call_bridge(env, context, method, "(Z)V", &[JValue::Bool(enabled.into())]).map(|_| ())
    })
}

#[async_trait]
impl NativeMessaging for OsMessaging {
    fn is_provisioned(&self) -> bool {
        with_env(|env, context| load_class(env, context, MESSAGING_CLASS).map(|_| ())).is_ok()
    }

    fn sender_id(&self, resource: &str) -> Option<String> {
        with_env(|env, context| {
            let resources = env.call_method(context, "getResources", "()Landroid/content/res/Resources;", &[])?.l()?;
            let package = env.call_method(context, "getPackageName", "()Ljava/lang/String;", &[])?.l()?;
            let name = env.new_string(resource)?;
            let kind = env.new_string("string")?;
            let id = env.call_method(
                &resources,
                "getIdentifier",
                "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)I",
                &[JValue::Object(&name), JValue::Object(&kind), JValue::Object(&package)]
            )?.i()?;
            if id == 0 {
                return Ok(None);
            }
            let value = env.call_method(context, "getString", "(I)Ljava/lang/String;", &[JValue::Int(id)])?.l()?;
            Ok(optional_string(env, &JString::from(value)))
        }).unwrap_or_else(|e| {
            log::error!("Failed to look up resource '{resource}': {e}");
            None
        })
    }

    fn register_lifecycle_callbacks(&self) -> Result<(), MessagingError> {
        with_env(|env, context| {
            call_bridge(env, context, "registerLifecycleCallbacks", "(Landroid/app/Application;)V", &[JValue::Object(context.as_obj())]).map(|_| ())
        })
    }

    async fn current_push_token(&self, sender_id: &str) -> Result<Option<String>, MessagingError> {
        let result = bridge_request("getCurrentPushToken", "(Ljava/lang/String;J)V", sender_id).await?;
        match result.success {
            true => Ok(result.value.filter(|token| !token.is_empty())),
            false => Err(MessagingError::Rejected(result.reason.or(result.value).unwrap_or_default())),
        }
    }

    fn set_message_listener(&self, listener: NativeListener) -> Result<(), MessagingError> {
        lock(&LISTENERS).message = Some(listener);
        set_bridge_listener("setMessageListenerEnabled", true)
    }

    fn set_token_listener(&self, listener: NativeListener) -> Result<(), MessagingError> {
        lock(&LISTENERS).token = Some(listener);
        set_bridge_listener("setTokenListenerEnabled", true)
    }

    fn clear_listeners(&self) {
        *lock(&LISTENERS) = Listeners{message: None, token: None, action: None};
        for method in ["setMessageListenerEnabled", "setTokenListenerEnabled"] {
            if let Err(e) = set_bridge_listener(method, false) {
                log::warn!("Failed to disable bridge listener {method}: {e}");
            }
        }
    }

    fn register(&self, sender_id: &str) -> Result<(), MessagingError> {
        with_env(|env, context| {
            let sender_id = env.new_string(sender_id)?;
            call_bridge(env, context, "registerForPushNotifications", "(Ljava/lang/String;)V", &[JValue::Object(&sender_id)]).map(|_| ())
        })
    }

    fn unregister(&self, sender_id: Option<&str>) -> Result<(), MessagingError> {
        with_env(|env, context| {
            let sender_id = match sender_id {
                Some(id) => JObject::from(env.new_string(id)?),
                None => JObject::null(),
            };
            call_bridge(env, context, "unregisterForPushNotifications", "(Ljava/lang/String;)V", &[JValue::Object(&sender_id)]).map(|_| ())
        })
    }

    async fn subscribe_to_topic(&self, topic: &str) -> Result<(), TaskFailure> {
        topic_task("subscribeToTopic", topic).await
    }

    async fn unsubscribe_from_topic(&self, topic: &str) -> Result<(), TaskFailure> {
        topic_task("unsubscribeFromTopic", topic).await
    }

    fn sdk_version(&self) -> u32 {
        with_env(|env, _| env.get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?.i())
            .map(|version| version.max(0) as u32)
            .unwrap_or_else(|e| {
                log::error!("Failed to read SDK_INT: {e}");
                0
            })
    }

    fn notifications_enabled(&self) -> Result<bool, MessagingError> {
        with_env(|env, context| {
            let class = load_class(env, context, NOTIFICATION_MANAGER_CLASS)?;
            let manager = env.call_static_method(
                &class,
                "from",
                "(Landroid/content/Context;)Landroidx/core/app/NotificationManagerCompat;",
                &[JValue::Object(context.as_obj())]
            )?.l()?;
            env.call_method(&manager, "areNotificationsEnabled", "()Z", &[])?.z()
        })
    }

    fn register_interactive_push(&self, settings: &IosPushSettings, listener: Option<ActionListener>) -> Result<(), MessagingError> {
        if let Some(interactive) = &settings.interactive_settings {
            log::warn!(
                "Interactive notification categories are iOS-only, ignoring {} actions and {} categories",
                interactive.actions.len(), interactive.categories.len()
            );
        }
        lock(&LISTENERS).action = listener;
        Ok(())
    }
}

/// Reads the action and primitive extras of an `android.content.Intent`.
pub fn read_launch_intent(env: &mut JNIEnv<'_>, intent: &JObject<'_>) -> Result<LaunchIntent, MessagingError> {
    let action = env.call_method(intent, "getAction", "()Ljava/lang/String;", &[])?.l()?;
    let action = optional_string(env, &JString::from(action));
    let extras = env.call_method(intent, "getExtras", "()Landroid/os/Bundle;", &[])?.l()?;
    if extras.is_null() {
        return Ok(LaunchIntent{action, extras: None});
    }

    let keys = env.call_method(&extras, "keySet", "()Ljava/util/Set;", &[])?.l()?;
    let iterator = env.call_method(&keys, "iterator", "()Ljava/util/Iterator;", &[])?.l()?;
    let mut payload = Payload::new();
    while env.call_method(&iterator, "hasNext", "()Z", &[])?.z()? {
        let key = JString::from(env.call_method(&iterator, "next", "()Ljava/lang/Object;", &[])?.l()?);
        let name: String = env.get_string(&key)?.into();
        let value = env.call_method(&extras, "get", "(Ljava/lang/String;)Ljava/lang/Object;", &[JValue::Object(&key)])?.l()?;
        if let Some(value) = extra_value(env, &value)? {
            payload.insert(name, value);
        }
        env.delete_local_ref(value)?;
        env.delete_local_ref(key)?;
    }
    Ok(LaunchIntent{action, extras: Some(payload)})
}

fn extra_value(env: &mut JNIEnv<'_>, value: &JObject<'_>) -> jni::errors::Result<Option<Value>> {
    if value.is_null() {
        return Ok(None);
    }
    if env.is_instance_of(value, "java/lang/Boolean")? {
        return Ok(Some(Value::Bool(env.call_method(value, "booleanValue", "()Z", &[])?.z()?)));
    }
    if env.is_instance_of(value, "java/lang/Integer")? || env.is_instance_of(value, "java/lang/Long")? {
        let number = env.call_method(value, "longValue", "()J", &[])?.j()?;
        return Ok(Some(Value::Number(number.into())));
    }
    if env.is_instance_of(value, "java/lang/Number")? {
        let number = env.call_method(value, "doubleValue", "()D", &[])?.d()?;
        return Ok(serde_json::Number::from_f64(number).map(Value::Number));
    }
    let text = env.call_method(value, "toString", "()Ljava/lang/String;", &[])?.l()?;
    Ok(optional_string(env, &JString::from(text)).map(Value::Text))
}

#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _: *mut std::ffi::c_void) -> jint {
    OsMessaging::init_java_vm(vm);
    JNI_VERSION_1_6
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_maverick_push_MessagingBridge_nativeOnResult(
    mut env: JNIEnv,
    _class: JClass,
    request: jlong,
    success: jboolean,
    value: JString,
    reason: JString,
) {
    let result = BridgeResult{
        success: success != 0,
        value: optional_string(&mut env, &value),
        reason: optional_string(&mut env, &reason),
    };
    match lock(&PENDING).remove(&request) {
        Some(sender) => {let _ = sender.send(result);},
        None => log::warn!("Bridge answered unknown request {request}"),
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_maverick_push_MessagingBridge_nativeOnMessage(
    mut env: JNIEnv,
    _class: JClass,
    json: JString,
) {
    let Some(json) = optional_string(&mut env, &json) else {return};
    let listener = lock(&LISTENERS).message.clone();
    match listener {
        Some(listener) => listener(Ok(json)),
        None => log::debug!("Push message arrived without a listener"),
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_maverick_push_MessagingBridge_nativeOnToken(
    mut env: JNIEnv,
    _class: JClass,
    token: JString,
) {
    let Some(token) = optional_string(&mut env, &token) else {return};
    let listener = lock(&LISTENERS).token.clone();
    if let Some(listener) = listener {
        listener(Ok(token));
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_maverick_push_MessagingBridge_nativeOnTokenError(
    mut env: JNIEnv,
    _class: JClass,
    error: JString,
) {
    let error = optional_string(&mut env, &error).unwrap_or_default();
    let listener = lock(&LISTENERS).token.clone();
    if let Some(listener) = listener {
        listener(Err(error));
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_org_maverick_push_MessagingBridge_nativeOnActionTaken(
    mut env: JNIEnv,
    _class: JClass,
    action: JString,
    message: JString,
    input_text: JString,
) {
    let Some(action_identifier) = optional_string(&mut env, &action) else {return};
    let message = optional_string(&mut env, &message)
        .map(|json| Notification::from_json(&json))
        .transpose()
        .unwrap_or_else(|e| {
            log::error!("Failed to parse actioned message: {e}");
            None
        })
        .unwrap_or_default();
    let input_text = optional_string(&mut env, &input_text);
    let listener = lock(&LISTENERS).action.clone();
    if let Some(listener) = listener {
        listener(ActionTaken{action_identifier, message, input_text});
    }
}
