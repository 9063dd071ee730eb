//! Android geolocation state through JNI.
//!
//! Authorization and provider flags are read with plain JNI calls against the
//! application `Context`. Change events come from a `BroadcastReceiver`
//! compiled into an embedded DEX and loaded through a `DexClassLoader`.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::future::{Future, ready};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use jni::objects::{GlobalRef, JClass, JObject, JValue};
use jni::sys::jlong;
use jni::{JNIEnv, JavaVM, NativeMethod};
use log::{debug, error, warn};

use crate::{
    GeolocationState, PlatformStateReader, ProviderStatus, StateDelegate, StateError, StateResult,
};

/// Embedded DEX bytecode containing `ProviderChangeReceiver`.
/// Generated at build time by kotlinc + D8.
static DEX_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/classes.dex"));

static CLASS_LOADER: OnceLock<GlobalRef> = OnceLock::new();
static RECEIVER_CLASS: OnceLock<GlobalRef> = OnceLock::new();

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static REGISTRATIONS: OnceLock<Mutex<HashMap<u64, Registration>>> = OnceLock::new();

const RECEIVER_CLASS_NAME: &str = "geokit.state.ProviderChangeReceiver";
const GPS_PROVIDER: &str = "gps";
const NETWORK_PROVIDER: &str = "network";

#[derive(Clone)]
struct Registration {
    context: GlobalRef,
    delegate: Arc<dyn StateDelegate>,
}

fn registrations() -> MutexGuard<'static, HashMap<u64, Registration>> {
    REGISTRATIONS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

#[allow(clippy::needless_pass_by_value)]
fn fetch_error(err: jni::errors::Error) -> StateError {
    StateError::Fetch(err.to_string())
}

#[allow(clippy::needless_pass_by_value)]
fn subscription_error(err: jni::errors::Error) -> StateError {
    StateError::Subscription(err.to_string())
}

/// Reads geolocation state from an Android `Context`.
pub struct AndroidStateReader {
    vm: JavaVM,
    context: GlobalRef,
    handle: u64,
    receiver: Mutex<Option<GlobalRef>>,
}

impl fmt::Debug for AndroidStateReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndroidStateReader")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl AndroidStateReader {
    /// Create a reader bound to the application `context`.
    ///
    /// # Errors
    /// Returns [`StateError::Fetch`] if the JVM or a global reference cannot
    /// be obtained.
    pub fn new(env: &JNIEnv<'_>, context: &JObject<'_>) -> StateResult<Self> {
        let vm = env.get_java_vm().map_err(fetch_error)?;
        let context = env.new_global_ref(context).map_err(fetch_error)?;
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);

        Ok(Self {
            vm,
            context,
            handle,
            receiver: Mutex::new(None),
        })
    }

    /// Native handle passed to the broadcast receiver.
    #[must_use]
    pub const fn handle(&self) -> u64 {
        self.handle
    }

    fn read_current(&self) -> StateResult<GeolocationState> {
        let mut env = self.vm.attach_current_thread().map_err(fetch_error)?;
        read_state(&mut env, self.context.as_obj())
    }

    fn register_receiver(&self) -> StateResult<GlobalRef> {
        let mut env = self.vm.attach_current_thread().map_err(subscription_error)?;
        let context = self.context.as_obj();
        let class = receiver_class(&mut env, context)?;

        #[allow(clippy::cast_possible_wrap)]
        let handle = self.handle as jlong;
        let receiver = env
            .call_static_method(
                <&JClass>::from(class.as_obj()),
                "register",
                "(Landroid/content/Context;J)Lgeokit/state/ProviderChangeReceiver;",
                &[JValue::Object(context), JValue::Long(handle)],
            )
            .and_then(|value| value.l())
            .map_err(subscription_error)?;

        env.new_global_ref(receiver).map_err(subscription_error)
    }

    fn unregister_receiver(&self, receiver: &GlobalRef) -> StateResult<()> {
        let mut env = self.vm.attach_current_thread().map_err(subscription_error)?;
        let class = RECEIVER_CLASS
            .get()
            .ok_or_else(|| StateError::Subscription("receiver class not loaded".into()))?;

        env.call_static_method(
            <&JClass>::from(class.as_obj()),
            "unregister",
            "(Landroid/content/Context;Lgeokit/state/ProviderChangeReceiver;)V",
            &[
                JValue::Object(self.context.as_obj()),
                JValue::Object(receiver.as_obj()),
            ],
        )
        .map_err(subscription_error)?;
        Ok(())
    }
}

impl PlatformStateReader for AndroidStateReader {
    fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send {
        ready(self.read_current())
    }

    fn subscribe(&self, delegate: Arc<dyn StateDelegate>) -> StateResult<()> {
        let mut receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        registrations().insert(
            self.handle,
            Registration {
                context: self.context.clone(),
                delegate,
            },
        );

        if receiver.is_some() {
            return Ok(());
        }

        match self.register_receiver() {
            Ok(registered) => {
                *receiver = Some(registered);
                debug!("registered provider change receiver for handle {}", self.handle);
                Ok(())
            }
            Err(err) => {
                registrations().remove(&self.handle);
                Err(err)
            }
        }
    }

    fn unsubscribe(&self) -> StateResult<()> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StateError::NotListening)?;
        registrations().remove(&self.handle);
        self.unregister_receiver(&receiver)
    }
}

impl Drop for AndroidStateReader {
    fn drop(&mut self) {
        registrations().remove(&self.handle);
        let receiver = self
            .receiver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(receiver) = receiver {
            if let Err(err) = self.unregister_receiver(&receiver) {
                warn!("failed to unregister provider change receiver: {err}");
            }
        }
    }
}

fn read_state(env: &mut JNIEnv<'_>, context: &JObject<'_>) -> StateResult<GeolocationState> {
    let authorization = geokit_permission::sys::android::check_with_context(env, context)?;

    let service = env.new_string("location").map_err(fetch_error)?;
    let manager = env
        .call_method(
            context,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::Object(&service)],
        )
        .and_then(|value| value.l())
        .map_err(fetch_error)?;
    if manager.is_null() {
        return Err(StateError::Fetch("location service unavailable".into()));
    }

    let gps = provider_enabled(env, &manager, GPS_PROVIDER)?;
    let network = provider_enabled(env, &manager, NETWORK_PROVIDER)?;

    Ok(GeolocationState::new(
        authorization,
        ProviderStatus::from_enabled(gps),
        Some(ProviderStatus::from_enabled(network)),
    ))
}

fn provider_enabled(env: &mut JNIEnv<'_>, manager: &JObject<'_>, provider: &str) -> StateResult<bool> {
    let provider = env.new_string(provider).map_err(fetch_error)?;
    env.call_method(
        manager,
        "isProviderEnabled",
        "(Ljava/lang/String;)Z",
        &[JValue::Object(&provider)],
    )
    .and_then(|value| value.z())
    .map_err(fetch_error)
}

fn class_loader(env: &mut JNIEnv<'_>, context: &JObject<'_>) -> StateResult<&'static GlobalRef> {
    if let Some(loader) = CLASS_LOADER.get() {
        return Ok(loader);
    }

    let cache_dir = env
        .call_method(context, "getCacheDir", "()Ljava/io/File;", &[])
        .and_then(|value| value.l())
        .map_err(subscription_error)?;
    let cache_path = env
        .call_method(&cache_dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
        .and_then(|value| value.l())
        .map_err(subscription_error)?;
    let cache_path_str: String = env
        .get_string((&cache_path).into())
        .map_err(subscription_error)?
        .into();

    let dex_path = format!("{cache_path_str}/geokit_state.dex");
    // Newer runtimes refuse writable dex files, so the copy is made read-only.
    let _ = std::fs::remove_file(&dex_path);
    std::fs::write(&dex_path, DEX_BYTES)
        .map_err(|err| StateError::Subscription(format!("write DEX failed: {err}")))?;
    let mut permissions = std::fs::metadata(&dex_path)
        .map_err(|err| StateError::Subscription(format!("stat DEX failed: {err}")))?
        .permissions();
    permissions.set_readonly(true);
    std::fs::set_permissions(&dex_path, permissions)
        .map_err(|err| StateError::Subscription(format!("chmod DEX failed: {err}")))?;

    let dex_path = env.new_string(&dex_path).map_err(subscription_error)?;
    let parent_loader = env
        .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|value| value.l())
        .map_err(subscription_error)?;

    let loader = env
        .new_object(
            "dalvik/system/DexClassLoader",
            "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/ClassLoader;)V",
            &[
                JValue::Object(&dex_path),
                JValue::Object(&cache_path),
                JValue::Object(&JObject::null()),
                JValue::Object(&parent_loader),
            ],
        )
        .map_err(subscription_error)?;
    let loader = env.new_global_ref(loader).map_err(subscription_error)?;

    Ok(CLASS_LOADER.get_or_init(|| loader))
}

fn receiver_class(env: &mut JNIEnv<'_>, context: &JObject<'_>) -> StateResult<&'static GlobalRef> {
    if let Some(class) = RECEIVER_CLASS.get() {
        return Ok(class);
    }

    let loader = class_loader(env, context)?;
    let name = env
        .new_string(RECEIVER_CLASS_NAME)
        .map_err(subscription_error)?;
    let class = env
        .call_method(
            loader.as_obj(),
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&name)],
        )
        .and_then(|value| value.l())
        .map_err(subscription_error)?;
    let class = JClass::from(class);

    // Symbols are not resolved through a DexClassLoader, so natives are bound explicitly.
    env.register_native_methods(
        &class,
        &[NativeMethod {
            name: "nativeOnProvidersChanged".into(),
            sig: "(J)V".into(),
            fn_ptr: native_on_providers_changed as *mut c_void,
        }],
    )
    .map_err(subscription_error)?;

    let class = env.new_global_ref(class).map_err(subscription_error)?;
    Ok(RECEIVER_CLASS.get_or_init(|| class))
}

extern "system" fn native_on_providers_changed(
    mut env: JNIEnv<'_>,
    _receiver: JObject<'_>,
    handle: jlong,
) {
    #[allow(clippy::cast_sign_loss)]
    let handle = handle as u64;
    let Some(registration) = registrations().get(&handle).cloned() else {
        error!("received provider change for unknown handle {handle}");
        return;
    };

    match read_state(&mut env, registration.context.as_obj()) {
        Ok(state) => registration.delegate.on_state(state),
        Err(err) => error!("failed to read geolocation state after provider change: {err}"),
    }
}
