//! Android location authorization using JNI.

use crate::{AndroidGrants, LocationAuthorization, PermissionError};
use jni::JNIEnv;
use jni::objects::{JObject, JValue};
use jni::sys::jint;

/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: jint = 0;

const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
const ACCESS_BACKGROUND_LOCATION: &str = "android.permission.ACCESS_BACKGROUND_LOCATION";

fn is_granted(env: &mut JNIEnv, context: &JObject, permission: &str) -> Result<bool, PermissionError> {
    let name = env
        .new_string(permission)
        .map_err(|e| PermissionError::Platform(format!("new_string failed: {e}")))?;

    let result = env
        .call_method(
            context,
            "checkSelfPermission",
            "(Ljava/lang/String;)I",
            &[JValue::Object(&name)],
        )
        .map_err(|e| PermissionError::Platform(format!("checkSelfPermission: {e}")))?
        .i()
        .map_err(|e| PermissionError::Platform(format!("checkSelfPermission result: {e}")))?;

    Ok(result == PERMISSION_GRANTED)
}

/// Read the raw location permission grants using a `Context`.
///
/// # Errors
/// Returns a [`PermissionError::Platform`] if any JNI call fails.
pub fn grants_with_context(
    env: &mut JNIEnv,
    context: &JObject,
) -> Result<AndroidGrants, PermissionError> {
    Ok(AndroidGrants {
        fine: is_granted(env, context, ACCESS_FINE_LOCATION)?,
        coarse: is_granted(env, context, ACCESS_COARSE_LOCATION)?,
        background: is_granted(env, context, ACCESS_BACKGROUND_LOCATION)?,
    })
}

/// Check location authorization using a `Context`.
///
/// # Errors
/// Returns a [`PermissionError::Platform`] if any JNI call fails.
pub fn check_with_context(
    env: &mut JNIEnv,
    context: &JObject,
) -> Result<LocationAuthorization, PermissionError> {
    grants_with_context(env, context).map(LocationAuthorization::from_android)
}

// Async wrapper for the public API (requires runtime context)
pub(crate) async fn check() -> Result<LocationAuthorization, PermissionError> {
    // Without JNI context, we can't check permissions
    // The application must call check_with_context directly
    Err(PermissionError::ContextRequired(
        "Android: use check_with_context() with a Context".into(),
    ))
}
