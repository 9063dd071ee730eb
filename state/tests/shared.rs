//! The process-wide manager can be installed exactly once.

#![cfg(target_os = "linux")]

use geokit_state::{
    GeolocationState, ListeningState, ManagerConfig, PlatformReader, StateError, StateManager,
    install_shared, shared, shared_or_init,
};

fn idle_manager() -> StateManager<PlatformReader> {
    StateManager::new(
        PlatformReader::new(),
        ManagerConfig::new().listen_on_start(false),
    )
}

#[test]
fn shared_manager_is_installed_once() {
    assert!(shared().is_none());

    let installed = install_shared(idle_manager()).unwrap();
    assert_eq!(installed.listening_state(), ListeningState::Uninitialized);
    assert_eq!(installed.current_state(), GeolocationState::default());

    assert_eq!(
        install_shared(idle_manager()).unwrap_err(),
        StateError::AlreadyInstalled
    );

    // Every access point hands out the same instance.
    let id = shared().unwrap().add_listener(|_| {});
    assert_eq!(installed.listener_count(), 1);
    assert!(shared_or_init().unwrap().remove_listener(id));
    assert_eq!(installed.listener_count(), 0);
}
