//! Async runtime bridge for native and WASM platforms.
//!
//! Provides a `TaskSpawner` `SystemParam` for running the scene load off the
//! main thread:
//! - Native: Uses `bevy_tokio_tasks` for a Tokio runtime (reqwest requires it)
//! - WASM: Uses Bevy's `AsyncComputeTaskPool` (reqwest uses browser fetch)

use bevy::prelude::*;

/// Plugin that sets up the async runtime for the current platform.
///
/// On native, this adds the Tokio runtime plugin. On WASM, this is a no-op
/// since Bevy's task pool handles async execution.
pub struct AsyncRuntimePlugin;

impl Plugin for AsyncRuntimePlugin {
    fn build(&self, app: &mut App) {
        #[cfg(target_family = "wasm")]
        let _ = app;

        #[cfg(not(target_family = "wasm"))]
        app.add_plugins(bevy_tokio_tasks::TokioTasksPlugin::default());
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use std::future::Future;

    use bevy::{ecs::system::SystemParam, prelude::*};

    /// Spawns detached background tasks on the Tokio runtime.
    #[derive(SystemParam)]
    pub struct TaskSpawner<'w, 's> {
        runtime: Res<'w, bevy_tokio_tasks::TokioTasksRuntime>,
        // Matches the WASM signature.
        #[allow(dead_code)]
        _local: Local<'s, ()>,
    }

    impl TaskSpawner<'_, '_> {
        /// Spawn a task that reports back through channels.
        pub fn spawn<F>(&self, future: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            self.runtime.spawn_background_task(move |_ctx| future);
        }
    }
}

#[cfg(target_family = "wasm")]
mod wasm {
    use std::future::Future;

    use bevy::{ecs::system::SystemParam, prelude::*, tasks::AsyncComputeTaskPool};

    /// Spawns detached tasks on the browser's single thread.
    #[derive(SystemParam)]
    pub struct TaskSpawner<'w, 's> {
        #[allow(dead_code)]
        _local: Local<'s, ()>,
        #[allow(dead_code)]
        _marker: std::marker::PhantomData<&'w ()>,
    }

    impl TaskSpawner<'_, '_> {
        /// Spawn a task that reports back through channels.
        ///
        /// No `Send` bound: browser fetch futures are not `Send`.
        pub fn spawn<F>(&self, future: F)
        where
            F: Future<Output = ()> + 'static,
        {
            AsyncComputeTaskPool::get().spawn_local(future).detach();
        }
    }
}

#[cfg(not(target_family = "wasm"))]
pub use native::TaskSpawner;
#[cfg(target_family = "wasm")]
pub use wasm::TaskSpawner;
