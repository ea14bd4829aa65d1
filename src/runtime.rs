use std::future::Future;

pub use async_trait::async_trait;
pub use tokio::time::Duration;
use tokio::runtime::Handle;

///Owns the async runtime. Messaging and the view-model schedule deferred work on it,
///native callbacks reach it through a cloned [`Handle`].
pub struct Runtime {
    runtime: tokio::runtime::Runtime,
}

impl Runtime {
    pub fn start() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_time().build()?;
        Ok(Runtime{runtime})
    }

    pub fn handle(&self) -> Handle {self.runtime.handle().clone()}

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn close(self) {
        self.runtime.shutdown_background();
    }
}
