// Interface adapters: backend client, wire protocol, cache, canvas and clock.

pub mod cache;
pub mod canvas;
pub mod clients;
pub mod clock;
pub mod protocol;

pub use cache::{FileCacheStore, InMemoryCacheStore};
pub use canvas::HeadlessCanvas;
pub use clients::{BackendReachability, HttpBackend};
pub use clock::SystemClock;
