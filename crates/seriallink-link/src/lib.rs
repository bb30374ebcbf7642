//! Request/response multiplexing over a newline-delimited byte stream.
//!
//! A [`Link`] owns an outgoing queue, a correlation counter and a registry of
//! listeners. [`Link::serve`] binds it to a transport and runs one writer and
//! one reader task until shutdown; every other operation can be called from
//! any task while `serve` is running.
//!
//! ```no_run
//! use seriallink_link::Link;
//! use seriallink_transport::Endpoint;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let link = std::sync::Arc::new(Link::new());
//! let transport = "tcp://127.0.0.1:7000".parse::<Endpoint>()?.connect().await?;
//!
//! let serving = tokio::spawn({
//!     let link = link.clone();
//!     async move { link.serve(transport).await }
//! });
//!
//! let response = link.request("ping").await?;
//! println!("{}", response.command);
//!
//! link.shutdown();
//! serving.await??;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod link;
pub mod registry;
pub mod supervisor;

mod tasks;

pub use config::{LinkConfig, LISTENER_CHANNEL_SIZE, REQUEST_TIMEOUT, WRITER_CHANNEL_SIZE};
pub use error::{LinkError, Result};
pub use link::Link;
pub use registry::{ListenerId, ListenerRegistry};
pub use supervisor::TaskSupervisor;

pub use seriallink_frame::{Message, MessageKind};
