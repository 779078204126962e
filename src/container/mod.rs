// src/container/mod.rs

//! Everything that shapes the container run.
//!
//! - [`tool`] picks docker or podman.
//! - [`image`] resolves the image reference and pulls it when missing.
//! - [`identity`] queries uid/gid/groups on the container host.
//! - [`mock`] discovers the mock cloud API hostnames.
//! - [`script`] builds the shell line run inside the container.
//! - [`invocation`] assembles the final `run` command.

pub mod identity;
pub mod image;
pub mod invocation;
pub mod mock;
pub mod script;
pub mod tool;

pub use identity::{UserIdentity, query_identity};
pub use image::{ensure_image, image_ref};
pub use invocation::{ContainerInvocation, InvocationParts, Mount, MountMode};
pub use mock::{DRY_RUN_MOCK_HOSTS, DRY_RUN_MOCK_IP, MockHosts, discover_mock_hosts};
pub use script::{PreparationScript, compose_command, terminal_fragment, user_command};
pub use tool::{ContainerTool, RuntimeKind};
