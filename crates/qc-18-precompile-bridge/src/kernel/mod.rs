//! # Execution Kernel
//!
//! - `env.rs` - shared call-chain resources and the handler view
//! - `method.rs` - selector-addressed method table
//! - `gas.rs` - key-value gas schedule
//! - `guard.rs` - frame commit/rollback and the panic barrier
//! - `runner.rs` - the per-call lifecycle
//! - `registry.rs` - address-keyed precompile set

pub mod env;
pub mod gas;
pub mod guard;
pub mod method;
pub mod registry;
pub mod runner;

pub use env::{ExecutionEnv, HandlerContext};
pub use method::{MethodDescriptor, MethodRegistry};
pub use registry::PrecompileSet;
pub use runner::PrecompileKernel;
