//! Kernel specifications and interpreter records.
//!
//! A kernel spec describes how to invoke a kernel: the argv template, the
//! environment overrides, and descriptive metadata. Specs are usually
//! loaded from Jupyter-style `kernel.json` files but can also be built in
//! code. The interpreter record identifies which language runtime performs
//! the invocation.
//!
//! Both types are inputs to the launch core and are never mutated by it.

mod interpreter;
mod spec;

pub use interpreter::Interpreter;
pub use spec::{InterruptMode, KernelSpec, KernelSpecError};
