mod cpp;
mod java;
mod python;

pub use cpp::CppBackend;
pub use java::{entry_type, JavaBackend};
pub use python::PythonBackend;
