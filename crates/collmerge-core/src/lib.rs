#![doc = r#"
⚠️ INTERNAL CRATE – NOT A STABLE API

This crate is an internal implementation detail of collmerge.

Do NOT depend on this crate directly.
Use `collmerge-io` instead.
"#]

pub mod model;
pub mod vars;
pub mod path;
pub mod identity;
