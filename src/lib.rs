//! Workspace root. Real code lives in `crates/*`; this package exists to
//! anchor workspace-level tooling (git hooks via cargo-husky).
