//! Build script for linkdrop-storage.
//!
//! Migrations are embedded with `sqlx::migrate!`, so the crate must rebuild
//! when they change.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
