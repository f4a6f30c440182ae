fn main() {
    // sqlx::migrate!() embeds ./migrations (used by #[sqlx::test]); rebuild when they change
    println!("cargo:rerun-if-changed=migrations");
}
