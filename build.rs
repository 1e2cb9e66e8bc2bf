use std::env;

fn main() {
    // name of the invocation shim looked up on PATH when PAM_HBAC_TEST_CLIENT is unset
    println!("cargo:rustc-env=PAM_HBAC_DEFAULT_TEST_CLIENT=pam_test_client");
    println!("cargo:rerun-if-changed=build.rs");

    if env::var_os("CARGO_FEATURE_LIBPAM").is_some() {
        println!("cargo:rustc-link-lib=pam");
    }
}
