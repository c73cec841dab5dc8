fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // The ESP-IDF environment only exists for device builds; host test
    // builds skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
