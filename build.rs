fn main() {
    // ESP-IDF build environment propagation (linker args, sdkconfig).
    // Host builds (tests) skip this entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
