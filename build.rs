fn main() {
    println!("cargo:rerun-if-env-changed=TDSPROBE_CONFIG");
    println!("cargo:rerun-if-env-changed=TDSPROBE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=TDSPROBE_WIFI_PASS");
    println!("cargo:rerun-if-env-changed=TDSPROBE_DEST");

    // ESP-IDF environment is only needed when building the firmware image.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
