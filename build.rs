fn main() {
    println!("cargo:rerun-if-env-changed=EDGENODE_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=EDGENODE_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=EDGENODE_MQTT_BROKER");
    println!("cargo:rerun-if-env-changed=EDGENODE_MQTT_USERNAME");
    println!("cargo:rerun-if-env-changed=EDGENODE_MQTT_PASSWORD");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
