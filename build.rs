use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Export the build timestamp so the firmware can seed a halted RTC on
    // first boot.  `CalendarTime::from_unix` converts this back to a
    // calendar date at runtime.
    let build_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=BUILD_EPOCH_SECS={build_epoch}");

    // Propagates the cached ESP-IDF environment when building for the
    // device target; emits nothing on plain host builds.
    embuild::espidf::sysenv::output();
}
