use std::env;

fn main() {
    let target = env::var("TARGET").unwrap_or_default();

    println!("cargo:rustc-check-cfg=cfg(armv7m)");
    // FAULTMASK and CPSID F exist from ARMv7-M on.
    if target.starts_with("thumbv7m")
        || target.starts_with("thumbv7em")
        || target.starts_with("thumbv8m.main")
    {
        println!("cargo:rustc-cfg=armv7m");
    }
}
