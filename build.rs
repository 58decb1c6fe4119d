use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo::rustc-check-cfg=cfg(oidn)");
    println!("cargo:rerun-if-env-changed=OIDN_DIR");
    if env::var("DOCS_RS").is_ok() {
        return;
    }

    if let Ok(dir) = env::var("OIDN_DIR") {
        let mut lib_path = PathBuf::from(dir);
        lib_path.push("lib");
        println!("cargo:rustc-link-search=native={}", lib_path.display());
    } else if let Err(e) = pkg_config::Config::new().probe("OpenImageDenoise") {
        println!(
            "cargo:warning=Could not find OpenImageDenoise via pkg-config: {}",
            e
        );
        println!("cargo:warning=Building without the OIDN backend; set OIDN_DIR to enable it");
        return;
    }
    println!("cargo:rustc-link-lib=OpenImageDenoise");
    println!("cargo:rustc-cfg=oidn");
}
